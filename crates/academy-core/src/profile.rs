//! Profile: the tenant-scoped user record managed by the onboarding engine.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{identity::IdentityId, tenant::TenantId};

/// A member's role within a tenant.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr,
  Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoleCode {
  Owner,
  Instructor,
  Assistant,
}

impl RoleCode {
  fn rank(self) -> u8 {
    match self {
      Self::Owner => 2,
      Self::Instructor => 1,
      Self::Assistant => 0,
    }
  }

  /// `true` if `self` sits strictly above `other` in the hierarchy.
  pub fn outranks(self, other: Self) -> bool { self > other }
}

// owner > instructor > assistant
impl PartialOrd for RoleCode {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.rank().cmp(&other.rank()))
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr,
  Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApprovalStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

impl ApprovalStatus {
  pub fn is_decided(self) -> bool { !matches!(self, Self::Pending) }
}

/// One row per identity. `role_code` carries no meaning while `tenant_id`
/// is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
  pub id:               IdentityId,
  pub tenant_id:        Option<TenantId>,
  pub role_code:        Option<RoleCode>,
  pub approval_status:  ApprovalStatus,
  pub name:             Option<String>,
  pub email:            String,
  pub approved_by:      Option<IdentityId>,
  pub approved_at:      Option<DateTime<Utc>>,
  pub rejection_reason: Option<String>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl Profile {
  /// The minimal row written on first sign-in: no tenant, no role, pending.
  pub fn bootstrap(id: IdentityId, email: String, now: DateTime<Utc>) -> Self {
    Self {
      id,
      tenant_id: None,
      role_code: None,
      approval_status: ApprovalStatus::Pending,
      name: None,
      email,
      approved_by: None,
      approved_at: None,
      rejection_reason: None,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn is_owner(&self) -> bool {
    self.tenant_id.is_some() && self.role_code == Some(RoleCode::Owner)
  }
}
