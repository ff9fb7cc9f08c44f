//! Approval gate for owner profiles: `pending -> {approved, rejected}`, both
//! terminal.

use chrono::Utc;
use tracing::{info, warn};

use super::Onboarding;
use crate::{
  identity::IdentityId,
  profile::{ApprovalStatus, Profile},
  store::OnboardingStore,
  Error, ErrorKind, Result,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ApprovalDecision {
  Approved,
  Rejected { reason: String },
}

impl ApprovalDecision {
  /// Build a decision from a requested status and an optional reason.
  /// Rejections require a non-empty reason; `pending` is not a decision.
  pub(crate) fn from_parts(status: ApprovalStatus, reason: Option<String>) -> Result<Self> {
    match status {
      ApprovalStatus::Approved => Ok(Self::Approved),
      ApprovalStatus::Rejected => {
        let reason = reason.map(|r| r.trim().to_owned()).unwrap_or_default();
        if reason.is_empty() {
          return Err(Error::validation("a rejection requires a reason"));
        }
        Ok(Self::Rejected { reason })
      }
      ApprovalStatus::Pending => {
        Err(Error::validation("approval status can only be set to approved or rejected"))
      }
    }
  }

  pub(crate) fn status(&self) -> ApprovalStatus {
    match self {
      Self::Approved => ApprovalStatus::Approved,
      Self::Rejected { .. } => ApprovalStatus::Rejected,
    }
  }
}

impl<S: OnboardingStore> Onboarding<S> {
  pub async fn approval_status(&self, profile_id: &IdentityId) -> Result<ApprovalStatus> {
    let profile_id = profile_id.clone();
    self
      .store
      .read(move |tx| {
        tx.profile(&profile_id)?
          .map(|p| p.approval_status)
          .ok_or_else(|| Error::not_found("profile", &profile_id))
      })
      .await
  }

  /// Decide a pending owner. Authorisation of `approver_id` happens upstream;
  /// here it is only recorded and barred from deciding its own profile.
  ///
  /// The stored state is checked before the requested status, so once a
  /// profile is decided every further call fails with `Conflict`.
  pub async fn set_approval_status(
    &self,
    profile_id: &IdentityId,
    status: ApprovalStatus,
    reason: Option<String>,
    approver_id: &IdentityId,
  ) -> Result<Profile> {
    if profile_id == approver_id {
      return Err(Error::forbidden("approvers cannot decide their own profile"));
    }

    let profile_id = profile_id.clone();
    let approver_id = approver_id.clone();
    let now = Utc::now();

    let result = self
      .store
      .transaction(move |tx| {
        let mut profile = tx
          .profile(&profile_id)?
          .ok_or_else(|| Error::not_found("profile", &profile_id))?;

        if !profile.is_owner() {
          return Err(Error::conflict(format!(
            "profile {profile_id} is not an owner awaiting approval"
          )));
        }
        if profile.approval_status.is_decided() {
          return Err(Error::conflict(format!(
            "profile {profile_id} is already {}",
            profile.approval_status
          )));
        }

        let decision = ApprovalDecision::from_parts(status, reason)?;
        profile.approval_status = decision.status();
        match decision {
          ApprovalDecision::Approved => {
            profile.approved_by = Some(approver_id);
            profile.approved_at = Some(now);
          }
          ApprovalDecision::Rejected { reason } => {
            profile.rejection_reason = Some(reason);
          }
        }
        profile.updated_at = now;
        tx.update_profile(&profile)?;
        Ok(profile)
      })
      .await;

    match &result {
      Ok(profile) => info!(
        identity = %profile.id,
        status = %profile.approval_status,
        "approval decided"
      ),
      Err(e) if e.kind() == ErrorKind::Conflict => warn!(error = %e, "approval refused"),
      Err(_) => {}
    }
    result
  }
}
