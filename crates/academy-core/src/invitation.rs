//! Invitations: single-use, expiring tokens that scope an email to a tenant
//! and a staff role.

use std::fmt;

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  identity::IdentityId,
  profile::RoleCode,
  tenant::TenantId,
  Error, Result,
};

/// Number of random bytes behind a token; hex-encoded to twice this length.
pub const TOKEN_BYTES: usize = 32;
pub const TOKEN_LEN: usize = TOKEN_BYTES * 2;

// ─── Token ───────────────────────────────────────────────────────────────────

/// A validated invitation token: exactly [`TOKEN_LEN`] lower-case hex digits.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvitationToken(String);

impl InvitationToken {
  /// Draw a fresh token from the OS random number generator.
  pub fn generate() -> Self {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Self(hex::encode(bytes))
  }

  /// Normalise (trim, lower-case) and validate a caller-supplied token.
  pub fn parse(raw: &str) -> Result<Self> {
    let token = raw.trim().to_ascii_lowercase();
    if token.len() != TOKEN_LEN || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
      return Err(Error::validation(format!(
        "invitation token must be {TOKEN_LEN} hex characters"
      )));
    }
    Ok(Self(token))
  }

  pub fn as_str(&self) -> &str { &self.0 }

  /// Short SHA-256 prefix that identifies a token in logs and errors
  /// without revealing it.
  pub fn fingerprint(&self) -> String {
    let digest = Sha256::digest(self.0.as_bytes());
    hex::encode(&digest[..6])
  }
}

// Tokens are credentials; never print them.
impl fmt::Debug for InvitationToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "InvitationToken({})", self.fingerprint())
  }
}

impl TryFrom<String> for InvitationToken {
  type Error = Error;

  fn try_from(raw: String) -> Result<Self> { Self::parse(&raw) }
}

impl From<InvitationToken> for String {
  fn from(token: InvitationToken) -> Self { token.0 }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Stored lifecycle status. `Expired` may be materialised by external
/// cleanup, but expiry is always re-checked against `expires_at` on read.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InvitationStatus {
  Pending,
  Accepted,
  Cancelled,
  Expired,
}

// ─── Invitation ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
  pub token:      InvitationToken,
  pub tenant_id:  TenantId,
  pub invited_by: IdentityId,
  /// Normalised (lower-case) address.
  pub email:      String,
  pub role_code:  RoleCode,
  pub status:     InvitationStatus,
  pub expires_at: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
}

impl Invitation {
  pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
    now > self.expires_at
  }

  /// Pending and not yet past its expiry.
  pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
    self.status == InvitationStatus::Pending && !self.is_expired_at(now)
  }
}
