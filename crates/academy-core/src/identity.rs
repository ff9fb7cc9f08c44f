//! The externally authenticated principal.
//!
//! Identities are owned by the authentication provider. This crate only reads
//! them; a [`Profile`](crate::profile::Profile) is keyed by the same id.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Opaque, stable identifier issued by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
  pub fn new(raw: impl Into<String>) -> Result<Self> {
    let raw = raw.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Err(Error::validation("identity id must not be empty"));
    }
    Ok(Self(trimmed.to_owned()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for IdentityId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub id:              IdentityId,
  pub email:           String,
  pub email_confirmed: bool,
}

/// Supplies the principal attached to the current request, if any.
pub trait IdentitySource {
  fn current_identity(&self) -> Option<Identity>;
}

/// Trim and lower-case an email address. Used as-is for addresses the
/// identity provider has already confirmed.
pub fn canonical_email(raw: &str) -> String { raw.trim().to_lowercase() }

/// [`canonical_email`], additionally rejecting anything without a local part
/// and a dotted domain.
pub fn normalize_email(raw: &str) -> Result<String> {
  let email = canonical_email(raw);
  let valid = match email.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
    }
    None => false,
  };
  if !valid {
    return Err(Error::validation(format!("invalid email address: {raw:?}")));
  }
  Ok(email)
}
