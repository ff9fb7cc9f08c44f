//! Error taxonomy shared by every onboarding operation.

use strum::{AsRefStr, Display, IntoStaticStr};
use thiserror::Error;

use crate::invitation::InvitationStatus;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed input. Safe to retry once the input is corrected.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  #[error("invitation {0} has expired")]
  Expired(String),

  #[error("invitation {fingerprint} is no longer pending (status: {status})")]
  AlreadyConsumed {
    fingerprint: String,
    status:      InvitationStatus,
  },

  /// A precondition about existing state does not hold.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  /// The backing store is unreachable or aborted the transaction. Nothing
  /// was written.
  #[error("dependency failure: {0}")]
  DependencyFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Classification of an [`Error`], stable across message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
  Validation,
  NotFound,
  Expired,
  AlreadyConsumed,
  Conflict,
  Forbidden,
  DependencyFailure,
}

impl Error {
  pub fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }

  pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
    Self::NotFound { entity, id: id.to_string() }
  }

  pub fn conflict(msg: impl Into<String>) -> Self { Self::Conflict(msg.into()) }

  pub fn forbidden(msg: impl Into<String>) -> Self {
    Self::Forbidden(msg.into())
  }

  pub fn dependency(
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
  ) -> Self {
    Self::DependencyFailure(source.into())
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::NotFound { .. } => ErrorKind::NotFound,
      Self::Expired(_) => ErrorKind::Expired,
      Self::AlreadyConsumed { .. } => ErrorKind::AlreadyConsumed,
      Self::Conflict(_) => ErrorKind::Conflict,
      Self::Forbidden(_) => ErrorKind::Forbidden,
      Self::DependencyFailure(_) => ErrorKind::DependencyFailure,
    }
  }

  /// Only store failures may be retried without changing state or input.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::DependencyFailure(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
