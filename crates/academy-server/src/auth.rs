//! HTTP Basic-auth extractor guarding the approver endpoints.

use academy_core::{identity::IdentityId, store::OnboardingStore};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use crate::{AppState, error::Error};

/// The single admin account allowed to decide owner approvals.
#[derive(Clone)]
pub struct AdminAuth {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// An authenticated approver. The id is recorded as `approved_by`.
pub struct Approver(pub IdentityId);

impl AdminAuth {
  /// Identity recorded for decisions made with this account.
  fn approver_id(&self) -> Result<IdentityId, Error> {
    IdentityId::new(format!("admin:{}", self.username)).map_err(|_| Error::Unauthorized)
  }

  /// Authenticate the `Authorization: Basic` credentials in `headers`.
  ///
  /// The password hash is verified whether or not the username matches, so
  /// an unknown username is not answered faster than a wrong password.
  pub fn authenticate(&self, headers: &HeaderMap) -> Result<Approver, Error> {
    let (username, password) = basic_credentials(headers).ok_or(Error::Unauthorized)?;
    let password_ok = self.password_matches(&password);
    if username != self.username || !password_ok {
      return Err(Error::Unauthorized);
    }
    self.approver_id().map(Approver)
  }

  fn password_matches(&self, password: &str) -> bool {
    let Ok(hash) = PasswordHash::new(&self.password_hash) else {
      return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &hash).is_ok()
  }
}

/// Decode `Authorization: Basic base64(user:pass)`.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let encoded = headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Basic ")?;
  let decoded = String::from_utf8(B64.decode(encoded).ok()?).ok()?;
  let (username, password) = decoded.split_once(':')?;
  Some((username.to_owned(), password.to_owned()))
}

impl<S> FromRequestParts<AppState<S>> for Approver
where
  S: OnboardingStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    state.auth.authenticate(&parts.headers)
  }
}
