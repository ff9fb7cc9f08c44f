//! Identity Source over trusted forwarded headers.
//!
//! The authentication proxy in front of this service verifies the session
//! and forwards the principal as headers. Requests that reach the service
//! without them are anonymous.

use academy_core::identity::{Identity, IdentityId, IdentitySource};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};

use crate::error::ApiError;

pub const ID_HEADER: &str = "x-identity-id";
pub const EMAIL_HEADER: &str = "x-identity-email";
pub const EMAIL_VERIFIED_HEADER: &str = "x-identity-email-verified";

/// Reads the forwarded identity headers of one request.
pub struct ForwardedIdentity<'a> {
  headers: &'a HeaderMap,
}

impl<'a> ForwardedIdentity<'a> {
  pub fn new(headers: &'a HeaderMap) -> Self { Self { headers } }

  fn header(&self, name: &str) -> Option<&'a str> {
    self
      .headers
      .get(name)
      .and_then(|v| v.to_str().ok())
      .map(str::trim)
      .filter(|v| !v.is_empty())
  }
}

impl IdentitySource for ForwardedIdentity<'_> {
  fn current_identity(&self) -> Option<Identity> {
    let id = IdentityId::new(self.header(ID_HEADER)?).ok()?;
    let email = self.header(EMAIL_HEADER)?.to_owned();
    let email_confirmed = self
      .header(EMAIL_VERIFIED_HEADER)
      .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1");
    Some(Identity { id, email, email_confirmed })
  }
}

/// The request's identity, if any. Never rejects.
pub struct MaybeIdentity(pub Option<Identity>);

/// The request's identity; rejects anonymous requests with 401.
pub struct CurrentIdentity(pub Identity);

impl<St: Send + Sync> FromRequestParts<St> for MaybeIdentity {
  type Rejection = std::convert::Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    Ok(MaybeIdentity(ForwardedIdentity::new(&parts.headers).current_identity()))
  }
}

impl<St: Send + Sync> FromRequestParts<St> for CurrentIdentity {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    ForwardedIdentity::new(&parts.headers)
      .current_identity()
      .map(CurrentIdentity)
      .ok_or(ApiError::Unauthenticated)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::HeaderValue;

  fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (k, v) in pairs {
      map.insert(*k, HeaderValue::from_static(v));
    }
    map
  }

  #[test]
  fn complete_headers_yield_an_identity() {
    let map = headers(&[
      (ID_HEADER, "u1"),
      (EMAIL_HEADER, "jane@x.com"),
      (EMAIL_VERIFIED_HEADER, "TRUE"),
    ]);
    let identity = ForwardedIdentity::new(&map).current_identity().unwrap();
    assert_eq!(identity.id.as_str(), "u1");
    assert!(identity.email_confirmed);
  }

  #[test]
  fn missing_verification_means_unconfirmed() {
    let map = headers(&[(ID_HEADER, "u1"), (EMAIL_HEADER, "jane@x.com")]);
    let identity = ForwardedIdentity::new(&map).current_identity().unwrap();
    assert!(!identity.email_confirmed);
  }

  #[test]
  fn missing_id_or_email_is_anonymous() {
    let map = headers(&[(EMAIL_HEADER, "jane@x.com")]);
    assert!(ForwardedIdentity::new(&map).current_identity().is_none());
    let map = headers(&[(ID_HEADER, "u1"), (EMAIL_HEADER, "  ")]);
    assert!(ForwardedIdentity::new(&map).current_identity().is_none());
  }
}
