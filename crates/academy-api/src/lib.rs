//! JSON REST API for academy onboarding.
//!
//! Exposes an axum [`Router`] backed by any
//! [`academy_core::store::OnboardingStore`]. Authentication happens upstream;
//! the verified identity arrives in forwarded headers (see [`identity`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", academy_api::api_router(onboarding.clone()))
//! ```

pub mod error;
pub mod identity;
pub mod invitations;
pub mod onboarding;
pub mod profile;
pub mod stage;

use std::sync::Arc;

use academy_core::{onboarding::Onboarding, store::OnboardingStore};
use axum::{
  Router,
  routing::{get, post, put},
};

pub use error::ApiError;

/// Build the onboarding API router for `onboarding`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(onboarding: Arc<Onboarding<S>>) -> Router<()>
where
  S: OnboardingStore + 'static,
{
  Router::new()
    .route("/stage", get(stage::get_stage::<S>))
    .route("/profile", post(profile::create::<S>))
    // Invitations
    .route("/invitations", post(invitations::issue::<S>))
    .route("/invitations/accept", post(invitations::accept::<S>))
    .route("/invitations/{token}/cancel", post(invitations::cancel::<S>))
    // Owner onboarding
    .route("/onboarding/owner", post(onboarding::complete_owner::<S>))
    .route("/onboarding/academy", put(onboarding::complete_academy::<S>))
    .with_state(onboarding)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use academy_core::{
    identity::IdentityId,
    memory::MemoryStore,
    profile::ApprovalStatus,
  };
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use crate::identity::{EMAIL_HEADER, EMAIL_VERIFIED_HEADER, ID_HEADER};

  fn engine() -> Arc<Onboarding<MemoryStore>> { Arc::new(Onboarding::new(MemoryStore::new())) }

  async fn call(
    engine: &Arc<Onboarding<MemoryStore>>,
    method: &str,
    uri: &str,
    who: Option<(&str, &str)>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((id, email)) = who {
      builder = builder
        .header(ID_HEADER, id)
        .header(EMAIL_HEADER, email)
        .header(EMAIL_VERIFIED_HEADER, "true");
    }
    let req = match body {
      Some(v) => builder
        .header("content-type", "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = api_router(engine.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
  }

  #[tokio::test]
  async fn stage_without_identity_is_no_identity() {
    let (status, body) = call(&engine(), "GET", "/stage", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "NO_IDENTITY");
    assert_eq!(body["next_action"]["action"], "sign_in");
  }

  #[tokio::test]
  async fn unverified_header_resolves_email_unverified() {
    let req = Request::builder()
      .uri("/stage")
      .header(ID_HEADER, "u1")
      .header(EMAIL_HEADER, "jane@x.com")
      .header(EMAIL_VERIFIED_HEADER, "false")
      .body(Body::empty())
      .unwrap();
    let resp = api_router(engine()).oneshot(req).await.unwrap();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "EMAIL_UNVERIFIED");
  }

  #[tokio::test]
  async fn writes_require_an_identity() {
    let (status, body) = call(&engine(), "POST", "/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");
  }

  #[tokio::test]
  async fn owner_flow_over_http() {
    let engine = engine();
    let jane = Some(("u1", "jane@x.com"));

    let (status, body) = call(&engine, "POST", "/profile", jane, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "u1");

    let (_, body) = call(&engine, "GET", "/stage", jane, None).await;
    assert_eq!(body["next_action"]["action"], "complete_owner_onboarding");

    let (status, body) = call(
      &engine,
      "POST",
      "/onboarding/owner",
      jane,
      Some(json!({ "name": "Jane", "academy_name": "Jane's Academy" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["profile"]["role_code"], "owner");
    assert_eq!(body["profile"]["approval_status"], "pending");

    let (status, body) = call(
      &engine,
      "POST",
      "/onboarding/owner",
      jane,
      Some(json!({ "name": "Jane", "academy_name": "Again" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    engine
      .set_approval_status(
        &IdentityId::new("u1").unwrap(),
        ApprovalStatus::Approved,
        None,
        &IdentityId::new("admin").unwrap(),
      )
      .await
      .unwrap();

    let (status, body) = call(
      &engine,
      "PUT",
      "/onboarding/academy",
      jane,
      Some(json!({
        "timezone": "Asia/Seoul",
        "settings": {
          "business_hours": [{ "weekday": "Mon", "opens": "09:00:00", "closes": "18:00:00" }],
          "default_subjects": ["Math"]
        }
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["timezone"], "Asia/Seoul");

    let (_, body) = call(&engine, "GET", "/stage", jane, None).await;
    assert_eq!(body["code"], "READY");
  }

  #[tokio::test]
  async fn invitation_errors_are_distinguishable() {
    let engine = engine();
    let owner = Some(("owner-1", "owner@x.com"));
    let staff = Some(("u2", "staff@x.com"));

    call(
      &engine,
      "POST",
      "/onboarding/owner",
      owner,
      Some(json!({ "name": "Olga", "academy_name": "Olga's Academy" })),
    )
    .await;

    // A pending owner may not invite yet.
    let (status, _) = call(
      &engine,
      "POST",
      "/invitations",
      owner,
      Some(json!({ "email": "staff@x.com", "role_code": "instructor" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    engine
      .set_approval_status(
        &IdentityId::new("owner-1").unwrap(),
        ApprovalStatus::Approved,
        None,
        &IdentityId::new("admin").unwrap(),
      )
      .await
      .unwrap();

    let (status, invitation) = call(
      &engine,
      "POST",
      "/invitations",
      owner,
      Some(json!({ "email": "staff@x.com", "role_code": "instructor" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = invitation["token"].as_str().unwrap().to_owned();

    let (status, body) = call(
      &engine,
      "POST",
      "/invitations/accept",
      staff,
      Some(json!({ "token": "not-a-token" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    let (_, stage) = call(&engine, "POST", "/profile", staff, None).await;
    assert!(stage["tenant_id"].is_null());
    let (_, stage) = call(&engine, "GET", "/stage", staff, None).await;
    assert_eq!(stage["code"], "MEMBER_INVITED");
    assert_eq!(stage["next_action"]["token"], token.as_str());

    let (status, body) = call(
      &engine,
      "POST",
      "/invitations/accept",
      staff,
      Some(json!({ "token": token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role_code"], "instructor");

    let (status, body) = call(
      &engine,
      "POST",
      "/invitations/accept",
      staff,
      Some(json!({ "token": token })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "already_consumed");

    let (status, body) = call(
      &engine,
      "POST",
      &format!("/invitations/{token}/cancel"),
      owner,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "already_consumed");
  }
}
