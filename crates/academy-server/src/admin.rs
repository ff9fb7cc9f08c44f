//! Approver endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/profiles/:id/approval` | Current approval status |
//! | `PUT`  | `/admin/profiles/:id/approval` | Body: `{"status":"approved"}` or `{"status":"rejected","reason":"..."}` |

use academy_core::{
  identity::IdentityId,
  profile::{ApprovalStatus, Profile},
  store::OnboardingStore,
};
use axum::{
  Json,
  extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::Approver, error::Error};

#[derive(Debug, Serialize)]
pub struct ApprovalView {
  pub profile_id:      IdentityId,
  pub approval_status: ApprovalStatus,
}

/// `GET /admin/profiles/:id/approval`
pub async fn get_approval<S>(
  State(state): State<AppState<S>>,
  _approver: Approver,
  Path(id): Path<String>,
) -> Result<Json<ApprovalView>, Error>
where
  S: OnboardingStore + 'static,
{
  let profile_id = IdentityId::new(id)?;
  let approval_status = state.onboarding.approval_status(&profile_id).await?;
  Ok(Json(ApprovalView { profile_id, approval_status }))
}

#[derive(Debug, Deserialize)]
pub struct ApprovalBody {
  pub status: ApprovalStatus,
  #[serde(default)]
  pub reason: Option<String>,
}

/// `PUT /admin/profiles/:id/approval`
pub async fn set_approval<S>(
  State(state): State<AppState<S>>,
  Approver(approver): Approver,
  Path(id): Path<String>,
  Json(body): Json<ApprovalBody>,
) -> Result<Json<Profile>, Error>
where
  S: OnboardingStore + 'static,
{
  let profile_id = IdentityId::new(id)?;
  let profile = state
    .onboarding
    .set_approval_status(&profile_id, body.status, body.reason, &approver)
    .await?;
  Ok(Json(profile))
}
