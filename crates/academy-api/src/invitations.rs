//! Handlers for `/invitations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/invitations` | Body: `{"email":"...","role_code":"instructor"}`; approved owners only |
//! | `POST` | `/invitations/accept` | Body: `{"token":"..."}` |
//! | `POST` | `/invitations/:token/cancel` | Tenant owner only |

use std::sync::Arc;

use academy_core::{
  invitation::Invitation,
  onboarding::{NewInvitation, Onboarding},
  profile::Profile,
  store::OnboardingStore,
};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;

use crate::{error::ApiError, identity::CurrentIdentity};

// ─── Issue ────────────────────────────────────────────────────────────────────

/// `POST /invitations`
pub async fn issue<S>(
  State(onboarding): State<Arc<Onboarding<S>>>,
  CurrentIdentity(identity): CurrentIdentity,
  Json(body): Json<NewInvitation>,
) -> Result<impl IntoResponse, ApiError>
where
  S: OnboardingStore,
{
  let invitation = onboarding.issue_invitation(&identity.id, body).await?;
  Ok((StatusCode::CREATED, Json(invitation)))
}

// ─── Accept ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AcceptBody {
  pub token: String,
}

/// `POST /invitations/accept`, body: `{"token":"..."}`
pub async fn accept<S>(
  State(onboarding): State<Arc<Onboarding<S>>>,
  CurrentIdentity(identity): CurrentIdentity,
  Json(body): Json<AcceptBody>,
) -> Result<Json<Profile>, ApiError>
where
  S: OnboardingStore,
{
  let profile = onboarding.accept_invitation(&body.token, &identity).await?;
  Ok(Json(profile))
}

// ─── Cancel ───────────────────────────────────────────────────────────────────

/// `POST /invitations/:token/cancel`
pub async fn cancel<S>(
  State(onboarding): State<Arc<Onboarding<S>>>,
  CurrentIdentity(identity): CurrentIdentity,
  Path(token): Path<String>,
) -> Result<Json<Invitation>, ApiError>
where
  S: OnboardingStore,
{
  let invitation = onboarding.cancel_invitation(&identity.id, &token).await?;
  Ok(Json(invitation))
}
