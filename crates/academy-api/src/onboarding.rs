//! Handlers for `/onboarding` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/onboarding/owner` | Body: `{"name","academy_name","slug"?}`; 201 + profile and tenant |
//! | `PUT`  | `/onboarding/academy` | Body: `{"timezone","settings"}`; idempotent |

use std::sync::Arc;

use academy_core::{
  onboarding::{AcademySetup, Onboarding, OwnerOnboarding},
  store::OnboardingStore,
  tenant::Tenant,
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{error::ApiError, identity::CurrentIdentity};

/// `POST /onboarding/owner`
pub async fn complete_owner<S>(
  State(onboarding): State<Arc<Onboarding<S>>>,
  CurrentIdentity(identity): CurrentIdentity,
  Json(body): Json<OwnerOnboarding>,
) -> Result<impl IntoResponse, ApiError>
where
  S: OnboardingStore,
{
  let done = onboarding.complete_owner_onboarding(&identity, body).await?;
  Ok((StatusCode::CREATED, Json(done)))
}

/// `PUT /onboarding/academy`
pub async fn complete_academy<S>(
  State(onboarding): State<Arc<Onboarding<S>>>,
  CurrentIdentity(identity): CurrentIdentity,
  Json(body): Json<AcademySetup>,
) -> Result<Json<Tenant>, ApiError>
where
  S: OnboardingStore,
{
  let tenant = onboarding.complete_academy_setup(&identity.id, body).await?;
  Ok(Json(tenant))
}
