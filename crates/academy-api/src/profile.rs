//! Handler for `POST /profile`: idempotent profile bootstrap.

use std::sync::Arc;

use academy_core::{onboarding::Onboarding, profile::Profile, store::OnboardingStore};
use axum::{Json, extract::State};

use crate::{error::ApiError, identity::CurrentIdentity};

/// `POST /profile`. Returns the existing profile unchanged on repeat calls.
pub async fn create<S>(
  State(onboarding): State<Arc<Onboarding<S>>>,
  CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<Profile>, ApiError>
where
  S: OnboardingStore,
{
  let profile = onboarding.ensure_profile(&identity).await?;
  Ok(Json(profile))
}
