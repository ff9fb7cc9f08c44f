//! Handler for `GET /stage`, called on every protected page load.

use std::sync::Arc;

use academy_core::{onboarding::Onboarding, stage::Stage, store::OnboardingStore};
use axum::{Json, extract::State};

use crate::{error::ApiError, identity::MaybeIdentity};

/// `GET /stage`. Anonymous requests resolve to `NO_IDENTITY`.
pub async fn get_stage<S>(
  State(onboarding): State<Arc<Onboarding<S>>>,
  MaybeIdentity(identity): MaybeIdentity,
) -> Result<Json<Stage>, ApiError>
where
  S: OnboardingStore,
{
  let stage = onboarding.get_stage(identity.as_ref()).await?;
  Ok(Json(stage))
}
