//! HTTP server for academy onboarding.
//!
//! Mounts the onboarding API under `/api` and the approver endpoints under
//! `/admin`, backed by any [`OnboardingStore`].

pub mod admin;
pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use academy_core::{
  onboarding::{DEFAULT_INVITATION_TTL_DAYS, Onboarding},
  store::OnboardingStore,
};
use axum::{Router, routing::get};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AdminAuth;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ACADEMY_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  pub admin_username:      String,
  pub admin_password_hash: String,
  #[serde(default = "default_invitation_ttl_days")]
  pub invitation_ttl_days: i64,
}

fn default_invitation_ttl_days() -> i64 { DEFAULT_INVITATION_TTL_DAYS }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the admin handlers.
pub struct AppState<S> {
  pub onboarding: Arc<Onboarding<S>>,
  pub auth:       Arc<AdminAuth>,
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      onboarding: self.onboarding.clone(),
      auth:       self.auth.clone(),
    }
  }
}

impl<S: OnboardingStore> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let onboarding = Onboarding::new(store)
      .with_invitation_ttl(chrono::Duration::days(config.invitation_ttl_days));
    let auth = AdminAuth {
      username:      config.admin_username,
      password_hash: config.admin_password_hash,
    };
    Self {
      onboarding: Arc::new(onboarding),
      auth:       Arc::new(auth),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full axum [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: OnboardingStore + 'static,
{
  let admin = Router::new()
    .route(
      "/profiles/{id}/approval",
      get(admin::get_approval::<S>).put(admin::set_approval::<S>),
    )
    .with_state(state.clone());

  Router::new()
    .nest("/api", academy_api::api_router(state.onboarding.clone()))
    .nest("/admin", admin)
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
