//! The onboarding engine: stage resolution plus the idempotent transitions
//! between stages.
//!
//! [`Onboarding`] owns no state of its own. Every operation is one
//! [`OnboardingStore::transaction`]; preconditions are re-checked inside the
//! transaction so racing requests observe `Conflict` or `AlreadyConsumed`
//! instead of corrupting state.

mod approval;
mod bootstrap;
mod invitations;
mod owner;


pub use invitations::NewInvitation;
pub use owner::{AcademySetup, OwnerOnboarded, OwnerOnboarding};

use chrono::{Duration, Utc};
use tracing::debug;

use crate::{
  identity::{canonical_email, Identity},
  stage::{resolve, Stage, StageInputs},
  store::OnboardingStore,
  Error, Result,
};

/// Invitation lifetime used when none is configured.
pub const DEFAULT_INVITATION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct Onboarding<S> {
  store:          S,
  invitation_ttl: Duration,
}

impl<S: OnboardingStore> Onboarding<S> {
  pub fn new(store: S) -> Self {
    Self { store, invitation_ttl: Duration::days(DEFAULT_INVITATION_TTL_DAYS) }
  }

  pub fn with_invitation_ttl(mut self, ttl: Duration) -> Self {
    self.invitation_ttl = ttl;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  /// Resolve the current [`Stage`] for `identity`. Read-only.
  pub async fn get_stage(&self, identity: Option<&Identity>) -> Result<Stage> {
    let identity = match identity {
      Some(identity) if identity.email_confirmed => identity.clone(),
      // No store access is needed to decide these.
      other => return Ok(resolve(StageInputs { identity: other, ..Default::default() })),
    };

    let id = identity.id.clone();
    let now = Utc::now();
    let (profile, invitation, tenant) = self
      .store
      .read(move |tx| {
        let Some(profile) = tx.profile(&id)? else {
          return Ok((None, None, None));
        };
        match profile.tenant_id {
          Some(tenant_id) => {
            let tenant = tx.tenant(tenant_id)?;
            Ok((Some(profile), None, tenant))
          }
          None => {
            let invitation = tx.open_invitation_for_email(&profile.email, now)?;
            Ok((Some(profile), invitation, None))
          }
        }
      })
      .await?;

    let stage = resolve(StageInputs {
      identity:   Some(&identity),
      profile:    profile.as_ref(),
      invitation: invitation.as_ref(),
      tenant:     tenant.as_ref(),
    });
    debug!(identity = %identity.id, stage = %stage.code, "resolved stage");
    Ok(stage)
  }
}

/// Transitions that write require a confirmed email.
fn require_confirmed(identity: &Identity) -> Result<String> {
  if !identity.email_confirmed {
    return Err(Error::validation(format!(
      "email for identity {} is not confirmed",
      identity.id
    )));
  }
  Ok(canonical_email(&identity.email))
}
