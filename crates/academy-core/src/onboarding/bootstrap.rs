//! Profile bootstrap: create-if-absent for a confirmed identity.

use chrono::{DateTime, Utc};
use tracing::info;

use super::{require_confirmed, Onboarding};
use crate::{
  identity::Identity,
  profile::Profile,
  store::{OnboardingStore, Transaction},
  Error, Result,
};

impl<S: OnboardingStore> Onboarding<S> {
  /// Ensure a Profile exists for `identity`, returning it. Calling this any
  /// number of times, concurrently or not, yields a single row.
  pub async fn ensure_profile(&self, identity: &Identity) -> Result<Profile> {
    let email = require_confirmed(identity)?;
    let identity = identity.clone();
    let now = Utc::now();

    let (profile, created) = self
      .store
      .transaction(move |tx| load_or_create(tx, &identity, email, now))
      .await?;

    if created {
      info!(identity = %profile.id, "bootstrapped profile");
    }
    Ok(profile)
  }
}

/// Return the existing Profile, or write a minimal one. A lost insert race is
/// treated as success and the winner's row is returned.
pub(super) fn load_or_create(
  tx: &mut dyn Transaction,
  identity: &Identity,
  email: String,
  now: DateTime<Utc>,
) -> Result<(Profile, bool)> {
  if let Some(existing) = tx.profile(&identity.id)? {
    return Ok((existing, false));
  }

  let profile = Profile::bootstrap(identity.id.clone(), email, now);
  if tx.insert_profile(&profile)? {
    return Ok((profile, true));
  }

  tx.profile(&identity.id)?
    .map(|existing| (existing, false))
    .ok_or_else(|| Error::not_found("profile", &identity.id))
}
