//! In-memory [`OnboardingStore`] with snapshot/commit semantics.
//!
//! Each transaction works on a copy of the state which replaces the shared
//! state only when the closure succeeds. Used by the engine tests and handy
//! for wiring the HTTP layer without a database.

use std::{
  collections::HashMap,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
  },
};

use chrono::{DateTime, Utc};

use crate::{
  identity::IdentityId,
  invitation::{Invitation, InvitationStatus, InvitationToken},
  profile::Profile,
  store::{OnboardingStore, Transaction},
  tenant::{Tenant, TenantId},
  Error, Result,
};

#[derive(Debug, Clone, Default)]
struct State {
  profiles:    HashMap<IdentityId, Profile>,
  tenants:     HashMap<TenantId, Tenant>,
  invitations: HashMap<String, Invitation>,
}

#[derive(Debug, Default)]
struct Inner {
  state:            Mutex<State>,
  fail_next_commit: AtomicBool,
}

/// Cloning is cheap; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Inner>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Make the next transaction run its closure and then fail at commit time
  /// with a `DependencyFailure`, discarding every write it made.
  pub fn fail_next_commit(&self) {
    self.inner.fail_next_commit.store(true, Ordering::SeqCst);
  }

  pub fn profiles(&self) -> Vec<Profile> {
    self.inspect(|s| s.profiles.values().cloned().collect())
  }

  pub fn tenants(&self) -> Vec<Tenant> {
    self.inspect(|s| s.tenants.values().cloned().collect())
  }

  pub fn invitations(&self) -> Vec<Invitation> {
    self.inspect(|s| s.invitations.values().cloned().collect())
  }

  fn inspect<T>(&self, f: impl FnOnce(&State) -> T) -> T {
    let guard = match self.inner.state.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    f(&guard)
  }
}

impl OnboardingStore for MemoryStore {
  async fn transaction<T, F>(&self, work: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn Transaction) -> Result<T> + Send + 'static,
  {
    let mut shared = self
      .inner
      .state
      .lock()
      .map_err(|_| Error::dependency("memory store lock poisoned"))?;

    let mut working = shared.clone();
    let out = work(&mut MemoryTx { state: &mut working })?;

    if self.inner.fail_next_commit.swap(false, Ordering::SeqCst) {
      return Err(Error::dependency("injected commit failure"));
    }

    *shared = working;
    Ok(out)
  }

  async fn read<T, F>(&self, work: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn Transaction) -> Result<T> + Send + 'static,
  {
    let mut snapshot = self.inspect(State::clone);
    work(&mut MemoryTx { state: &mut snapshot })
  }
}

// ─── Transaction ─────────────────────────────────────────────────────────────

struct MemoryTx<'a> {
  state: &'a mut State,
}

impl Transaction for MemoryTx<'_> {
  fn profile(&mut self, id: &IdentityId) -> Result<Option<Profile>> {
    Ok(self.state.profiles.get(id).cloned())
  }

  fn insert_profile(&mut self, profile: &Profile) -> Result<bool> {
    if self.state.profiles.contains_key(&profile.id) {
      return Ok(false);
    }
    self.state.profiles.insert(profile.id.clone(), profile.clone());
    Ok(true)
  }

  fn update_profile(&mut self, profile: &Profile) -> Result<()> {
    match self.state.profiles.get_mut(&profile.id) {
      Some(row) => {
        *row = profile.clone();
        Ok(())
      }
      None => Err(Error::not_found("profile", &profile.id)),
    }
  }

  fn tenant(&mut self, id: TenantId) -> Result<Option<Tenant>> {
    Ok(self.state.tenants.get(&id).cloned())
  }

  fn insert_tenant(&mut self, tenant: &Tenant) -> Result<()> {
    for existing in self.state.tenants.values() {
      if existing.id == tenant.id || existing.owner_id == tenant.owner_id {
        return Err(Error::conflict(format!(
          "profile {} already owns a tenant",
          tenant.owner_id
        )));
      }
      if tenant.slug.is_some() && existing.slug == tenant.slug {
        return Err(Error::conflict(format!(
          "academy slug {:?} is already taken",
          tenant.slug.as_deref().unwrap_or_default()
        )));
      }
    }
    self.state.tenants.insert(tenant.id, tenant.clone());
    Ok(())
  }

  fn update_tenant(&mut self, tenant: &Tenant) -> Result<()> {
    match self.state.tenants.get_mut(&tenant.id) {
      Some(row) => {
        *row = tenant.clone();
        Ok(())
      }
      None => Err(Error::not_found("tenant", tenant.id)),
    }
  }

  fn invitation(&mut self, token: &InvitationToken) -> Result<Option<Invitation>> {
    Ok(self.state.invitations.get(token.as_str()).cloned())
  }

  fn open_invitation_for_email(
    &mut self,
    email: &str,
    now: DateTime<Utc>,
  ) -> Result<Option<Invitation>> {
    Ok(
      self
        .state
        .invitations
        .values()
        .filter(|i| i.email == email && i.is_open_at(now))
        .max_by_key(|i| i.created_at)
        .cloned(),
    )
  }

  fn insert_invitation(&mut self, invitation: &Invitation) -> Result<()> {
    let key = invitation.token.as_str().to_owned();
    if self.state.invitations.contains_key(&key) {
      return Err(Error::conflict("invitation token already exists"));
    }
    self.state.invitations.insert(key, invitation.clone());
    Ok(())
  }

  fn transition_invitation(
    &mut self,
    token: &InvitationToken,
    from: InvitationStatus,
    to: InvitationStatus,
  ) -> Result<bool> {
    match self.state.invitations.get_mut(token.as_str()) {
      Some(row) if row.status == from => {
        row.status = to;
        Ok(true)
      }
      _ => Ok(false),
    }
  }
}
