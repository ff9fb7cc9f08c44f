//! The `OnboardingStore` trait and the transaction handle it lends out.
//!
//! Every engine operation runs as one closure inside
//! [`OnboardingStore::transaction`]. Backends guarantee all-or-nothing
//! semantics: the closure's writes are committed only if it returns `Ok`, and
//! a store failure at any point leaves nothing behind. Transactions on one
//! store are serialised, so check-then-write sequences inside a closure are
//! race-free. Read-only operations go through [`OnboardingStore::read`],
//! which never blocks writers.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  identity::IdentityId,
  invitation::{Invitation, InvitationStatus, InvitationToken},
  profile::Profile,
  tenant::{Tenant, TenantId},
  Result,
};

// ─── Transaction ─────────────────────────────────────────────────────────────

/// Synchronous reads and writes available inside a transaction.
pub trait Transaction {
  // ── Profiles ──────────────────────────────────────────────────────────

  fn profile(&mut self, id: &IdentityId) -> Result<Option<Profile>>;

  /// Conditional insert keyed on `profile.id`. Returns `false` (and writes
  /// nothing) if a row with that id already exists.
  fn insert_profile(&mut self, profile: &Profile) -> Result<bool>;

  /// Overwrite an existing row. Fails with `NotFound` if it is missing.
  fn update_profile(&mut self, profile: &Profile) -> Result<()>;

  // ── Tenants ───────────────────────────────────────────────────────────

  fn tenant(&mut self, id: TenantId) -> Result<Option<Tenant>>;

  /// Fails with `Conflict` if the owner already has a tenant or the slug is
  /// taken.
  fn insert_tenant(&mut self, tenant: &Tenant) -> Result<()>;

  fn update_tenant(&mut self, tenant: &Tenant) -> Result<()>;

  // ── Invitations ───────────────────────────────────────────────────────

  fn invitation(&mut self, token: &InvitationToken) -> Result<Option<Invitation>>;

  /// The most recently issued pending invitation for `email` that has not
  /// expired at `now`.
  fn open_invitation_for_email(
    &mut self,
    email: &str,
    now: DateTime<Utc>,
  ) -> Result<Option<Invitation>>;

  fn insert_invitation(&mut self, invitation: &Invitation) -> Result<()>;

  /// Compare-and-swap on status. Returns `false` if the stored status was not
  /// `from` (nothing is written).
  fn transition_invitation(
    &mut self,
    token: &InvitationToken,
    from: InvitationStatus,
    to: InvitationStatus,
  ) -> Result<bool>;
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Abstraction over an onboarding store backend.
pub trait OnboardingStore: Send + Sync {
  /// Run `work` inside a single atomic transaction.
  fn transaction<T, F>(&self, work: F) -> impl Future<Output = Result<T>> + Send + '_
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn Transaction) -> Result<T> + Send + 'static;

  /// Run `work` against a consistent snapshot without taking the write lock.
  /// Anything `work` writes is discarded.
  fn read<T, F>(&self, work: F) -> impl Future<Output = Result<T>> + Send + '_
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn Transaction) -> Result<T> + Send + 'static;
}
