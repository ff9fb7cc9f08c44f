//! [`SqliteStore`], the SQLite implementation of [`OnboardingStore`].

use std::path::Path;

use academy_core::{
  identity::IdentityId,
  invitation::{Invitation, InvitationStatus, InvitationToken},
  profile::Profile,
  store::{OnboardingStore, Transaction},
  tenant::{Tenant, TenantId},
};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use crate::{
  encode::{
    encode_dt, encode_tenant_id, RawInvitation, RawProfile, RawTenant, INVITATION_COLUMNS,
    PROFILE_COLUMNS, TENANT_COLUMNS,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An onboarding store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// on one connection run sequentially on its worker thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl OnboardingStore for SqliteStore {
  async fn transaction<T, F>(&self, work: F) -> academy_core::Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn Transaction) -> academy_core::Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = work(&mut SqliteTx { conn: &tx });
        // Dropping `tx` without commit rolls back.
        if out.is_ok() {
          tx.commit()?;
        }
        Ok(out)
      })
      .await
      .map_err(|e| academy_core::Error::from(Error::Database(e)))?
  }

  async fn read<T, F>(&self, work: F) -> academy_core::Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn Transaction) -> academy_core::Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        // Deferred; under WAL a reader never waits on the writer.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let out = work(&mut SqliteTx { conn: &tx });
        tx.rollback()?;
        Ok(out)
      })
      .await
      .map_err(|e| academy_core::Error::from(Error::Database(e)))?
  }
}

// ─── Transaction ─────────────────────────────────────────────────────────────

struct SqliteTx<'a> {
  conn: &'a rusqlite::Connection,
}

impl SqliteTx<'_> {
  fn get_profile(&self, id: &IdentityId) -> Result<Option<Profile>> {
    let raw = self
      .conn
      .query_row(
        &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"),
        rusqlite::params![id.as_str()],
        RawProfile::from_row,
      )
      .optional()?;
    raw.map(RawProfile::into_profile).transpose()
  }

  fn write_profile(&self, sql: &str, p: &Profile) -> Result<usize> {
    Ok(self.conn.execute(
      sql,
      rusqlite::params![
        p.id.as_str(),
        p.tenant_id.map(encode_tenant_id),
        p.role_code.as_ref().map(AsRef::<str>::as_ref),
        p.approval_status.as_ref(),
        p.name,
        p.email,
        p.approved_by.as_ref().map(IdentityId::as_str),
        p.approved_at.map(encode_dt),
        p.rejection_reason,
        encode_dt(p.created_at),
        encode_dt(p.updated_at),
      ],
    )?)
  }

  fn get_tenant(&self, id: TenantId) -> Result<Option<Tenant>> {
    let raw = self
      .conn
      .query_row(
        &format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ?1"),
        rusqlite::params![encode_tenant_id(id)],
        RawTenant::from_row,
      )
      .optional()?;
    raw.map(RawTenant::into_tenant).transpose()
  }

  fn write_tenant(&self, sql: &str, t: &Tenant) -> Result<usize> {
    let settings_json = serde_json::to_string(&t.settings)?;
    Ok(self.conn.execute(
      sql,
      rusqlite::params![
        encode_tenant_id(t.id),
        t.owner_id.as_str(),
        t.name,
        t.slug,
        t.timezone,
        settings_json,
        encode_dt(t.created_at),
        encode_dt(t.updated_at),
      ],
    )?)
  }

  fn get_invitation(&self, token: &InvitationToken) -> Result<Option<Invitation>> {
    let raw = self
      .conn
      .query_row(
        &format!("SELECT {INVITATION_COLUMNS} FROM invitations WHERE token = ?1"),
        rusqlite::params![token.as_str()],
        RawInvitation::from_row,
      )
      .optional()?;
    raw.map(RawInvitation::into_invitation).transpose()
  }

  fn find_open_invitation(
    &self,
    email: &str,
    now: DateTime<Utc>,
  ) -> Result<Option<Invitation>> {
    let mut stmt = self.conn.prepare(&format!(
      "SELECT {INVITATION_COLUMNS} FROM invitations
       WHERE email = ?1 AND status = 'pending'
       ORDER BY created_at DESC"
    ))?;
    let raws = stmt
      .query_map(rusqlite::params![email], RawInvitation::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    for raw in raws {
      let invitation = raw.into_invitation()?;
      if invitation.is_open_at(now) {
        return Ok(Some(invitation));
      }
    }
    Ok(None)
  }

  fn put_invitation(&self, i: &Invitation) -> Result<()> {
    self.conn.execute(
      &format!(
        "INSERT INTO invitations ({INVITATION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
      ),
      rusqlite::params![
        i.token.as_str(),
        encode_tenant_id(i.tenant_id),
        i.invited_by.as_str(),
        i.email,
        i.role_code.as_ref(),
        i.status.as_ref(),
        encode_dt(i.expires_at),
        encode_dt(i.created_at),
      ],
    )?;
    Ok(())
  }

  fn swap_invitation_status(
    &self,
    token: &InvitationToken,
    from: InvitationStatus,
    to: InvitationStatus,
  ) -> Result<bool> {
    let changed = self.conn.execute(
      "UPDATE invitations SET status = ?3 WHERE token = ?1 AND status = ?2",
      rusqlite::params![token.as_str(), from.as_ref(), to.as_ref()],
    )?;
    Ok(changed == 1)
  }
}

impl Transaction for SqliteTx<'_> {
  // ── Profiles ──────────────────────────────────────────────────────────────

  fn profile(&mut self, id: &IdentityId) -> academy_core::Result<Option<Profile>> {
    Ok(self.get_profile(id)?)
  }

  fn insert_profile(&mut self, profile: &Profile) -> academy_core::Result<bool> {
    let inserted = self.write_profile(
      &format!(
        "INSERT INTO profiles ({PROFILE_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(id) DO NOTHING"
      ),
      profile,
    )?;
    Ok(inserted == 1)
  }

  fn update_profile(&mut self, profile: &Profile) -> academy_core::Result<()> {
    let updated = self.write_profile(
      "UPDATE profiles SET
         tenant_id = ?2, role_code = ?3, approval_status = ?4, name = ?5, email = ?6,
         approved_by = ?7, approved_at = ?8, rejection_reason = ?9,
         created_at = ?10, updated_at = ?11
       WHERE id = ?1",
      profile,
    )?;
    if updated == 0 {
      return Err(
        Error::Missing { entity: "profile", id: profile.id.to_string() }.into(),
      );
    }
    Ok(())
  }

  // ── Tenants ───────────────────────────────────────────────────────────────

  fn tenant(&mut self, id: TenantId) -> academy_core::Result<Option<Tenant>> {
    Ok(self.get_tenant(id)?)
  }

  fn insert_tenant(&mut self, tenant: &Tenant) -> academy_core::Result<()> {
    self.write_tenant(
      &format!("INSERT INTO tenants ({TENANT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
      tenant,
    )?;
    Ok(())
  }

  fn update_tenant(&mut self, tenant: &Tenant) -> academy_core::Result<()> {
    let updated = self.write_tenant(
      "UPDATE tenants SET
         owner_id = ?2, name = ?3, slug = ?4, timezone = ?5, settings_json = ?6,
         created_at = ?7, updated_at = ?8
       WHERE id = ?1",
      tenant,
    )?;
    if updated == 0 {
      return Err(Error::Missing { entity: "tenant", id: tenant.id.to_string() }.into());
    }
    Ok(())
  }

  // ── Invitations ───────────────────────────────────────────────────────────

  fn invitation(&mut self, token: &InvitationToken) -> academy_core::Result<Option<Invitation>> {
    Ok(self.get_invitation(token)?)
  }

  fn open_invitation_for_email(
    &mut self,
    email: &str,
    now: DateTime<Utc>,
  ) -> academy_core::Result<Option<Invitation>> {
    Ok(self.find_open_invitation(email, now)?)
  }

  fn insert_invitation(&mut self, invitation: &Invitation) -> academy_core::Result<()> {
    Ok(self.put_invitation(invitation)?)
  }

  fn transition_invitation(
    &mut self,
    token: &InvitationToken,
    from: InvitationStatus,
    to: InvitationStatus,
  ) -> academy_core::Result<bool> {
    Ok(self.swap_invitation_status(token, from, to)?)
  }
}
