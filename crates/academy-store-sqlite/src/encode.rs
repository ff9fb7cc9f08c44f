//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that they round-trip exactly and sort
//! lexically. Enums use their lower-case names; tenant settings are JSON.

use std::str::FromStr;

use academy_core::{
  identity::IdentityId,
  invitation::{Invitation, InvitationToken},
  profile::Profile,
  tenant::{Tenant, TenantId},
};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_tenant_id(id: TenantId) -> String { id.0.hyphenated().to_string() }

pub fn decode_tenant_id(s: &str) -> Result<TenantId> { Ok(TenantId(Uuid::parse_str(s)?)) }

fn decode_identity(column: &'static str, s: String) -> Result<IdentityId> {
  IdentityId::new(s.clone()).map_err(|_| Error::UnknownValue { column, value: s })
}

/// Parse a strum-backed enum column.
fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::UnknownValue { column, value: s.to_owned() })
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

pub const PROFILE_COLUMNS: &str = "id, tenant_id, role_code, approval_status, name, email, \
   approved_by, approved_at, rejection_reason, created_at, updated_at";

pub struct RawProfile {
  pub id:               String,
  pub tenant_id:        Option<String>,
  pub role_code:        Option<String>,
  pub approval_status:  String,
  pub name:             Option<String>,
  pub email:            String,
  pub approved_by:      Option<String>,
  pub approved_at:      Option<String>,
  pub rejection_reason: Option<String>,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawProfile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               row.get(0)?,
      tenant_id:        row.get(1)?,
      role_code:        row.get(2)?,
      approval_status:  row.get(3)?,
      name:             row.get(4)?,
      email:            row.get(5)?,
      approved_by:      row.get(6)?,
      approved_at:      row.get(7)?,
      rejection_reason: row.get(8)?,
      created_at:       row.get(9)?,
      updated_at:       row.get(10)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      id:               decode_identity("profiles.id", self.id)?,
      tenant_id:        self.tenant_id.as_deref().map(decode_tenant_id).transpose()?,
      role_code:        self
        .role_code
        .as_deref()
        .map(|s| decode_enum("profiles.role_code", s))
        .transpose()?,
      approval_status:  decode_enum("profiles.approval_status", &self.approval_status)?,
      name:             self.name,
      email:            self.email,
      approved_by:      self
        .approved_by
        .map(|s| decode_identity("profiles.approved_by", s))
        .transpose()?,
      approved_at:      self.approved_at.as_deref().map(decode_dt).transpose()?,
      rejection_reason: self.rejection_reason,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

pub const TENANT_COLUMNS: &str =
  "id, owner_id, name, slug, timezone, settings_json, created_at, updated_at";

pub struct RawTenant {
  pub id:            String,
  pub owner_id:      String,
  pub name:          String,
  pub slug:          Option<String>,
  pub timezone:      Option<String>,
  pub settings_json: String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawTenant {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      owner_id:      row.get(1)?,
      name:          row.get(2)?,
      slug:          row.get(3)?,
      timezone:      row.get(4)?,
      settings_json: row.get(5)?,
      created_at:    row.get(6)?,
      updated_at:    row.get(7)?,
    })
  }

  pub fn into_tenant(self) -> Result<Tenant> {
    Ok(Tenant {
      id:         decode_tenant_id(&self.id)?,
      name:       self.name,
      owner_id:   decode_identity("tenants.owner_id", self.owner_id)?,
      slug:       self.slug,
      timezone:   self.timezone,
      settings:   serde_json::from_str(&self.settings_json)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const INVITATION_COLUMNS: &str =
  "token, tenant_id, invited_by, email, role_code, status, expires_at, created_at";

pub struct RawInvitation {
  pub token:      String,
  pub tenant_id:  String,
  pub invited_by: String,
  pub email:      String,
  pub role_code:  String,
  pub status:     String,
  pub expires_at: String,
  pub created_at: String,
}

impl RawInvitation {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      token:      row.get(0)?,
      tenant_id:  row.get(1)?,
      invited_by: row.get(2)?,
      email:      row.get(3)?,
      role_code:  row.get(4)?,
      status:     row.get(5)?,
      expires_at: row.get(6)?,
      created_at: row.get(7)?,
    })
  }

  pub fn into_invitation(self) -> Result<Invitation> {
    let token = InvitationToken::parse(&self.token).map_err(|_| Error::UnknownValue {
      column: "invitations.token",
      value:  String::from("<redacted>"),
    })?;
    Ok(Invitation {
      token,
      tenant_id:  decode_tenant_id(&self.tenant_id)?,
      invited_by: decode_identity("invitations.invited_by", self.invited_by)?,
      email:      self.email,
      role_code:  decode_enum("invitations.role_code", &self.role_code)?,
      status:     decode_enum("invitations.status", &self.status)?,
      expires_at: decode_dt(&self.expires_at)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
