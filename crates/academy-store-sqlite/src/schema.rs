//! SQL schema for the academy SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;

-- One row per identity; id is the identity provider's subject.
CREATE TABLE IF NOT EXISTS profiles (
    id               TEXT PRIMARY KEY,
    tenant_id        TEXT,            -- NULL until invitation or owner onboarding
    role_code        TEXT CHECK (role_code IN ('owner', 'instructor', 'assistant')),
    approval_status  TEXT NOT NULL DEFAULT 'pending'
                     CHECK (approval_status IN ('pending', 'approved', 'rejected')),
    name             TEXT,
    email            TEXT NOT NULL,   -- normalised lower-case
    approved_by      TEXT,
    approved_at      TEXT,
    rejection_reason TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

-- At most one tenant per owner; slugs are globally unique when present.
CREATE TABLE IF NOT EXISTS tenants (
    id            TEXT PRIMARY KEY,
    owner_id      TEXT NOT NULL UNIQUE REFERENCES profiles(id),
    name          TEXT NOT NULL,
    slug          TEXT UNIQUE,
    timezone      TEXT,
    settings_json TEXT NOT NULL DEFAULT '{}',
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- Status-only lifecycle; rows are never deleted.
CREATE TABLE IF NOT EXISTS invitations (
    token      TEXT PRIMARY KEY,
    tenant_id  TEXT NOT NULL,
    invited_by TEXT NOT NULL,
    email      TEXT NOT NULL,
    role_code  TEXT NOT NULL CHECK (role_code IN ('instructor', 'assistant')),
    status     TEXT NOT NULL DEFAULT 'pending'
               CHECK (status IN ('pending', 'accepted', 'cancelled', 'expired')),
    expires_at TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS profiles_tenant_idx     ON profiles(tenant_id);
CREATE INDEX IF NOT EXISTS invitations_email_idx   ON invitations(email, status);
CREATE INDEX IF NOT EXISTS invitations_tenant_idx  ON invitations(tenant_id);

PRAGMA user_version = 1;
";
