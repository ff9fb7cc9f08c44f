//! SQLite backend for the academy onboarding store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every engine write maps to one
//! `BEGIN IMMEDIATE` transaction; reads use a deferred one that is rolled
//! back.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
