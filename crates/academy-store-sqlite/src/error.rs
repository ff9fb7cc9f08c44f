//! Error type for `academy-store-sqlite`.

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {column} value: {value:?}")]
  UnknownValue { column: &'static str, value: String },

  #[error("{entity} not found: {id}")]
  Missing { entity: &'static str, id: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation
  )
}

/// Constraint violations surface as `Conflict`, missing rows as `NotFound`;
/// everything else is a dependency failure.
impl From<Error> for academy_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Sqlite(ref inner) if is_constraint_violation(inner) => {
        academy_core::Error::conflict(format!("constraint violated: {inner}"))
      }
      Error::Missing { entity, id } => academy_core::Error::NotFound { entity, id },
      other => academy_core::Error::dependency(other),
    }
  }
}
