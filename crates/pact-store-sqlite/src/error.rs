//! Error type for `pact-store-sqlite`.

use pact_core::store::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] pact_core::Error),

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

  #[error("cannot decode column {column}: {value:?}")]
  Decode { column: &'static str, value: String },

  /// The row changed between read and write. Cannot happen while writes go
  /// through `IMMEDIATE` transactions; reported rather than overwritten.
  #[error("agreement {0} was modified concurrently")]
  Conflict(uuid::Uuid),
}

impl DomainError for Error {
  fn domain(&self) -> Option<&pact_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
