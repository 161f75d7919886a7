//! Error type for `persona-store-sqlite`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] persona_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("store operation timed out after {0:?}")]
  Timeout(Duration),

  #[error("unknown genero in store: {0:?}")]
  UnknownGender(String),

  /// Every drawn matrícula was already taken.
  #[error("no free matricula after {0} attempts")]
  MatriculaExhausted(u32),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for persona_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Core(core) => core,
      other => persona_core::Error::StoreUnavailable(other.to_string()),
    }
  }
}
