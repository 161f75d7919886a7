//! Error types for `persona-core`.

use thiserror::Error;

/// The domain error taxonomy shared by every layer.
///
/// Storage backends convert their own errors into this type so the HTTP
/// layer can map each variant onto a status code without knowing which
/// backend produced it.
#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid CURP {0:?}: {1}")]
  InvalidCurp(String, &'static str),

  #[error("the CURP {0} already exists")]
  DuplicateCurp(String),

  #[error("persona not found")]
  NotFound,

  #[error("either matricula or curp must be provided")]
  InvalidQuery,

  #[error("store unavailable: {0}")]
  StoreUnavailable(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
