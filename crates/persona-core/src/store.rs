//! The `PersonaStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `persona-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  Error,
  persona::{NewPersona, Persona},
};

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// Key for a single-persona lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonaLookup {
  Matricula(i64),
  Curp(String),
}

impl PersonaLookup {
  /// Choose the lookup key from optional query values.
  ///
  /// A non-zero matrícula wins over a CURP; a CURP must be non-empty. With
  /// neither present the query is invalid.
  pub fn from_params(
    matricula: Option<i64>,
    curp: Option<String>,
  ) -> Result<Self, Error> {
    match (matricula, curp) {
      (Some(m), _) if m != 0 => Ok(PersonaLookup::Matricula(m)),
      (_, Some(c)) if !c.is_empty() => Ok(PersonaLookup::Curp(c)),
      _ => Err(Error::InvalidQuery),
    }
  }
}

// ─── Pagination ──────────────────────────────────────────────────────────────

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 10;
/// Upper bound on page size.
pub const MAX_PER_PAGE: u32 = 100;

/// A normalised page request. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
  pub page:     u32,
  pub per_page: u32,
}

impl Default for Page {
  fn default() -> Self {
    Page {
      page:     DEFAULT_PAGE,
      per_page: DEFAULT_PER_PAGE,
    }
  }
}

impl Page {
  /// Absent or non-positive values fall back to the defaults; `per_page` is
  /// capped at [`MAX_PER_PAGE`].
  pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
    let page = match page {
      Some(p) if p >= 1 => u32::try_from(p).unwrap_or(u32::MAX),
      _ => DEFAULT_PAGE,
    };
    let per_page = match per_page {
      Some(n) if n >= 1 => n.min(i64::from(MAX_PER_PAGE)) as u32,
      _ => DEFAULT_PER_PAGE,
    };
    Page { page, per_page }
  }

  /// Number of records to skip.
  pub fn offset(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.per_page)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a persona store backend.
///
/// Personas are created once and never updated or deleted.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait PersonaStore: Send + Sync {
  type Error: std::error::Error + Into<Error> + Send + Sync + 'static;

  /// Derive the birth fields, assign a fresh matrícula and persist.
  ///
  /// Fails with [`Error::DuplicateCurp`] if the CURP is already stored. The
  /// uniqueness check and the insert happen atomically.
  fn create(
    &self,
    input: NewPersona,
  ) -> impl Future<Output = Result<Persona, Self::Error>> + Send + '_;

  /// Fetch exactly one persona, or fail with [`Error::NotFound`].
  fn find(
    &self,
    lookup: PersonaLookup,
  ) -> impl Future<Output = Result<Persona, Self::Error>> + Send + '_;

  /// Return one page of personas in storage order.
  fn list(
    &self,
    page: Page,
  ) -> impl Future<Output = Result<Vec<Persona>, Self::Error>> + Send + '_;
}
