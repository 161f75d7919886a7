//! JSON HTTP API for the persona registry.
//!
//! Exposes an axum [`Router`] backed by any [`persona_core::store::PersonaStore`].
//! TLS, tracing layers and process startup are the caller's responsibility.

pub mod error;
pub mod personas;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use persona_core::store::PersonaStore;

pub use error::ApiError;

/// Build the persona router for `store`.
///
/// Each route answers unimplemented methods with 405.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: PersonaStore + 'static,
{
  Router::new()
    .route(
      "/persona",
      post(personas::create::<S>)
        .get(personas::get_one::<S>)
        .fallback(personas::method_not_allowed),
    )
    .route(
      "/personas",
      get(personas::list::<S>).fallback(personas::method_not_allowed),
    )
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────
