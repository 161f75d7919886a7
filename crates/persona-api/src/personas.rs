//! Handlers for the persona endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/persona` | Body: [`NewPersona`] JSON; 201 with empty body |
//! | `GET`  | `/persona` | `?matricula=<int>` or `?curp=<code>`; matrícula wins |
//! | `GET`  | `/personas` | `?page=<int>&perPage=<int>`; JSON array |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
};
use bytes::Bytes;
use persona_core::{
  persona::{NewPersona, Persona},
  store::{Page, PersonaLookup, PersonaStore},
};

use crate::error::ApiError;

/// Decoded query string pairs, in request order and with repeats kept.
type QueryPairs = Vec<(String, String)>;

/// The first value given for `key`; later repeats are ignored.
fn first<'a>(pairs: &'a QueryPairs, key: &str) -> Option<&'a str> {
  pairs
    .iter()
    .find(|(k, _)| k == key)
    .map(|(_, v)| v.as_str())
}

/// Parse an integer query value, treating anything unparsable as absent.
fn lenient_int(value: Option<&str>) -> Option<i64> {
  value.and_then(|v| v.trim().parse().ok())
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /persona`
///
/// The body is decoded by hand so that every decode failure, syntactic or
/// structural, is a 400 carrying the decoder's message. Only the first JSON
/// value is read; anything after it is ignored.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  body: Bytes,
) -> Result<StatusCode, ApiError>
where
  S: PersonaStore,
{
  let input = decode_first(&body)?;

  let persona = store.create(input).await.map_err(ApiError::store)?;
  tracing::info!(matricula = persona.matricula, "persona created");

  Ok(StatusCode::CREATED)
}

fn decode_first(body: &[u8]) -> Result<NewPersona, ApiError> {
  serde_json::Deserializer::from_slice(body)
    .into_iter::<NewPersona>()
    .next()
    .ok_or_else(|| ApiError::BadRequest("request body is empty".to_owned()))?
    .map_err(|e| ApiError::BadRequest(e.to_string()))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /persona?matricula=<int>` or `GET /persona?curp=<code>`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<QueryPairs>,
) -> Result<Json<Persona>, ApiError>
where
  S: PersonaStore,
{
  let lookup = PersonaLookup::from_params(
    lenient_int(first(&params, "matricula")),
    first(&params, "curp").map(str::to_owned),
  )?;

  let persona = store.find(lookup).await.map_err(ApiError::store)?;
  Ok(Json(persona))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /personas[?page=<int>][&perPage=<int>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<QueryPairs>,
) -> Result<Json<Vec<Persona>>, ApiError>
where
  S: PersonaStore,
{
  let page = Page::new(
    lenient_int(first(&params, "page")),
    lenient_int(first(&params, "perPage")),
  );

  let personas = store.list(page).await.map_err(ApiError::store)?;
  Ok(Json(personas))
}

// ─── Fallback ─────────────────────────────────────────────────────────────────

/// Any method a route does not implement.
pub async fn method_not_allowed() -> ApiError { ApiError::MethodNotAllowed }
