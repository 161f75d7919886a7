//! Core types and trait definitions for the persona registry.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod curp;
pub mod error;
pub mod matricula;
pub mod persona;
pub mod store;

pub use error::{Error, Result};
