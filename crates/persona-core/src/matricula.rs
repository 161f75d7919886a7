//! Random ten-digit enrollment numbers.

use rand::Rng as _;

/// Smallest ten-digit matrícula.
pub const MIN: i64 = 1_000_000_000;
/// Largest ten-digit matrícula.
pub const MAX: i64 = 9_999_999_999;

/// Draw a matrícula uniformly from `[MIN, MAX]`.
///
/// Uses the thread-local generator, which is seeded from the OS once per
/// thread and never reseeded from the clock. Uniqueness is not checked here;
/// the store retries on collision.
pub fn generate() -> i64 { rand::thread_rng().gen_range(MIN..=MAX) }

/// Whether `value` has the shape of a matrícula.
pub fn is_valid(value: i64) -> bool { (MIN..=MAX).contains(&value) }
