//! Birth data derivation from a CURP identity code.
//!
//! Only the leading eleven characters carry meaning here:
//!
//! ```text
//! ABCD 99 01 01 H DFRRN09
//! ^^^^ ^^ ^^ ^^ ^
//! |    |  |  |  sex marker
//! |    |  |  day
//! |    |  month
//! |    two-digit year
//! ignored
//! ```
//!
//! Month and day are passed through verbatim; no calendar validation is done.

use chrono::{Datelike as _, Utc};

use crate::{Error, Result, persona::Gender};

/// Number of characters required to reach the sex marker.
pub const MIN_LEN: usize = 11;

/// Fields derived from a CURP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurpInfo {
  pub birth_year: i32,
  /// `"<year>-<MM>-<DD>"`.
  pub birth_date: String,
  /// Current year minus birth year. No month/day adjustment.
  pub age:        i32,
  pub gender:     Gender,
}

/// The wall-clock year used for century resolution and age.
pub fn current_year() -> i32 { Utc::now().year() }

/// Derive birth date, age and gender from `curp` relative to `current_year`.
///
/// The two-digit year resolves to the 2000s unless that would put the birth
/// in the future, in which case it resolves to the 1900s.
pub fn parse(curp: &str, current_year: i32) -> Result<CurpInfo> {
  let chars: Vec<char> = curp.chars().take(MIN_LEN).collect();
  if chars.len() < MIN_LEN {
    return Err(Error::InvalidCurp(
      curp.to_owned(),
      "must be at least 11 characters",
    ));
  }

  let field = |from: usize, to: usize| chars[from..to].iter().collect::<String>();
  let month = field(6, 8);
  let day = field(8, 10);

  let yy = two_digits(&field(4, 6)).ok_or_else(|| {
    Error::InvalidCurp(curp.to_owned(), "birth year must be two digits")
  })?;
  let birth_year = if 2000 + yy <= current_year {
    2000 + yy
  } else {
    1900 + yy
  };

  Ok(CurpInfo {
    birth_year,
    birth_date: format!("{birth_year}-{month}-{day}"),
    age: current_year - birth_year,
    gender: Gender::from_marker(chars[10]),
  })
}

fn two_digits(s: &str) -> Option<i32> {
  if s.chars().count() == 2 && s.chars().all(|c| c.is_ascii_digit()) {
    s.parse().ok()
  } else {
    None
  }
}
