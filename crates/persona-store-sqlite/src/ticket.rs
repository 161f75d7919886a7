//! Cancellation for work queued on the connection thread.
//!
//! Dropping a future that waits on `tokio_rusqlite::Connection::call` does not
//! remove the closure from the connection's queue. A [`Ticket`] is handed to
//! every closure of one bounded operation; the closure calls
//! [`Ticket::begin`] right before touching the database and bails out with
//! `SQLITE_INTERRUPT` once the operation has been abandoned.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
  /// No statement running; new ones may start.
  Idle,
  /// A statement is executing on the connection thread.
  Running,
  /// Abandoned while a statement was running; no further statements start.
  Expired,
  /// No further statements start.
  Abandoned,
}

#[derive(Debug, Clone)]
pub struct Ticket(Arc<Mutex<Phase>>);

impl Default for Ticket {
  fn default() -> Self { Ticket(Arc::new(Mutex::new(Phase::Idle))) }
}

impl Ticket {
  fn lock(&self) -> MutexGuard<'_, Phase> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Claim the connection for one statement. Fails once abandoned.
  pub fn begin(&self) -> rusqlite::Result<()> {
    let mut phase = self.lock();
    match *phase {
      Phase::Idle => {
        *phase = Phase::Running;
        Ok(())
      }
      _ => Err(interrupted()),
    }
  }

  /// Release the claim taken by [`begin`](Self::begin).
  pub fn finish(&self) {
    let mut phase = self.lock();
    *phase = match *phase {
      Phase::Running => Phase::Idle,
      Phase::Expired => Phase::Abandoned,
      other => other,
    };
  }

  /// Stop statements that have not started yet.
  ///
  /// Returns `false` if a statement is executing right now; its effects
  /// will land, so the caller must wait for its outcome instead of
  /// reporting failure.
  pub fn abandon(&self) -> bool {
    let mut phase = self.lock();
    match *phase {
      Phase::Running | Phase::Expired => {
        *phase = Phase::Expired;
        false
      }
      Phase::Idle | Phase::Abandoned => {
        *phase = Phase::Abandoned;
        true
      }
    }
  }

  /// Run `f` on the connection thread under this ticket.
  pub fn run<T>(
    &self,
    conn: &mut rusqlite::Connection,
    f: impl FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<T>,
  ) -> tokio_rusqlite::Result<T> {
    self.begin()?;
    let res = f(conn);
    self.finish();
    res
  }
}

/// Abandons the ticket when the owning future is dropped, e.g. on client
/// disconnect.
pub struct AbandonOnDrop(pub Ticket);

impl Drop for AbandonOnDrop {
  fn drop(&mut self) { self.0.abandon(); }
}

fn interrupted() -> rusqlite::Error {
  rusqlite::Error::SqliteFailure(
    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_INTERRUPT),
    Some("operation abandoned before it started".to_owned()),
  )
}

/// Whether `err` is an interrupted statement.
pub fn is_interrupted(err: &tokio_rusqlite::Error) -> bool {
  match err {
    tokio_rusqlite::Error::Rusqlite(e) => {
      e.sqlite_error_code() == Some(rusqlite::ErrorCode::OperationInterrupted)
    }
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn abandoned_ticket_refuses_to_begin() {
    let t = Ticket::default();
    assert!(t.abandon());
    let err = t.begin().unwrap_err();
    assert!(is_interrupted(&tokio_rusqlite::Error::Rusqlite(err)));
  }

  #[test]
  fn abandon_while_running_waits_for_the_statement() {
    let t = Ticket::default();
    t.begin().unwrap();
    assert!(!t.abandon());
    t.finish();
    assert!(t.begin().is_err());
  }

  #[test]
  fn statements_run_back_to_back() {
    let t = Ticket::default();
    t.begin().unwrap();
    t.finish();
    t.begin().unwrap();
    t.finish();
  }
}
