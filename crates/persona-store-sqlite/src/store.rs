//! [`SqliteStore`], the SQLite implementation of [`PersonaStore`].

use std::{future::Future, path::Path, time::Duration};

use rusqlite::OptionalExtension as _;

use persona_core::{
  curp, matricula,
  persona::{NewPersona, Persona},
  store::{Page, PersonaLookup, PersonaStore},
};

use crate::{
  Error, Result,
  encode::{RawPersona, UniqueColumn, encode_gender, unique_violation},
  schema::{PERSONA_COLUMNS, SCHEMA},
  ticket::{AbandonOnDrop, Ticket, is_interrupted},
};

/// How many matrículas `create` draws before giving up.
pub const MATRICULA_ATTEMPTS: u32 = 5;

// ─── Timeouts ────────────────────────────────────────────────────────────────

/// Upper bounds on a single store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreTimeouts {
  /// Applies to `create`, including matrícula retries.
  pub write: Duration,
  /// Applies to `find` and `list`.
  pub read:  Duration,
}

impl Default for StoreTimeouts {
  fn default() -> Self {
    StoreTimeouts {
      write: Duration::from_secs(5),
      read:  Duration::from_secs(30),
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

enum InsertOutcome {
  Inserted,
  Taken(UniqueColumn),
}

/// A persona store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted and safe to
/// share across request handlers.
#[derive(Clone)]
pub struct SqliteStore {
  conn:           tokio_rusqlite::Connection,
  timeouts:       StoreTimeouts,
  next_matricula: fn() -> i64,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self {
      conn,
      timeouts: StoreTimeouts::default(),
      next_matricula: matricula::generate,
    })
  }

  pub fn with_timeouts(mut self, timeouts: StoreTimeouts) -> Self {
    self.timeouts = timeouts;
    self
  }

  /// Replace the matrícula generator.
  pub fn with_matricula_source(mut self, source: fn() -> i64) -> Self {
    self.next_matricula = source;
    self
  }

  pub fn timeouts(&self) -> StoreTimeouts { self.timeouts }

  /// Hand out a fresh matrícula from the configured source.
  fn draw_matricula(&self) -> i64 {
    let m = (self.next_matricula)();
    debug_assert!(matricula::is_valid(m), "matricula source produced {m}");
    m
  }

  /// Run `op` under a [`Ticket`], failing with [`Error::Timeout`] once
  /// `limit` elapses.
  ///
  /// Statements still queued when the limit passes, or when this future is
  /// dropped, never run. A statement already executing at the deadline is
  /// allowed to finish and its outcome is returned.
  async fn bounded<T, F, Fut>(limit: Duration, op: F) -> Result<T>
  where
    F: FnOnce(Ticket) -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let ticket = Ticket::default();
    let _abandon = AbandonOnDrop(ticket.clone());

    let op = op(ticket.clone());
    tokio::pin!(op);

    let res = match tokio::time::timeout(limit, &mut op).await {
      Ok(res) => res,
      Err(_) if ticket.abandon() => return Err(Error::Timeout(limit)),
      Err(_) => op.await,
    };

    res.map_err(|e| match e {
      Error::Database(ref db) if is_interrupted(db) => Error::Timeout(limit),
      other => other,
    })
  }

  /// Insert `persona`, reporting a unique-index rejection instead of failing.
  async fn insert(&self, ticket: &Ticket, persona: &Persona) -> Result<InsertOutcome> {
    let ticket           = ticket.clone();
    let nombres          = persona.nombres.clone();
    let apellido_paterno = persona.apellido_paterno.clone();
    let apellido_materno = persona.apellido_materno.clone();
    let curp             = persona.curp.clone();
    let edad             = persona.edad;
    let fecha_nacimiento = persona.fecha_nacimiento.clone();
    let genero           = encode_gender(persona.genero);
    let matricula        = persona.matricula;

    let outcome = self
      .conn
      .call(move |conn| {
        ticket.run(conn, |conn| {
          let res = conn.execute(
            "INSERT INTO personas (
               nombres, apellido_paterno, apellido_materno, curp,
               edad, fecha_nacimiento, genero, matricula
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
              nombres,
              apellido_paterno,
              apellido_materno,
              curp,
              edad,
              fecha_nacimiento,
              genero,
              matricula,
            ],
          );
          match res {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) => match unique_violation(&e) {
              Some(column) => Ok(InsertOutcome::Taken(column)),
              None => Err(e.into()),
            },
          }
        })
      })
      .await?;
    Ok(outcome)
  }

  async fn create_unbounded(&self, ticket: Ticket, input: NewPersona) -> Result<Persona> {
    let mut persona =
      Persona::derive(input, curp::current_year(), self.draw_matricula())?;

    for attempt in 1..=MATRICULA_ATTEMPTS {
      match self.insert(&ticket, &persona).await? {
        InsertOutcome::Inserted => {
          tracing::debug!(
            curp = %persona.curp,
            matricula = persona.matricula,
            "persona stored"
          );
          return Ok(persona);
        }
        InsertOutcome::Taken(UniqueColumn::Curp) => {
          return Err(persona_core::Error::DuplicateCurp(persona.curp).into());
        }
        InsertOutcome::Taken(UniqueColumn::Matricula) => {
          tracing::warn!(
            attempt,
            matricula = persona.matricula,
            "matricula already taken, drawing another"
          );
          persona.matricula = self.draw_matricula();
        }
      }
    }

    Err(Error::MatriculaExhausted(MATRICULA_ATTEMPTS))
  }

  /// Occupy the connection thread for `busy`, delaying everything queued
  /// behind it.
  #[cfg(test)]
  pub(crate) async fn hold_connection(&self, busy: Duration) -> Result<()> {
    self
      .conn
      .call(move |_| {
        std::thread::sleep(busy);
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── PersonaStore impl ───────────────────────────────────────────────────────

impl PersonaStore for SqliteStore {
  type Error = Error;

  async fn create(&self, input: NewPersona) -> Result<Persona> {
    Self::bounded(self.timeouts.write, |ticket| {
      self.create_unbounded(ticket, input)
    })
    .await
  }

  async fn find(&self, lookup: PersonaLookup) -> Result<Persona> {
    let raw: Option<RawPersona> =
      Self::bounded(self.timeouts.read, |ticket| async move {
        let raw = self
          .conn
          .call(move |conn| {
            ticket.run(conn, |conn| {
              let row = match lookup {
                PersonaLookup::Matricula(m) => conn.query_row(
                  &format!("SELECT {PERSONA_COLUMNS} FROM personas WHERE matricula = ?1"),
                  rusqlite::params![m],
                  RawPersona::from_row,
                ),
                PersonaLookup::Curp(c) => conn.query_row(
                  &format!("SELECT {PERSONA_COLUMNS} FROM personas WHERE curp = ?1"),
                  rusqlite::params![c],
                  RawPersona::from_row,
                ),
              };
              Ok(row.optional()?)
            })
          })
          .await?;
        Ok::<_, Error>(raw)
      })
      .await?;

    raw
      .ok_or(Error::Core(persona_core::Error::NotFound))?
      .into_persona()
  }

  async fn list(&self, page: Page) -> Result<Vec<Persona>> {
    let limit  = i64::from(page.per_page);
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);

    let raws: Vec<RawPersona> =
      Self::bounded(self.timeouts.read, |ticket| async move {
        let raws = self
          .conn
          .call(move |conn| {
            ticket.run(conn, |conn| {
              let mut stmt = conn.prepare(&format!(
                "SELECT {PERSONA_COLUMNS} FROM personas ORDER BY rowid LIMIT ?1 OFFSET ?2"
              ))?;
              let rows = stmt
                .query_map(rusqlite::params![limit, offset], RawPersona::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
              Ok(rows)
            })
          })
          .await?;
        Ok::<_, Error>(raws)
      })
      .await?;

    raws.into_iter().map(RawPersona::into_persona).collect()
  }
}
