//! Encoding and decoding helpers between domain types and SQLite columns.

use persona_core::persona::{Gender, Persona};

use crate::{Error, Result};

// ─── Gender ──────────────────────────────────────────────────────────────────

pub fn encode_gender(g: Gender) -> &'static str { g.as_str() }

pub fn decode_gender(s: &str) -> Result<Gender> {
  match s {
    "Hombre" => Ok(Gender::Hombre),
    "Mujer" => Ok(Gender::Mujer),
    "Desconocido" => Ok(Gender::Desconocido),
    other => Err(Error::UnknownGender(other.to_owned())),
  }
}

// ─── Unique violations ───────────────────────────────────────────────────────

/// The column whose unique index rejected an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueColumn {
  Curp,
  Matricula,
}

/// Classify `err` as a unique-index violation on `personas`, if it is one.
pub fn unique_violation(err: &rusqlite::Error) -> Option<UniqueColumn> {
  match err {
    rusqlite::Error::SqliteFailure(e, Some(msg))
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
    {
      if msg.contains("personas.curp") {
        Some(UniqueColumn::Curp)
      } else if msg.contains("personas.matricula") {
        Some(UniqueColumn::Matricula)
      } else {
        None
      }
    }
    _ => None,
  }
}

// ─── Raw row ─────────────────────────────────────────────────────────────────

/// A `personas` row exactly as read from SQLite.
pub struct RawPersona {
  pub nombres:          String,
  pub apellido_paterno: String,
  pub apellido_materno: String,
  pub curp:             String,
  pub edad:             i32,
  pub fecha_nacimiento: String,
  pub genero:           String,
  pub matricula:        i64,
}

impl RawPersona {
  /// Read a row selected with [`PERSONA_COLUMNS`](crate::schema::PERSONA_COLUMNS).
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawPersona {
      nombres:          row.get(0)?,
      apellido_paterno: row.get(1)?,
      apellido_materno: row.get(2)?,
      curp:             row.get(3)?,
      edad:             row.get(4)?,
      fecha_nacimiento: row.get(5)?,
      genero:           row.get(6)?,
      matricula:        row.get(7)?,
    })
  }

  pub fn into_persona(self) -> Result<Persona> {
    Ok(Persona {
      nombres:          self.nombres,
      apellido_paterno: self.apellido_paterno,
      apellido_materno: self.apellido_materno,
      curp:             self.curp,
      edad:             self.edad,
      fecha_nacimiento: self.fecha_nacimiento,
      genero:           decode_gender(&self.genero)?,
      matricula:        self.matricula,
    })
  }
}
