//! Persona, the single record type of the registry.
//!
//! Field names are the JSON wire format and the storage column names; they
//! must not be renamed.

use serde::{Deserialize, Serialize};

use crate::{Result, curp};

/// Gender as derived from the CURP sex marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
  Hombre,
  Mujer,
  Desconocido,
}

impl Gender {
  /// `'H'` is male, `'M'` is female, anything else is unknown.
  pub fn from_marker(marker: char) -> Self {
    match marker {
      'H' => Gender::Hombre,
      'M' => Gender::Mujer,
      _ => Gender::Desconocido,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Gender::Hombre => "Hombre",
      Gender::Mujer => "Mujer",
      Gender::Desconocido => "Desconocido",
    }
  }
}

/// A stored persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
  pub nombres:          String,
  pub apellido_paterno: String,
  pub apellido_materno: String,
  pub curp:             String,
  pub edad:             i32,
  pub fecha_nacimiento: String,
  pub genero:           Gender,
  pub matricula:        i64,
}

/// The client-supplied part of a persona, as accepted by `POST /persona`.
///
/// Derived fields sent by the client (`edad`, `fecha_nacimiento`, `genero`,
/// `matricula`) are not captured and therefore never reach the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NewPersona {
  pub nombres:          String,
  pub apellido_paterno: String,
  pub apellido_materno: String,
  pub curp:             String,
}

impl Persona {
  /// Build the record to persist: derive birth data from the CURP relative to
  /// `current_year` and stamp the given matrícula.
  pub fn derive(new: NewPersona, current_year: i32, matricula: i64) -> Result<Self> {
    let info = curp::parse(&new.curp, current_year)?;
    Ok(Persona {
      nombres: new.nombres,
      apellido_paterno: new.apellido_paterno,
      apellido_materno: new.apellido_materno,
      curp: new.curp,
      edad: info.age,
      fecha_nacimiento: info.birth_date,
      genero: info.gender,
      matricula,
    })
  }
}
