//! SQL schema for the persona SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Rows are insert-only. rowid order is storage order for pagination.
CREATE TABLE IF NOT EXISTS personas (
    nombres           TEXT    NOT NULL,
    apellido_paterno  TEXT    NOT NULL,
    apellido_materno  TEXT    NOT NULL,
    curp              TEXT    NOT NULL,
    edad              INTEGER NOT NULL,
    fecha_nacimiento  TEXT    NOT NULL,   -- YYYY-MM-DD, not validated
    genero            TEXT    NOT NULL,   -- 'Hombre' | 'Mujer' | 'Desconocido'
    matricula         INTEGER NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS personas_curp_idx      ON personas(curp);
CREATE UNIQUE INDEX IF NOT EXISTS personas_matricula_idx ON personas(matricula);

PRAGMA user_version = 1;
";

/// Column list shared by every `SELECT`, in [`RawPersona`](crate::encode::RawPersona) order.
pub const PERSONA_COLUMNS: &str = "nombres, apellido_paterno, apellido_materno, curp, \
                                   edad, fecha_nacimiento, genero, matricula";
