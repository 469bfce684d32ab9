//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates ISO 8601 strings, UUIDs
//! hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use souche_core::{
  person::{Genre, Person},
  position::{ActorId, HistoryAction, Position, PositionHistoryEntry},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_genre(g: Genre) -> &'static str {
  match g {
    Genre::Homme => "homme",
    Genre::Femme => "femme",
  }
}

pub fn decode_genre(s: &str) -> Result<Genre> {
  match s {
    "homme" => Ok(Genre::Homme),
    "femme" => Ok(Genre::Femme),
    other => Err(Error::UnknownValue { column: "genre", value: other.to_owned() }),
  }
}

pub fn decode_action(s: &str) -> Result<HistoryAction> {
  HistoryAction::parse(s)
    .ok_or_else(|| Error::UnknownValue { column: "action", value: s.to_owned() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `persons` row.
pub struct RawPerson {
  pub person_id:       String,
  pub nom:             String,
  pub prenom:          String,
  pub genre:           String,
  pub pere:            Option<String>,
  pub mere:            Option<String>,
  pub ordre_naissance: u32,
  pub date_naissance:  Option<String>,
  pub date_deces:      Option<String>,
  pub image:           Option<String>,
}

/// Column list matching [`RawPerson::from_row`].
pub const PERSON_COLUMNS: &str = "person_id, nom, prenom, genre, pere, mere, \
   ordre_naissance, date_naissance, date_deces, image";

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:       row.get(0)?,
      nom:             row.get(1)?,
      prenom:          row.get(2)?,
      genre:           row.get(3)?,
      pere:            row.get(4)?,
      mere:            row.get(5)?,
      ordre_naissance: row.get(6)?,
      date_naissance:  row.get(7)?,
      date_deces:      row.get(8)?,
      image:           row.get(9)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      id:              decode_uuid(&self.person_id)?,
      nom:             self.nom,
      prenom:          self.prenom,
      genre:           decode_genre(&self.genre)?,
      pere:            self.pere.as_deref().map(decode_uuid).transpose()?,
      mere:            self.mere.as_deref().map(decode_uuid).transpose()?,
      ordre_naissance: self.ordre_naissance,
      date_naissance:  self.date_naissance.as_deref().map(decode_date).transpose()?,
      date_deces:      self.date_deces.as_deref().map(decode_date).transpose()?,
      image:           self.image,
    })
  }
}

/// Raw values read directly from a `positions` row.
pub struct RawPosition {
  pub person_id:  String,
  pub x:          f64,
  pub y:          f64,
  pub updated_at: String,
}

impl RawPosition {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:  row.get(0)?,
      x:          row.get(1)?,
      y:          row.get(2)?,
      updated_at: row.get(3)?,
    })
  }

  pub fn into_position(self) -> Result<Position> {
    Ok(Position {
      person_id:  decode_uuid(&self.person_id)?,
      x:          self.x,
      y:          self.y,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `position_history` row.
pub struct RawHistoryEntry {
  pub entry_id:   String,
  pub person_id:  String,
  pub x:          f64,
  pub y:          f64,
  pub action:     String,
  pub updated_at: String,
  pub updated_by: Option<String>,
}

impl RawHistoryEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_id:   row.get(0)?,
      person_id:  row.get(1)?,
      x:          row.get(2)?,
      y:          row.get(3)?,
      action:     row.get(4)?,
      updated_at: row.get(5)?,
      updated_by: row.get(6)?,
    })
  }

  pub fn into_entry(self) -> Result<PositionHistoryEntry> {
    Ok(PositionHistoryEntry {
      id:         decode_uuid(&self.entry_id)?,
      person_id:  decode_uuid(&self.person_id)?,
      x:          self.x,
      y:          self.y,
      action:     decode_action(&self.action)?,
      updated_at: decode_dt(&self.updated_at)?,
      updated_by: self.updated_by.map(ActorId),
    })
  }
}
