//! Persisted node positions and their append-only history.
//!
//! A [`Position`] is the single live row per person, overwritten on every
//! drag commit. Each change is also recorded as a [`PositionHistoryEntry`];
//! history rows are never updated or deleted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::person::PersonId;

// ─── Geometry ────────────────────────────────────────────────────────────────

/// A point in layout space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

impl Point {
  pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }

  /// The point displaced by `(dx, dy)`.
  pub fn offset(self, dx: f64, dy: f64) -> Self {
    Self::new(self.x + dx, self.y + dy)
  }

  pub fn midpoint(self, other: Self) -> Self {
    Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
  }
}

// ─── Live position ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub person_id:  PersonId,
  pub x:          f64,
  pub y:          f64,
  /// Server-assigned timestamp of the last write.
  pub updated_at: DateTime<Utc>,
}

impl Position {
  pub fn point(&self) -> Point { Point::new(self.x, self.y) }
}

/// Result of an upsert: the stored row, and whether it did not exist before.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionWrite {
  pub position: Position,
  pub created:  bool,
}

impl PositionWrite {
  /// The history label matching this write.
  pub fn action(&self) -> HistoryAction {
    if self.created { HistoryAction::Created } else { HistoryAction::Updated }
  }
}

// ─── Actors ──────────────────────────────────────────────────────────────────

/// The identity on whose behalf a change is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ActorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for ActorId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for ActorId {
  fn from(s: String) -> Self { Self(s) }
}

// ─── History ─────────────────────────────────────────────────────────────────

/// The label stored with a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
  Created,
  Updated,
  Deleted,
  /// The position was removed because its person was deleted. Stores that
  /// only know the three generic labels reject it; the recorder then falls
  /// back to [`HistoryAction::Deleted`].
  PersonDeleted,
}

impl HistoryAction {
  /// The string stored in the `action` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Created => "created",
      Self::Updated => "updated",
      Self::Deleted => "deleted",
      Self::PersonDeleted => "person_deleted",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "created" => Some(Self::Created),
      "updated" => Some(Self::Updated),
      "deleted" => Some(Self::Deleted),
      "person_deleted" => Some(Self::PersonDeleted),
      _ => None,
    }
  }

  /// Whether the action removes the live position instead of writing it.
  pub fn is_removal(self) -> bool {
    matches!(self, Self::Deleted | Self::PersonDeleted)
  }

  /// The generic label to retry with when the store rejects this one.
  pub fn fallback(self) -> Option<Self> {
    match self {
      Self::PersonDeleted => Some(Self::Deleted),
      _ => None,
    }
  }
}

/// Input to [`crate::store::RelationshipStore::append_history`].
/// The id and `updated_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
  pub person_id:  PersonId,
  pub x:          f64,
  pub y:          f64,
  pub action:     HistoryAction,
  pub updated_by: Option<ActorId>,
}

/// An immutable audit record of a position change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionHistoryEntry {
  pub id:         Uuid,
  pub person_id:  PersonId,
  pub x:          f64,
  pub y:          f64,
  pub action:     HistoryAction,
  pub updated_at: DateTime<Utc>,
  pub updated_by: Option<ActorId>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_person_deleted_has_a_fallback() {
    assert_eq!(
      HistoryAction::PersonDeleted.fallback(),
      Some(HistoryAction::Deleted)
    );
    assert_eq!(HistoryAction::Deleted.fallback(), None);
    assert_eq!(HistoryAction::Updated.fallback(), None);
  }

  #[test]
  fn action_labels_parse_back() {
    for action in [
      HistoryAction::Created,
      HistoryAction::Updated,
      HistoryAction::Deleted,
      HistoryAction::PersonDeleted,
    ] {
      assert_eq!(HistoryAction::parse(action.as_str()), Some(action));
    }
    assert_eq!(HistoryAction::parse("moved"), None);
  }
}
