//! The `RelationshipStore` trait.
//!
//! Implemented by storage backends (e.g. `souche-store-sqlite`). The engine
//! reads person snapshots and positions through it, and writes positions
//! and their history back.

use std::future::Future;

use crate::{
  person::{Person, PersonId},
  position::{ActorId, NewHistoryEntry, Position, PositionHistoryEntry, PositionWrite},
};

/// Backend errors must say whether a write was refused by a constraint, so
/// the recorder can retry history writes with a generic label.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn is_constraint_violation(&self) -> bool;
}

/// Role stored with an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  Administrator,
  Member,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Administrator => "administrator",
      Self::Member => "member",
    }
  }
}

/// Abstraction over the persistence collaborator.
///
/// History writes are append-only; no method updates or removes a
/// [`PositionHistoryEntry`].
pub trait RelationshipStore: Send + Sync {
  type Error: StoreError;

  // ── Persons ───────────────────────────────────────────────────────────

  /// Full snapshot of every person, in insertion order.
  fn list_persons(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  fn get_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Insert `person`, or replace the stored record with the same id.
  fn put_person(
    &self,
    person: Person,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove a person and its live position. Returns `false` if absent.
  /// History rows are kept.
  fn delete_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Positions ─────────────────────────────────────────────────────────

  fn get_position(
    &self,
    person_id: PersonId,
  ) -> impl Future<Output = Result<Option<Position>, Self::Error>> + Send + '_;

  fn list_positions(
    &self,
  ) -> impl Future<Output = Result<Vec<Position>, Self::Error>> + Send + '_;

  /// Write the live position; `updated_at` is set by the store. The
  /// existence check and the write are one atomic step, so of two racing
  /// first writes only one reports `created`.
  fn upsert_position(
    &self,
    person_id: PersonId,
    x: f64,
    y: f64,
  ) -> impl Future<Output = Result<PositionWrite, Self::Error>> + Send + '_;

  /// Returns `false` if there was no position to remove.
  fn delete_position(
    &self,
    person_id: PersonId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── History ───────────────────────────────────────────────────────────

  fn append_history(
    &self,
    entry: NewHistoryEntry,
  ) -> impl Future<Output = Result<PositionHistoryEntry, Self::Error>> + Send + '_;

  /// Timeline of one person, oldest first.
  fn list_history(
    &self,
    person_id: PersonId,
  ) -> impl Future<Output = Result<Vec<PositionHistoryEntry>, Self::Error>>
  + Send
  + '_;

  // ── Identities ────────────────────────────────────────────────────────

  /// Any one identity holding [`Role::Administrator`].
  fn find_one_administrator(
    &self,
  ) -> impl Future<Output = Result<Option<ActorId>, Self::Error>> + Send + '_;
}
