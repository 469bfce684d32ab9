//! Couple and sibling-group inference.
//!
//! Two persons form a couple when some child records them as its father and
//! mother. Children are grouped by couple, or by their only known parent.
//! The grouping drives link geometry only; it does not replace the forest
//! builder's parent/child determination.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::person::{Person, PersonId};

// ─── Keys ────────────────────────────────────────────────────────────────────

/// An inferred couple: the ordered pair `(pere, mere)`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Couple {
  pub pere_id: PersonId,
  pub mere_id: PersonId,
}

impl Couple {
  /// String key used when the index is exposed as a JSON object.
  pub fn key(&self) -> String { format!("{}_{}", self.pere_id, self.mere_id) }
}

/// The single recorded parent of a single-parent child.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(tag = "slot", content = "id", rename_all = "lowercase")]
pub enum ParentRef {
  Pere(PersonId),
  Mere(PersonId),
}

impl ParentRef {
  pub fn id(self) -> PersonId {
    match self {
      Self::Pere(id) | Self::Mere(id) => id,
    }
  }
}

/// Renders as `pere-<id>` or `mere-<id>`.
impl fmt::Display for ParentRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Pere(id) => write!(f, "pere-{id}"),
      Self::Mere(id) => write!(f, "mere-{id}"),
    }
  }
}

// ─── Index ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoupleIndex {
  /// Distinct couples in order of first appearance.
  pub couples:                Vec<Couple>,
  /// Children with both parents recorded, in input order.
  pub children_by_couple:     BTreeMap<Couple, Vec<Person>>,
  /// Children with exactly one parent recorded, in input order.
  pub single_parent_children: BTreeMap<ParentRef, Vec<Person>>,
}

impl CoupleIndex {
  pub fn children_of_couple(&self, couple: &Couple) -> &[Person] {
    self
      .children_by_couple
      .get(couple)
      .map(Vec::as_slice)
      .unwrap_or_default()
  }

  pub fn children_of_single(&self, parent: &ParentRef) -> &[Person] {
    self
      .single_parent_children
      .get(parent)
      .map(Vec::as_slice)
      .unwrap_or_default()
  }

  /// Whether `a` and `b` are an inferred couple, in either slot order.
  pub fn are_partners(&self, a: PersonId, b: PersonId) -> bool {
    self.couples.iter().any(|c| {
      (c.pere_id == a && c.mere_id == b) || (c.pere_id == b && c.mere_id == a)
    })
  }
}

/// Infer couples and group children for link rendering.
pub fn resolve(persons: &[Person]) -> CoupleIndex {
  let mut index = CoupleIndex::default();

  for person in persons {
    match (person.pere, person.mere) {
      (Some(pere_id), Some(mere_id)) => {
        let couple = Couple { pere_id, mere_id };
        let group = index.children_by_couple.entry(couple).or_default();
        if group.is_empty() {
          index.couples.push(couple);
        }
        group.push(person.clone());
      }
      (Some(pere_id), None) => index
        .single_parent_children
        .entry(ParentRef::Pere(pere_id))
        .or_default()
        .push(person.clone()),
      (None, Some(mere_id)) => index
        .single_parent_children
        .entry(ParentRef::Mere(mere_id))
        .or_default()
        .push(person.clone()),
      (None, None) => {}
    }
  }

  index
}
