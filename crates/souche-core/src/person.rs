//! Person records — the nodes of the genealogy graph.
//!
//! A person points at most to one father (`pere`) and one mother (`mere`).
//! Everything else the engine knows (trees, couples, sibling groups) is
//! derived from those two references on every build.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a [`Person`]; immutable once assigned.
pub type PersonId = Uuid;

// ─── Genre ───────────────────────────────────────────────────────────────────

/// Recorded gender. Constrains the parent slot a person may occupy: the
/// father slot requires [`Genre::Homme`], the mother slot [`Genre::Femme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
  Homme,
  Femme,
}

// ─── Person ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:              PersonId,
  pub nom:             String,
  pub prenom:          String,
  pub genre:           Genre,
  /// Father, if recorded.
  pub pere:            Option<PersonId>,
  /// Mother, if recorded.
  pub mere:            Option<PersonId>,
  /// Birth-order rank among siblings, starting at 1.
  pub ordre_naissance: u32,
  pub date_naissance:  Option<NaiveDate>,
  pub date_deces:      Option<NaiveDate>,
  /// Opaque image reference (usually a URL); never interpreted here.
  pub image:           Option<String>,
}

impl Person {
  /// Convenience constructor for a living person with no recorded parents.
  pub fn new(
    id: PersonId,
    prenom: impl Into<String>,
    nom: impl Into<String>,
    genre: Genre,
  ) -> Self {
    Self {
      id,
      nom: nom.into(),
      prenom: prenom.into(),
      genre,
      pere: None,
      mere: None,
      ordre_naissance: 1,
      date_naissance: None,
      date_deces: None,
      image: None,
    }
  }

  /// Display name, `prenom` followed by `nom`.
  pub fn display_name(&self) -> String {
    match (self.prenom.is_empty(), self.nom.is_empty()) {
      (false, false) => format!("{} {}", self.prenom, self.nom),
      (false, true) => self.prenom.clone(),
      _ => self.nom.clone(),
    }
  }

  /// A root has neither parent recorded.
  pub fn is_root(&self) -> bool { self.pere.is_none() && self.mere.is_none() }

  pub fn is_deceased(&self) -> bool { self.date_deces.is_some() }

  /// Whether `id` is recorded as this person's father or mother.
  pub fn has_parent(&self, id: PersonId) -> bool {
    self.pere == Some(id) || self.mere == Some(id)
  }

  /// Life span rendered for the tree description: the birth date alone, or
  /// `birth - death`. Empty when no date is known.
  pub fn life_span(&self) -> String {
    match (self.date_naissance, self.date_deces) {
      (Some(b), Some(d)) => format!("{b} - {d}"),
      (Some(b), None) => b.to_string(),
      (None, Some(d)) => format!("? - {d}"),
      (None, None) => String::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_name_joins_prenom_and_nom() {
    let p = Person::new(Uuid::from_u128(1), "Jeanne", "Martin", Genre::Femme);
    assert_eq!(p.display_name(), "Jeanne Martin");

    let only_nom = Person::new(Uuid::from_u128(2), "", "Martin", Genre::Homme);
    assert_eq!(only_nom.display_name(), "Martin");
  }

  #[test]
  fn life_span_formats() {
    let mut p = Person::new(Uuid::from_u128(1), "Paul", "Durand", Genre::Homme);
    assert_eq!(p.life_span(), "");

    p.date_naissance = NaiveDate::from_ymd_opt(1920, 3, 4);
    assert_eq!(p.life_span(), "1920-03-04");

    p.date_deces = NaiveDate::from_ymd_opt(1999, 12, 31);
    assert_eq!(p.life_span(), "1920-03-04 - 1999-12-31");
    assert!(p.is_deceased());
  }

  #[test]
  fn genre_serialises_lowercase() {
    assert_eq!(serde_json::to_string(&Genre::Femme).unwrap(), "\"femme\"");
  }
}
