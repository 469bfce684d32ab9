//! Strict validation of person records.
//!
//! The forest builder tolerates malformed graphs. Callers that want to refuse
//! them instead run [`validate`] first and inspect the violations.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::person::{Genre, Person, PersonId};

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
  #[error("{person} is recorded as its own parent")]
  SelfParent { person: PersonId },

  #[error("{person} has the same id {parent} as father and mother")]
  SameParents { person: PersonId, parent: PersonId },

  #[error("{person} references unknown parent {parent}")]
  DanglingParent { person: PersonId, parent: PersonId },

  #[error("ancestor cycle through {members:?}")]
  AncestorCycle { members: Vec<PersonId> },

  #[error("father {parent} of {person} is not recorded as homme")]
  FatherNotHomme { person: PersonId, parent: PersonId },

  #[error("mother {parent} of {person} is not recorded as femme")]
  MotherNotFemme { person: PersonId, parent: PersonId },

  #[error("{person} died on {deces} before being born on {naissance}")]
  DeathBeforeBirth {
    person:    PersonId,
    naissance: NaiveDate,
    deces:     NaiveDate,
  },
}

/// Check every invariant the engine relies on but does not enforce.
/// Violations are reported per person in input order, cycles last.
pub fn validate(persons: &[Person]) -> Vec<Violation> {
  let by_id: HashMap<PersonId, &Person> =
    persons.iter().map(|p| (p.id, p)).collect();
  let mut violations = Vec::new();

  for person in persons {
    if person.has_parent(person.id) {
      violations.push(Violation::SelfParent { person: person.id });
    }
    if let (Some(pere), Some(mere)) = (person.pere, person.mere)
      && pere == mere
    {
      violations.push(Violation::SameParents { person: person.id, parent: pere });
    }

    for (parent, expected) in [(person.pere, Genre::Homme), (person.mere, Genre::Femme)] {
      let Some(parent) = parent else { continue };
      match by_id.get(&parent) {
        None => violations.push(Violation::DanglingParent { person: person.id, parent }),
        Some(p) if p.genre != expected => violations.push(match expected {
          Genre::Homme => Violation::FatherNotHomme { person: person.id, parent },
          Genre::Femme => Violation::MotherNotFemme { person: person.id, parent },
        }),
        Some(_) => {}
      }
    }

    if let (Some(naissance), Some(deces)) = (person.date_naissance, person.date_deces)
      && deces < naissance
    {
      violations.push(Violation::DeathBeforeBirth { person: person.id, naissance, deces });
    }
  }

  violations.extend(
    ancestor_cycles(persons, &by_id)
      .into_iter()
      .map(|members| Violation::AncestorCycle { members }),
  );
  violations
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
  InProgress,
  Done,
}

/// Cycles of length two or more along parent references, each reported once
/// starting from its smallest id. Self-parenting is reported separately.
fn ancestor_cycles(
  persons: &[Person],
  by_id: &HashMap<PersonId, &Person>,
) -> Vec<Vec<PersonId>> {
  let mut marks: HashMap<PersonId, Mark> = HashMap::new();
  let mut seen: HashSet<Vec<PersonId>> = HashSet::new();
  let mut cycles = Vec::new();

  for person in persons {
    if marks.contains_key(&person.id) {
      continue;
    }
    // Iterative DFS; each frame is a node and its remaining parents.
    let mut path: Vec<PersonId> = vec![person.id];
    let mut stack: Vec<Vec<PersonId>> = vec![parents(person)];
    marks.insert(person.id, Mark::InProgress);

    while let Some(pending) = stack.last_mut() {
      let Some(next) = pending.pop() else {
        stack.pop();
        if let Some(done) = path.pop() {
          marks.insert(done, Mark::Done);
        }
        continue;
      };
      let Some(next_person) = by_id.get(&next) else { continue };
      match marks.get(&next) {
        Some(Mark::InProgress) => {
          let start = path.iter().position(|id| *id == next).unwrap_or(0);
          let mut cycle = path[start..].to_vec();
          if cycle.len() > 1 {
            let min = cycle.iter().enumerate().min_by_key(|(_, id)| **id).map_or(0, |(i, _)| i);
            cycle.rotate_left(min);
            if seen.insert(cycle.clone()) {
              cycles.push(cycle);
            }
          }
        }
        Some(Mark::Done) => {}
        None => {
          marks.insert(next, Mark::InProgress);
          path.push(next);
          stack.push(parents(next_person));
        }
      }
    }
  }

  cycles
}

fn parents(person: &Person) -> Vec<PersonId> {
  let mut ids: Vec<PersonId> = person.pere.into_iter().chain(person.mere).collect();
  ids.dedup();
  ids
}
