//! Forest builder: flat person records → ordered list of root trees.
//!
//! Roots are the persons with no recorded parent. A node's children are all
//! persons naming it as `pere` or `mere`, so a child whose two parents are
//! both roots appears once under each of them.
//!
//! Malformed data is tolerated: dangling parent references never match a
//! node, and cycles are cut by a visited set that lives for one root's
//! traversal. Inside a root tree every person therefore appears once, at the
//! first place the depth-first walk reaches it.

use std::{
  cmp::Ordering,
  collections::{HashMap, HashSet},
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::person::{Genre, Person, PersonId};

// ─── TreeNode ────────────────────────────────────────────────────────────────

/// A render-ready node. Rebuilt from scratch on every [`build`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
  pub id:             PersonId,
  /// `prenom` followed by `nom`.
  pub name:           String,
  pub genre:          Genre,
  pub description:    String,
  pub date_naissance: Option<NaiveDate>,
  pub date_deces:     Option<NaiveDate>,
  pub image:          Option<String>,
  /// `None` for a leaf; never an empty vector.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub children:       Option<Vec<TreeNode>>,
}

impl TreeNode {
  fn from_person(person: &Person, children: Vec<TreeNode>) -> Self {
    Self {
      id:             person.id,
      name:           person.display_name(),
      genre:          person.genre,
      description:    person.life_span(),
      date_naissance: person.date_naissance,
      date_deces:     person.date_deces,
      image:          person.image.clone(),
      children:       (!children.is_empty()).then_some(children),
    }
  }

  pub fn children(&self) -> &[TreeNode] {
    self.children.as_deref().unwrap_or_default()
  }

  /// Depth-first pre-order walk yielding `(depth, node)`, the root at 0.
  pub fn walk(&self) -> Vec<(usize, &TreeNode)> {
    let mut out = Vec::new();
    let mut stack = vec![(0, self)];
    while let Some((depth, node)) = stack.pop() {
      out.push((depth, node));
      for child in node.children().iter().rev() {
        stack.push((depth + 1, child));
      }
    }
    out
  }
}

// ─── Sibling order ───────────────────────────────────────────────────────────

/// Birth order first, then birth date (unknown sorts earliest), then id so
/// that rendering is stable across runs.
pub fn sibling_order(a: &Person, b: &Person) -> Ordering {
  a.ordre_naissance
    .cmp(&b.ordre_naissance)
    .then_with(|| a.date_naissance.cmp(&b.date_naissance))
    .then_with(|| a.id.cmp(&b.id))
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Children of every referenced parent id, already in sibling order.
struct ChildIndex<'a> {
  by_parent: HashMap<PersonId, Vec<&'a Person>>,
}

impl<'a> ChildIndex<'a> {
  fn new(persons: &'a [Person]) -> Self {
    let mut by_parent: HashMap<PersonId, Vec<&'a Person>> = HashMap::new();
    for person in persons {
      if let Some(pere) = person.pere {
        by_parent.entry(pere).or_default().push(person);
      }
      // A person naming the same id twice is still one child of it.
      if let Some(mere) = person.mere.filter(|m| Some(*m) != person.pere) {
        by_parent.entry(mere).or_default().push(person);
      }
    }
    for children in by_parent.values_mut() {
      children.sort_by(|a, b| sibling_order(a, b));
    }
    Self { by_parent }
  }

  fn children_of(&self, id: PersonId) -> &[&'a Person] {
    self.by_parent.get(&id).map(Vec::as_slice).unwrap_or_default()
  }

  /// Expand `person` unless this root's traversal already entered it.
  /// `visited` is marked on entry and shared by the whole root tree.
  fn expand(
    &self,
    person: &Person,
    visited: &mut HashSet<PersonId>,
  ) -> Option<TreeNode> {
    if !visited.insert(person.id) {
      tracing::debug!(person = %person.id, "already visited under this root, branch truncated");
      return None;
    }

    let children = self
      .children_of(person.id)
      .iter()
      .filter_map(|child| self.expand(child, visited))
      .collect();

    Some(TreeNode::from_person(person, children))
  }
}

/// Build the forest for `persons`.
///
/// Roots keep the input order of the persons with no recorded parent. Each
/// root starts from a fresh visited set; nothing is shared between root
/// builds.
pub fn build(persons: &[Person]) -> Vec<TreeNode> {
  let index = ChildIndex::new(persons);
  persons
    .iter()
    .filter(|p| p.is_root())
    .filter_map(|root| index.expand(root, &mut HashSet::new()))
    .collect()
}
