//! Layout engine and link geometry.
//!
//! Nodes already placed by a user keep their persisted position. Every other
//! node gets a default derived from the tree: generation depth gives `y`,
//! sibling order gives `x`, and a parent is centred above its children.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
  couples::CoupleIndex,
  forest::TreeNode,
  person::{Person, PersonId},
  position::Point,
};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
  /// Horizontal distance between two adjacent leaf slots.
  pub node_spacing:    f64,
  /// Vertical distance between two generations.
  pub level_height:    f64,
  /// How far below a couple its children's edges converge.
  pub midpoint_offset: f64,
}

impl Default for LayoutConfig {
  fn default() -> Self {
    Self { node_spacing: 180.0, level_height: 140.0, midpoint_offset: 60.0 }
  }
}

// ─── Placement ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
  pub person_id: PersonId,
  pub point:     Point,
  /// `true` when the point comes from a stored position.
  pub persisted: bool,
}

struct Placer<'a> {
  config:   &'a LayoutConfig,
  /// Next free leaf slot, shared by all roots so trees sit side by side.
  cursor:   f64,
  computed: HashMap<PersonId, Point>,
  order:    Vec<PersonId>,
}

impl Placer<'_> {
  /// Returns the x of `node`, or `None` if it was already placed under an
  /// earlier root.
  fn assign(&mut self, node: &TreeNode, depth: usize) -> Option<f64> {
    if self.computed.contains_key(&node.id) {
      return None;
    }
    self.order.push(node.id);

    // Only children placed by this visit pull the parent towards them.
    let xs: Vec<f64> = node
      .children()
      .iter()
      .filter_map(|child| self.assign(child, depth + 1))
      .collect();

    let x = match (xs.first(), xs.last()) {
      (Some(first), Some(last)) => (first + last) / 2.0,
      _ => {
        let x = self.cursor * self.config.node_spacing;
        self.cursor += 1.0;
        x
      }
    };
    let y = depth as f64 * self.config.level_height;
    self.computed.insert(node.id, Point::new(x, y));
    Some(x)
  }
}

/// Place every node of `forest`, preferring the `saved` position of a node
/// over the computed default. Output follows depth-first order of first
/// appearance.
pub fn place(
  forest: &[TreeNode],
  saved: &HashMap<PersonId, Point>,
  config: &LayoutConfig,
) -> Vec<Placement> {
  let mut placer = Placer {
    config,
    cursor: 0.0,
    computed: HashMap::new(),
    order: Vec::new(),
  };
  for root in forest {
    placer.assign(root, 0);
  }

  placer
    .order
    .iter()
    .map(|id| match saved.get(id) {
      Some(point) => Placement { person_id: *id, point: *point, persisted: true },
      None => Placement {
        person_id: *id,
        point:     placer.computed[id],
        persisted: false,
      },
    })
    .collect()
}

/// Index placements by person for link geometry.
pub fn point_map(placements: &[Placement]) -> HashMap<PersonId, Point> {
  placements.iter().map(|p| (p.person_id, p.point)).collect()
}

// ─── Links ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
  /// Between the two partners of a couple.
  Couple,
  /// Straight from a parent to one child.
  ParentToChild,
  /// From a parent to the convergence point of several shared children.
  ParentToMidpoint,
  /// Trunk from the convergence point to one child.
  MidpointToChild,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stroke {
  Solid,
  Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Link {
  pub kind:   LinkKind,
  pub from:   Point,
  pub to:     Point,
  pub stroke: Stroke,
}

fn child_stroke(child: &Person) -> Stroke {
  if child.is_deceased() { Stroke::Dashed } else { Stroke::Solid }
}

fn direct_edges(
  links: &mut Vec<Link>,
  parent: Point,
  children: &[Person],
  positions: &HashMap<PersonId, Point>,
) {
  for child in children {
    if let Some(to) = positions.get(&child.id) {
      links.push(Link {
        kind: LinkKind::ParentToChild,
        from: parent,
        to: *to,
        stroke: child_stroke(child),
      });
    }
  }
}

/// Compute the segments connecting couples and their children.
///
/// Persons without a position (not rendered) contribute no segment. A couple
/// with a single shared child gets one edge from each parent; with several
/// children both parents converge on a synthetic midpoint from which one
/// trunk runs to each child.
pub fn links(
  index: &CoupleIndex,
  positions: &HashMap<PersonId, Point>,
  config: &LayoutConfig,
) -> Vec<Link> {
  let mut links = Vec::new();

  for couple in &index.couples {
    let children = index.children_of_couple(couple);
    let pere = positions.get(&couple.pere_id).copied();
    let mere = positions.get(&couple.mere_id).copied();

    let (pere, mere) = match (pere, mere) {
      (Some(pere), Some(mere)) => (pere, mere),
      (Some(only), None) | (None, Some(only)) => {
        direct_edges(&mut links, only, children, positions);
        continue;
      }
      (None, None) => continue,
    };

    links.push(Link {
      kind:   LinkKind::Couple,
      from:   pere,
      to:     mere,
      stroke: Stroke::Dashed,
    });

    let placed: Vec<(&Person, Point)> = children
      .iter()
      .filter_map(|c| positions.get(&c.id).map(|p| (c, *p)))
      .collect();

    match placed.as_slice() {
      [] => {}
      [(child, to)] => {
        for from in [pere, mere] {
          links.push(Link {
            kind: LinkKind::ParentToChild,
            from,
            to: *to,
            stroke: child_stroke(child),
          });
        }
      }
      many => {
        let midpoint = pere.midpoint(mere).offset(0.0, config.midpoint_offset);
        for from in [pere, mere] {
          links.push(Link {
            kind:   LinkKind::ParentToMidpoint,
            from,
            to:     midpoint,
            stroke: Stroke::Solid,
          });
        }
        for (child, to) in many {
          links.push(Link {
            kind:   LinkKind::MidpointToChild,
            from:   midpoint,
            to:     *to,
            stroke: child_stroke(child),
          });
        }
      }
    }
  }

  for (parent, children) in &index.single_parent_children {
    if let Some(from) = positions.get(&parent.id()) {
      direct_edges(&mut links, *from, children, positions);
    }
  }

  links
}
