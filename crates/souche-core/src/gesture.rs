//! Per-node pointer gesture classification: click or drag.
//!
//! ```text
//! Idle ──down──▶ Pressed ──move past threshold──▶ Dragging
//!                   │                                 │
//!                   └──up──▶ click          up ──▶ drag end
//! ```
//!
//! A gesture released with `pointer_up` ends in exactly one of
//! [`GestureEvent::NodeSelected`] or [`GestureEvent::DragEnded`]. A
//! cancelled gesture ends in neither.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::{forest::TreeNode, person::PersonId, position::Point};

/// Displacement, in either axis, beyond which a press becomes a drag.
pub const DRAG_THRESHOLD: f64 = 5.0;

// ─── Authorisation context ───────────────────────────────────────────────────

/// What the current caller may do with the rendered forest. Decided by the
/// surrounding application; the engine only honours it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditCapability {
  #[default]
  ReadOnly,
  Edit,
}

impl EditCapability {
  pub fn from_flag(can_edit: bool) -> Self {
    if can_edit { Self::Edit } else { Self::ReadOnly }
  }

  pub fn can_edit(self) -> bool { matches!(self, Self::Edit) }
}

// ─── Pointer input ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
  Mouse,
  Touch,
  Pen,
}

impl PointerKind {
  /// Only mouse and touch pointers may start a drag.
  pub fn can_drag(self) -> bool { matches!(self, Self::Mouse | Self::Touch) }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
  pub kind: PointerKind,
  pub at:   Point,
}

impl Pointer {
  pub fn mouse(x: f64, y: f64) -> Self {
    Self { kind: PointerKind::Mouse, at: Point::new(x, y) }
  }

  pub fn touch(x: f64, y: f64) -> Self {
    Self { kind: PointerKind::Touch, at: Point::new(x, y) }
  }

  pub fn pen(x: f64, y: f64) -> Self {
    Self { kind: PointerKind::Pen, at: Point::new(x, y) }
  }
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
  /// The gesture was a click.
  NodeSelected { node: TreeNode, held_for: Duration },
  /// First move past the threshold. `origin` is the node's pre-drag position.
  DragStarted { node_id: PersonId, origin: Point, position: Point },
  /// A further move while dragging; `position` is absolute.
  DragMoved { node_id: PersonId, position: Point },
  /// Pointer released after a drag. The caller commits `position`.
  DragEnded { node_id: PersonId, origin: Point, position: Point },
}

// ─── State machine ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
  Idle,
  Pressed { start: Point, kind: PointerKind, since: Instant },
  Dragging { start: Point, position: Point },
}

/// Gesture tracker for one rendered node.
#[derive(Debug, Clone)]
pub struct NodeGesture {
  node:       TreeNode,
  origin:     Point,
  capability: EditCapability,
  state:      GestureState,
}

impl NodeGesture {
  /// `origin` is where the node is currently drawn.
  pub fn new(node: TreeNode, origin: Point, capability: EditCapability) -> Self {
    Self { node, origin, capability, state: GestureState::Idle }
  }

  pub fn state(&self) -> GestureState { self.state }

  pub fn node_id(&self) -> PersonId { self.node.id }

  /// Where the node should be drawn right now.
  pub fn current_position(&self) -> Point {
    match self.state {
      GestureState::Dragging { position, .. } => position,
      _ => self.origin,
    }
  }

  /// Record the press. A press arriving mid-gesture restarts it.
  pub fn pointer_down(&mut self, pointer: Pointer) {
    self.state = GestureState::Pressed {
      start: pointer.at,
      kind:  pointer.kind,
      since: Instant::now(),
    };
  }

  pub fn pointer_move(&mut self, pointer: Pointer) -> Option<GestureEvent> {
    match self.state {
      GestureState::Idle => None,
      GestureState::Pressed { start, kind, .. } => {
        let dx = pointer.at.x - start.x;
        let dy = pointer.at.y - start.y;
        if dx.abs() <= DRAG_THRESHOLD && dy.abs() <= DRAG_THRESHOLD {
          return None;
        }
        if !self.capability.can_edit() || !kind.can_drag() {
          return None;
        }
        let position = self.origin.offset(dx, dy);
        self.state = GestureState::Dragging { start, position };
        Some(GestureEvent::DragStarted {
          node_id: self.node.id,
          origin: self.origin,
          position,
        })
      }
      GestureState::Dragging { start, .. } => {
        let position =
          self.origin.offset(pointer.at.x - start.x, pointer.at.y - start.y);
        self.state = GestureState::Dragging { start, position };
        Some(GestureEvent::DragMoved { node_id: self.node.id, position })
      }
    }
  }

  pub fn pointer_up(&mut self) -> Option<GestureEvent> {
    let event = match self.state {
      GestureState::Idle => None,
      GestureState::Pressed { since, .. } => Some(GestureEvent::NodeSelected {
        node:     self.node.clone(),
        held_for: since.elapsed(),
      }),
      GestureState::Dragging { position, .. } => {
        let origin = self.origin;
        self.origin = position;
        Some(GestureEvent::DragEnded { node_id: self.node.id, origin, position })
      }
    };
    self.state = GestureState::Idle;
    event
  }

  /// Abandon the gesture. An in-progress drag is discarded and the node goes
  /// back to its pre-drag position.
  pub fn pointer_cancel(&mut self) { self.state = GestureState::Idle; }

  /// Revert the node to `origin`, e.g. after a failed commit.
  pub fn reset_origin(&mut self, origin: Point) {
    self.origin = origin;
    self.state = GestureState::Idle;
  }
}
