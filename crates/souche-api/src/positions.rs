//! Handlers for `/positions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `PUT`  | `/positions/:id` | Body: [`CommitBody`]; commits the end of a drag |
//! | `GET`  | `/positions/:id/history` | Oldest entry first |

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Deserialize;
use souche_core::{
  person::PersonId,
  position::{ActorId, Point, Position, PositionHistoryEntry},
  store::RelationshipStore,
};

use crate::{ApiState, error::ApiError};

// ─── Commit ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /positions/:id`.
#[derive(Debug, Deserialize)]
pub struct CommitBody {
  pub x:        f64,
  pub y:        f64,
  /// Identity performing the drag, as established by the caller.
  pub actor_id: Option<ActorId>,
}

/// `PUT /positions/:id` — the first commit for a person is recorded as
/// `created`, later ones as `updated`.
///
/// The response is the stored position. A store failure answers 500 so the
/// client can put the node back where it was.
pub async fn commit<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<PersonId>,
  Json(body): Json<CommitBody>,
) -> Result<Json<Position>, ApiError>
where
  S: RelationshipStore + 'static,
{
  state.require_edit()?;
  if !body.x.is_finite() || !body.y.is_finite() {
    return Err(ApiError::BadRequest("coordinates must be finite".into()));
  }
  if state.store.get_person(id).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound(format!("person {id} not found")));
  }

  let position = state
    .recorder
    .commit_move(id, Point::new(body.x, body.y), body.actor_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(position))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /positions/:id/history`
pub async fn history<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<PersonId>,
) -> Result<Json<Vec<PositionHistoryEntry>>, ApiError>
where
  S: RelationshipStore + 'static,
{
  let entries = state.store.list_history(id).await.map_err(ApiError::store)?;
  Ok(Json(entries))
}
