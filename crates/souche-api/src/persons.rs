//! Handlers for `/persons` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/persons` | Full snapshot |
//! | `POST`   | `/persons` | Body: [`Person`]; inserts or replaces, returns 201 |
//! | `GET`    | `/persons/:id` | 404 if not found |
//! | `DELETE` | `/persons/:id` | Optional `?actor_id=`; records the deletion in the position history |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use souche_core::{
  person::{Person, PersonId},
  position::{ActorId, HistoryAction},
  store::RelationshipStore,
};

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /persons`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Person>>, ApiError>
where
  S: RelationshipStore + 'static,
{
  let persons = state.store.list_persons().await.map_err(ApiError::store)?;
  Ok(Json(persons))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /persons/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<PersonId>,
) -> Result<Json<Person>, ApiError>
where
  S: RelationshipStore + 'static,
{
  let person = state
    .store
    .get_person(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(Json(person))
}

// ─── Put ──────────────────────────────────────────────────────────────────────

/// `POST /persons` — body is the full [`Person`] record.
pub async fn put<S>(
  State(state): State<ApiState<S>>,
  Json(person): Json<Person>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RelationshipStore + 'static,
{
  state.require_edit()?;
  if person.ordre_naissance == 0 {
    return Err(ApiError::BadRequest("ordre_naissance must be positive".into()));
  }
  state
    .store
    .put_person(person.clone())
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(person)))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
  pub actor_id: Option<ActorId>,
}

/// `DELETE /persons/:id[?actor_id=...]`
///
/// The person goes first, taking its live position with it. Only then is the
/// last known position (or the origin, if the person was never placed)
/// recorded with the `person_deleted` action, so a failed delete leaves both
/// the position and the history untouched.
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<PersonId>,
  Query(params): Query<DeleteParams>,
) -> Result<StatusCode, ApiError>
where
  S: RelationshipStore + 'static,
{
  state.require_edit()?;
  let last = state
    .store
    .get_position(id)
    .await
    .map_err(ApiError::store)?
    .map(|p| p.point())
    .unwrap_or_default();

  if !state.store.delete_person(id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound(format!("person {id} not found")));
  }

  state
    .recorder
    .commit(id, last, params.actor_id, HistoryAction::PersonDeleted)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(person = %id, "person deleted");
  Ok(StatusCode::NO_CONTENT)
}
