//! Read-only views of the family graph, recomputed on every request.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/forest` | Root trees |
//! | `GET`  | `/couples` | Couples and children groups, keyed by string |
//! | `GET`  | `/layout` | Node placements and link segments |
//! | `GET`  | `/validation` | Invariant violations in the stored records |

use std::collections::{BTreeMap, HashMap};

use axum::{Json, extract::State};
use serde::Serialize;
use souche_core::{
  couples::{Couple, CoupleIndex, resolve},
  forest::{TreeNode, build},
  layout::{self, Link, Placement},
  person::Person,
  store::RelationshipStore,
  validate::{Violation, validate},
};

use crate::{ApiState, error::ApiError};

async fn snapshot<S>(state: &ApiState<S>) -> Result<Vec<Person>, ApiError>
where
  S: RelationshipStore + 'static,
{
  state.store.list_persons().await.map_err(ApiError::store)
}

// ─── Forest ───────────────────────────────────────────────────────────────────

/// `GET /forest`
pub async fn forest<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<TreeNode>>, ApiError>
where
  S: RelationshipStore + 'static,
{
  Ok(Json(build(&snapshot(&state).await?)))
}

// ─── Couples ──────────────────────────────────────────────────────────────────

/// [`CoupleIndex`] with its map keys rendered as strings:
/// `<pere>_<mere>` for couples, `pere-<id>` / `mere-<id>` for single parents.
#[derive(Debug, Serialize)]
pub struct CouplesResponse {
  pub couples:                Vec<Couple>,
  pub children_by_couple:     BTreeMap<String, Vec<Person>>,
  pub single_parent_children: BTreeMap<String, Vec<Person>>,
}

impl From<CoupleIndex> for CouplesResponse {
  fn from(index: CoupleIndex) -> Self {
    Self {
      couples:                index.couples,
      children_by_couple:     index
        .children_by_couple
        .into_iter()
        .map(|(couple, children)| (couple.key(), children))
        .collect(),
      single_parent_children: index
        .single_parent_children
        .into_iter()
        .map(|(parent, children)| (parent.to_string(), children))
        .collect(),
    }
  }
}

/// `GET /couples`
pub async fn couples<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<CouplesResponse>, ApiError>
where
  S: RelationshipStore + 'static,
{
  Ok(Json(resolve(&snapshot(&state).await?).into()))
}

// ─── Layout ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LayoutResponse {
  pub placements: Vec<Placement>,
  pub links:      Vec<Link>,
}

/// `GET /layout`
pub async fn layout<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<LayoutResponse>, ApiError>
where
  S: RelationshipStore + 'static,
{
  let persons = snapshot(&state).await?;
  // Positions read here may be overwritten by a concurrent commit; the
  // next request picks the new value up.
  let saved: HashMap<_, _> = state
    .store
    .list_positions()
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .map(|p| (p.person_id, p.point()))
    .collect();

  let placements = layout::place(&build(&persons), &saved, &state.layout);
  let links = layout::links(
    &resolve(&persons),
    &layout::point_map(&placements),
    &state.layout,
  );
  Ok(Json(LayoutResponse { placements, links }))
}

// ─── Validation ───────────────────────────────────────────────────────────────

/// `GET /validation`
pub async fn validation<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Violation>>, ApiError>
where
  S: RelationshipStore + 'static,
{
  Ok(Json(validate(&snapshot(&state).await?)))
}
