//! JSON REST API for Souche.
//!
//! Exposes an axum [`Router`] backed by any
//! [`souche_core::store::RelationshipStore`]. Identity verification and TLS
//! are the caller's responsibility; whether callers may edit is decided up
//! front and handed in as an [`EditCapability`].
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", souche_api::api_router(state))
//! ```

pub mod error;
pub mod graph;
pub mod persons;
pub mod positions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, put},
};
use souche_core::{
  gesture::EditCapability, layout::LayoutConfig, recorder::PositionRecorder,
  store::RelationshipStore,
};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:      Arc<S>,
  pub recorder:   PositionRecorder<S>,
  pub capability: EditCapability,
  pub layout:     LayoutConfig,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      recorder:   self.recorder.clone(),
      capability: self.capability,
      layout:     self.layout,
    }
  }
}

impl<S> ApiState<S> {
  fn require_edit(&self) -> Result<(), ApiError> {
    if self.capability.can_edit() { Ok(()) } else { Err(ApiError::ReadOnly) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: RelationshipStore + 'static,
{
  Router::new()
    // Persons
    .route("/persons", get(persons::list::<S>).post(persons::put::<S>))
    .route(
      "/persons/{id}",
      get(persons::get_one::<S>).delete(persons::delete_one::<S>),
    )
    // Derived views
    .route("/forest", get(graph::forest::<S>))
    .route("/couples", get(graph::couples::<S>))
    .route("/layout", get(graph::layout::<S>))
    .route("/validation", get(graph::validation::<S>))
    // Positions
    .route("/positions/{id}", put(positions::commit::<S>))
    .route("/positions/{id}/history", get(positions::history::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
