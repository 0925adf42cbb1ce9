//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use fernhill_core::ServiceSlug;

use crate::error::Result;
use crate::platform::{Medicine, Service};
use crate::state::AppState;

/// List all bookable services.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Service>>> {
    Ok(Json(state.platform().get_services().await?))
}

/// Show one service.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<ServiceSlug>,
) -> Result<Json<Service>> {
    Ok(Json(state.platform().get_service(&slug).await?))
}

/// List the treatments sold under a service.
#[instrument(skip(state))]
pub async fn medicines(
    State(state): State<AppState>,
    Path(slug): Path<ServiceSlug>,
) -> Result<Json<Vec<Medicine>>> {
    Ok(Json(state.platform().get_medicines(&slug).await?))
}
