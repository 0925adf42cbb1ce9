//! Account route handlers.

use axum::{Json, extract::State};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::platform::Order;
use crate::state::AppState;
use crate::store::keys;

use super::session_store;

/// Order history for the logged-in customer.
#[instrument(skip(state, session))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Order>>> {
    let store = session_store(&state, &session).await;
    let token = store
        .get(keys::AUTH_TOKEN)
        .ok_or_else(|| AppError::Unauthorized("not logged in".to_string()))?;

    Ok(Json(state.platform().get_my_orders(&token).await?))
}
