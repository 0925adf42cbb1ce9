//! Payment route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use fernhill_core::{OrderId, ServiceSlug};

use crate::booking::{BookingFlow, BookingStep};
use crate::error::{AppError, Result};
use crate::orders::EnsureDraftOrder;
use crate::payment::session::start_payment;
use crate::payment::PaymentHandshake;
use crate::platform::PaymentOutcome;
use crate::state::AppState;
use crate::store::keys;

use super::{load_cart, require_profile, session_store};

/// Negotiate a gateway session for the slug's draft order.
///
/// Ensures the draft order is in sync with the cart first, so the charged
/// amount always matches what the customer sees.
#[instrument(skip(state, session))]
pub async fn session(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<ServiceSlug>,
) -> Result<Json<PaymentHandshake>> {
    let store = session_store(&state, &session).await;
    let user = require_profile(&store)?;

    let service = state.platform().get_service(&slug).await?;
    let request = EnsureDraftOrder {
        slug: slug.clone(),
        user,
        service_id: service.id,
        cart: load_cart(&state, &store, &slug),
        appointment: store.get_json(&keys::appointment(&slug)),
        questionnaire: store.get_json(&keys::questionnaire(&slug)),
    };
    let order_id = state.orders().ensure_draft_order(&store, request).await?;

    let order = state.platform().get_order(&order_id).await?;
    let handshake = start_payment(
        state.platform(),
        &order,
        &state.config().payment.public_key,
    )
    .await?;

    Ok(Json(handshake))
}

/// Gateway outcome form. Covers both the real gateway callback and the
/// test-success path, which posts `Approved` directly.
#[derive(Debug, Deserialize)]
pub struct ConfirmForm {
    pub outcome: PaymentOutcome,
}

/// Confirmation response.
#[derive(Debug, Serialize)]
pub struct ConfirmView {
    pub step: BookingStep,
    pub order_id: OrderId,
}

/// Handle a terminal gateway outcome.
#[instrument(skip(state, session, form))]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<ServiceSlug>,
    Json(form): Json<ConfirmForm>,
) -> Result<Json<ConfirmView>> {
    let store = session_store(&state, &session).await;

    let order_id = store
        .get(&keys::finalized(&slug))
        .or_else(|| store.get(&keys::order_id(&slug)))
        .map(OrderId::new)
        .ok_or_else(|| AppError::BadRequest("no draft order for this booking".to_string()))?;

    let mut flow = BookingFlow::restore(&store, slug, store.is_authenticated());
    let step = state
        .payments()
        .confirm(&store, &mut flow, &order_id, form.outcome)
        .await?;

    Ok(Json(ConfirmView { step, order_id }))
}
