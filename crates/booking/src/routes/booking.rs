//! Booking wizard route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use fernhill_core::{OrderId, ServiceSlug};

use crate::booking::{BookingFlow, BookingStep, StepContext};
use crate::error::Result;
use crate::orders::{AppointmentWindow, EnsureDraftOrder};
use crate::platform::QuestionnaireAnswers;
use crate::schedule::{DaySlots, slots_for_date};
use crate::state::AppState;
use crate::store::{BookingStore, keys};

use super::{load_cart, require_profile, session_store};

/// Wizard position display data.
#[derive(Debug, Serialize)]
pub struct FlowView {
    pub current: BookingStep,
    pub steps: Vec<BookingStep>,
    pub cart_count: u32,
    pub finalized: bool,
}

impl FlowView {
    fn new(state: &AppState, store: &BookingStore, slug: &ServiceSlug, flow: &BookingFlow) -> Self {
        Self {
            current: flow.current(),
            steps: flow.sequence().steps().to_vec(),
            cart_count: load_cart(state, store, slug).item_count(),
            finalized: store.get(&keys::finalized(slug)).is_some(),
        }
    }
}

fn step_context(state: &AppState, store: &BookingStore, slug: &ServiceSlug) -> StepContext {
    StepContext {
        cart_empty: load_cart(state, store, slug).is_empty(),
        authenticated: store.is_authenticated(),
    }
}

/// Show the wizard position for a service.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<ServiceSlug>,
) -> Result<Json<FlowView>> {
    let store = session_store(&state, &session).await;
    let flow = BookingFlow::restore(&store, slug.clone(), store.is_authenticated());
    Ok(Json(FlowView::new(&state, &store, &slug, &flow)))
}

/// Advance the wizard. Guards may block the transition with a 422.
#[instrument(skip(state, session))]
pub async fn next(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<ServiceSlug>,
) -> Result<Json<FlowView>> {
    let store = session_store(&state, &session).await;
    let mut flow = BookingFlow::restore(&store, slug.clone(), store.is_authenticated());
    flow.advance(&store, step_context(&state, &store, &slug))?;
    Ok(Json(FlowView::new(&state, &store, &slug, &flow)))
}

/// Step back. Always allowed while not on the first step.
#[instrument(skip(state, session))]
pub async fn back(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<ServiceSlug>,
) -> Result<Json<FlowView>> {
    let store = session_store(&state, &session).await;
    let mut flow = BookingFlow::restore(&store, slug.clone(), store.is_authenticated());
    flow.back(&store);
    Ok(Json(FlowView::new(&state, &store, &slug, &flow)))
}

/// Save questionnaire answers for the slug.
#[instrument(skip(state, session, answers))]
pub async fn questionnaire(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<ServiceSlug>,
    Json(answers): Json<QuestionnaireAnswers>,
) -> Result<StatusCode> {
    let store = session_store(&state, &session).await;
    store.put_json(&keys::questionnaire(&slug), &answers);
    Ok(StatusCode::NO_CONTENT)
}

/// Slot listing query.
#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

/// List the bookable slots for a date.
#[instrument(skip(state))]
pub async fn slots(
    State(state): State<AppState>,
    Path(slug): Path<ServiceSlug>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<DaySlots>> {
    let schedule = state.platform().get_schedule(&slug).await?;
    Ok(Json(slots_for_date(&schedule, query.date, Utc::now(), None)))
}

/// Appointment selection form.
#[derive(Debug, Deserialize)]
pub struct AppointmentForm {
    pub start_time: DateTime<Utc>,
}

/// Selected appointment display data.
#[derive(Debug, Serialize)]
pub struct AppointmentView {
    pub order_id: OrderId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Select a slot and sync the draft order with the appointment window.
#[instrument(skip(state, session, form))]
pub async fn appointment(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<ServiceSlug>,
    Json(form): Json<AppointmentForm>,
) -> Result<Json<AppointmentView>> {
    let store = session_store(&state, &session).await;
    let user = require_profile(&store)?;

    let schedule = state.platform().get_schedule(&slug).await?;
    let window = AppointmentWindow {
        schedule_id: schedule.id.clone(),
        start_time: form.start_time,
        end_time: form.start_time + Duration::minutes(i64::from(schedule.slot_minutes)),
    };
    store.put_json(&keys::appointment(&slug), &window);

    let service = state.platform().get_service(&slug).await?;
    let request = EnsureDraftOrder {
        slug: slug.clone(),
        user,
        service_id: service.id,
        cart: load_cart(&state, &store, &slug),
        appointment: Some(window.clone()),
        questionnaire: store.get_json(&keys::questionnaire(&slug)),
    };
    let order_id = state.orders().ensure_draft_order(&store, request).await?;

    Ok(Json(AppointmentView {
        order_id,
        start_time: window.start_time,
        end_time: window.end_time,
    }))
}
