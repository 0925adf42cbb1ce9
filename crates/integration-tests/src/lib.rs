//! Integration test harness for the Fernhill booking service.
//!
//! Spins up an in-process mock of the pharmacy platform API on an
//! ephemeral port, with request counters and failure switches, and wires
//! real `fernhill-booking` components against it. Tests assert on both the
//! results and the number/shape of network mutations the coordinators
//! issued.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used)] // test harness

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::Utc;
use secrecy::SecretString;
use serde_json::{Value, json};

use fernhill_booking::cart::Cart;
use fernhill_booking::config::PlatformConfig;
use fernhill_booking::orders::{DraftOrderCoordinator, EnsureDraftOrder};
use fernhill_booking::platform::{Medicine, PlatformClient, UserProfile};
use fernhill_core::{CurrencyCode, Money, ServiceId, ServiceSlug};

/// Shared state of the mock platform.
#[derive(Default)]
pub struct MockState {
    next_order: AtomicUsize,
    /// Number of `POST /orders` calls received.
    pub create_calls: AtomicUsize,
    /// Number of `PATCH /orders/{id}` calls received.
    pub update_calls: AtomicUsize,
    /// Number of `POST /orders/{id}/mark-paid` calls received.
    pub mark_paid_calls: AtomicUsize,
    /// Number of `POST /emails` calls received (including failed sends).
    pub email_calls: AtomicUsize,
    /// Orders by id, as stored JSON.
    pub orders: Mutex<HashMap<String, Value>>,
    /// Successfully delivered emails.
    pub emails: Mutex<Vec<Value>>,
    /// Created appointments.
    pub appointments: Mutex<Vec<Value>>,
    /// When set, emails carrying an attachment fail with a 500.
    pub fail_attachment_email: AtomicBool,
    /// When non-zero, `PATCH /orders/{id}` fails with this status code.
    pub fail_update_status: AtomicU64,
    /// Artificial latency on order creation, to widen race windows.
    pub create_delay_ms: AtomicU64,
}

impl MockState {
    /// Snapshot of (create, update) call counts.
    pub fn mutation_calls(&self) -> (usize, usize) {
        (
            self.create_calls.load(Ordering::SeqCst),
            self.update_calls.load(Ordering::SeqCst),
        )
    }

    /// Remove an order server-side (simulates platform-side deletion).
    pub fn delete_order(&self, id: &str) {
        self.orders.lock().unwrap().remove(id);
    }

    /// Payment status string of a stored order.
    pub fn payment_status(&self, id: &str) -> Option<String> {
        self.orders
            .lock()
            .unwrap()
            .get(id)
            .and_then(|order| order["payment_status"].as_str().map(String::from))
    }
}

/// A running mock platform API.
pub struct MockPlatform {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockPlatform {
    /// Bind an ephemeral port and serve the mock.
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::default());
        let app = mock_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Base URL of the mock.
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// A real platform client pointed at the mock.
    pub fn client(&self) -> PlatformClient {
        PlatformClient::new(&PlatformConfig {
            api_url: self.base_url().parse().unwrap(),
            api_token: SecretString::from("svc_3kQ9xW7pL2mN8vB4"),
        })
    }

    /// A draft order coordinator over the mock, with no delivery fee.
    pub fn coordinator(&self) -> DraftOrderCoordinator {
        DraftOrderCoordinator::new(self.client(), Money::zero(CurrencyCode::GBP))
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// The profile the mock's auth endpoints return.
pub fn test_profile() -> UserProfile {
    serde_json::from_value(profile_json()).unwrap()
}

fn profile_json() -> Value {
    json!({
        "id": "usr_1",
        "email": "jo@example.com",
        "first_name": "Jo",
        "last_name": "Bloggs",
        "phone": "07700 900000",
        "address": {
            "line1": "1 Home St",
            "city": "Leeds",
            "postcode": "LS1 1AA",
            "country": "GB"
        }
    })
}

/// The medicine the mock's catalog returns.
pub fn test_medicine() -> Medicine {
    serde_json::from_value(medicines_json()[0].clone()).unwrap()
}

fn medicines_json() -> Value {
    json!([{
        "id": "med_1",
        "sku": "FIN-1MG-28",
        "name": "Finasteride",
        "variation": "1 mg",
        "price_minor": 500,
        "currency": "GBP",
        "in_stock": true
    }])
}

/// A cart holding 2 × 500 minor units.
pub fn test_cart() -> Cart {
    let mut cart = Cart::new(CurrencyCode::GBP);
    cart.add(&test_medicine(), 2).unwrap();
    cart
}

/// A complete ensure request for a slug.
pub fn ensure_request(slug: &str) -> EnsureDraftOrder {
    EnsureDraftOrder {
        slug: ServiceSlug::new(slug),
        user: test_profile(),
        service_id: ServiceId::new("srv_1"),
        cart: test_cart(),
        appointment: None,
        questionnaire: None,
    }
}

// =============================================================================
// Mock routes
// =============================================================================

fn mock_router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/services", get(list_services))
        .route("/services/{slug}", get(show_service))
        .route("/services/{slug}/medicines", get(list_medicines))
        .route("/services/{slug}/schedule", get(show_schedule))
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/{id}", patch(update_order).get(get_order))
        .route("/orders/{id}/mark-paid", post(mark_paid))
        .route("/appointments", post(create_appointment))
        .route("/auth/login", post(auth_session))
        .route("/auth/register", post(auth_session))
        .route("/auth/me", get(me))
        .route("/payments/sessions", post(payment_session))
        .route("/emails", post(send_email))
        .with_state(state)
}

async fn list_services() -> Json<Value> {
    Json(json!([service_json("hair-loss")]))
}

async fn show_service(Path(slug): Path<String>) -> Json<Value> {
    Json(service_json(&slug))
}

fn service_json(slug: &str) -> Value {
    json!({
        "id": "srv_1",
        "slug": slug,
        "name": "Hair loss treatment",
        "description": "Prescription hair loss treatment",
        "requires_appointment": true,
        "requires_questionnaire": true
    })
}

async fn list_medicines() -> Json<Value> {
    Json(medicines_json())
}

async fn show_schedule() -> Json<Value> {
    let window = json!({ "open": "09:00:00", "close": "17:00:00" });
    Json(json!({
        "id": "sch_1",
        "name": "Pharmacist consultations",
        "timezone": "Europe/London",
        "slot_minutes": 15,
        "weekly": {
            "monday": window,
            "tuesday": window,
            "wednesday": window,
            "thursday": window,
            "friday": window
        },
        "overrides": []
    }))
}

async fn create_order(
    State(state): State<Arc<MockState>>,
    Json(mut body): Json<Value>,
) -> Json<Value> {
    let delay = state.create_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }

    state.create_calls.fetch_add(1, Ordering::SeqCst);
    let n = state.next_order.fetch_add(1, Ordering::SeqCst) + 1;
    let id = format!("ord_{n}");
    let now = Utc::now().to_rfc3339();

    body["id"] = json!(id);
    body["created_at"] = json!(now);
    body["updated_at"] = json!(now);

    state.orders.lock().unwrap().insert(id, body.clone());
    Json(body)
}

async fn update_order(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    state.update_calls.fetch_add(1, Ordering::SeqCst);

    let forced = state.fail_update_status.load(Ordering::SeqCst);
    if forced != 0 {
        let status =
            StatusCode::from_u16(u16::try_from(forced).unwrap_or(500)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, "forced failure").into_response();
    }

    let mut orders = state.orders.lock().unwrap();
    let Some(order) = orders.get_mut(&id) else {
        return (StatusCode::NOT_FOUND, "order not found").into_response();
    };

    for field in ["metadata", "schedule_id", "start_time", "end_time"] {
        if let Some(value) = body.get(field) {
            order[field] = value.clone();
        }
    }
    order["updated_at"] = json!(Utc::now().to_rfc3339());
    Json(order.clone()).into_response()
}

async fn get_order(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    match state.orders.lock().unwrap().get(&id) {
        Some(order) => Json(order.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "order not found").into_response(),
    }
}

async fn list_orders(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let orders = state.orders.lock().unwrap();
    let matches: Vec<Value> = orders
        .values()
        .filter(|order| match params.get("reference") {
            Some(reference) => order["reference"].as_str() == Some(reference),
            None => true,
        })
        .cloned()
        .collect();
    Json(json!({ "orders": matches }))
}

async fn mark_paid(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    state.mark_paid_calls.fetch_add(1, Ordering::SeqCst);

    let mut orders = state.orders.lock().unwrap();
    let Some(order) = orders.get_mut(&id) else {
        return (StatusCode::NOT_FOUND, "order not found").into_response();
    };
    order["payment_status"] = json!("paid");
    order["status"] = json!("confirmed");
    order["updated_at"] = json!(Utc::now().to_rfc3339());
    Json(order.clone()).into_response()
}

async fn create_appointment(
    State(state): State<Arc<MockState>>,
    Json(mut body): Json<Value>,
) -> Json<Value> {
    body["id"] = json!("apt_1");
    body["status"] = json!("pending");
    state.appointments.lock().unwrap().push(body.clone());
    Json(body)
}

async fn auth_session() -> Json<Value> {
    Json(json!({ "token": "tok_test", "user": profile_json() }))
}

async fn me() -> Json<Value> {
    Json(profile_json())
}

async fn payment_session() -> Json<Value> {
    Json(json!({ "id": "ps_1", "client_secret": "cs_test_9Q2mX" }))
}

async fn send_email(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.email_calls.fetch_add(1, Ordering::SeqCst);

    if state.fail_attachment_email.load(Ordering::SeqCst) && !body["attachment"].is_null() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "attachment rejected").into_response();
    }

    state.emails.lock().unwrap().push(body);
    let n = state.emails.lock().unwrap().len();
    Json(json!({ "id": format!("em_{n}") })).into_response()
}
