//! HTTP route handlers for the booking service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (pings the platform)
//!
//! # Catalog
//! GET  /services                        - Service listing
//! GET  /services/{slug}                 - Service detail
//! GET  /services/{slug}/medicines       - Treatments for a service
//!
//! # Booking wizard (per service slug)
//! GET  /booking/{slug}                  - Current step + sequence
//! POST /booking/{slug}/next             - Guarded forward transition
//! POST /booking/{slug}/back             - Unguarded backward transition
//! POST /booking/{slug}/questionnaire    - Save questionnaire answers
//! GET  /booking/{slug}/slots?date=...   - Bookable slots for a date
//! POST /booking/{slug}/appointment      - Select a slot, sync the draft order
//!
//! # Cart (per service slug)
//! GET  /booking/{slug}/cart             - Cart contents
//! POST /booking/{slug}/cart/add         - Add a treatment
//! POST /booking/{slug}/cart/update      - Change a line quantity
//! POST /booking/{slug}/cart/remove      - Remove a line
//!
//! # Payment
//! POST /booking/{slug}/payment/session  - Negotiate a gateway session
//! POST /booking/{slug}/payment/confirm  - Handle the gateway outcome
//!
//! # Auth
//! POST /auth/login                      - Login (optionally advances a flow)
//! POST /auth/register                   - Register
//! POST /auth/logout                     - Logout
//! GET  /auth/me                         - Cached profile
//!
//! # Account (requires auth)
//! GET  /account/orders                  - Order history
//! ```

pub mod account;
pub mod auth;
pub mod booking;
pub mod cart;
pub mod catalog;
pub mod payment;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;
use uuid::Uuid;

use fernhill_core::ServiceSlug;

use crate::cart::Cart;
use crate::error::{AppError, Result};
use crate::platform::UserProfile;
use crate::state::AppState;
use crate::store::{BookingStore, keys};

/// Session key holding the booking store id.
const STORE_ID_KEY: &str = "store_id";

/// Resolve the booking store for a session, creating both the stable store
/// id and the store on first use.
pub(crate) async fn session_store(state: &AppState, session: &Session) -> Arc<BookingStore> {
    let store_id = match session.get::<String>(STORE_ID_KEY).await.ok().flatten() {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            // Best-effort: a failed session write just means a fresh store
            // next request.
            let _ = session.insert(STORE_ID_KEY, id.clone()).await;
            id
        }
    };
    state.stores().get_or_create(&store_id)
}

/// The cached customer profile, if the session is authenticated.
pub(crate) fn current_profile(store: &BookingStore) -> Option<UserProfile> {
    store.get_json(keys::CURRENT_USER)
}

/// The cached profile, or an `Unauthorized` error.
pub(crate) fn require_profile(store: &BookingStore) -> Result<UserProfile> {
    current_profile(store).ok_or_else(|| AppError::Unauthorized("not logged in".to_string()))
}

/// Load the slug's cart, defaulting to an empty cart in the configured
/// currency.
pub(crate) fn load_cart(state: &AppState, store: &BookingStore, slug: &ServiceSlug) -> Cart {
    store
        .get_json(&keys::cart(slug))
        .unwrap_or_else(|| Cart::new(state.config().currency))
}

/// Persist the slug's cart.
pub(crate) fn save_cart(store: &BookingStore, slug: &ServiceSlug, cart: &Cart) {
    store.put_json(&keys::cart(slug), cart);
}

/// Create all routes for the booking service.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/services", get(catalog::index))
        .route("/services/{slug}", get(catalog::show))
        .route("/services/{slug}/medicines", get(catalog::medicines))
        // Wizard
        .route("/booking/{slug}", get(booking::show))
        .route("/booking/{slug}/next", post(booking::next))
        .route("/booking/{slug}/back", post(booking::back))
        .route("/booking/{slug}/questionnaire", post(booking::questionnaire))
        .route("/booking/{slug}/slots", get(booking::slots))
        .route("/booking/{slug}/appointment", post(booking::appointment))
        // Cart
        .route("/booking/{slug}/cart", get(cart::show))
        .route("/booking/{slug}/cart/add", post(cart::add))
        .route("/booking/{slug}/cart/update", post(cart::update))
        .route("/booking/{slug}/cart/remove", post(cart::remove))
        // Payment
        .route("/booking/{slug}/payment/session", post(payment::session))
        .route("/booking/{slug}/payment/confirm", post(payment::confirm))
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Account
        .route("/account/orders", get(account::orders))
}
