//! Authentication route handlers.
//!
//! Credentials are exchanged with the platform for a bearer token; the
//! token and profile live in the session's booking store. When a login
//! completes mid-wizard the flow for that slug advances past the login
//! step automatically.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use fernhill_core::{Email, ServiceSlug};

use crate::booking::{BookingFlow, BookingStep};
use crate::error::{AppError, Result};
use crate::platform::{Credentials, Registration, UserProfile};
use crate::state::AppState;
use crate::store::keys;

use super::{current_profile, session_store};

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: Email,
    pub password: String,
    /// Wizard slug to auto-advance once authenticated.
    pub slug: Option<ServiceSlug>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: Email,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub slug: Option<ServiceSlug>,
}

/// Authentication response.
#[derive(Debug, Serialize)]
pub struct AuthView {
    pub user: UserProfile,
    /// Wizard step after the auto-advance, when a slug was given.
    pub step: Option<BookingStep>,
}

/// Log in.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<AuthView>> {
    let store = session_store(&state, &session).await;

    let auth = state
        .platform()
        .login(&Credentials {
            email: form.email,
            password: form.password,
        })
        .await?;

    store.put(keys::AUTH_TOKEN, &auth.token);
    store.put_json(keys::CURRENT_USER, &auth.user);

    let step = form.slug.map(|slug| {
        let mut flow = BookingFlow::restore(&store, slug, false);
        flow.on_authenticated(&store);
        flow.current()
    });

    Ok(Json(AuthView {
        user: auth.user,
        step,
    }))
}

/// Register a new account.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RegisterForm>,
) -> Result<Json<AuthView>> {
    let store = session_store(&state, &session).await;

    let auth = state
        .platform()
        .register(&Registration {
            email: form.email,
            password: form.password,
            first_name: form.first_name,
            last_name: form.last_name,
        })
        .await?;

    store.put(keys::AUTH_TOKEN, &auth.token);
    store.put_json(keys::CURRENT_USER, &auth.user);

    let step = form.slug.map(|slug| {
        let mut flow = BookingFlow::restore(&store, slug, false);
        flow.on_authenticated(&store);
        flow.current()
    });

    Ok(Json(AuthView {
        user: auth.user,
        step,
    }))
}

/// Log out. Booking state survives; only the auth keys are cleared.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<StatusCode> {
    let store = session_store(&state, &session).await;
    store.clear_auth();
    Ok(StatusCode::NO_CONTENT)
}

/// The cached profile for this session.
#[instrument(skip(state, session))]
pub async fn me(State(state): State<AppState>, session: Session) -> Result<Json<UserProfile>> {
    let store = session_store(&state, &session).await;
    current_profile(&store)
        .map(Json)
        .ok_or_else(|| AppError::Unauthorized("not logged in".to_string()))
}
