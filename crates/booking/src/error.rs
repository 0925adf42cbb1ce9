//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Propagation policy: validation and upstream errors block the calling
//! wizard step with a message; blocked transitions carry their user-facing
//! guard message; internal details are never exposed to clients.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::booking::StepBlocked;
use crate::cart::CartError;
use crate::orders::BookingError;
use crate::payment::PaymentError;
use crate::platform::PlatformError;

/// Application-level error type for the booking service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Platform API operation failed.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Draft order coordination failed.
    #[error("Booking error: {0}")]
    Booking(#[from] BookingError),

    /// Payment was declined or errored at the gateway.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// A wizard guard blocked the transition.
    #[error("{0}")]
    Blocked(#[from] StepBlocked),

    /// Cart mutation rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Customer is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is server-class and worth a Sentry event.
    fn is_server_error(&self) -> bool {
        match self {
            Self::Internal(_) => true,
            Self::Platform(e) => upstream_is_server_error(e),
            Self::Booking(e) => match e.root() {
                BookingError::Upstream(e) => upstream_is_server_error(e),
                _ => false,
            },
            _ => false,
        }
    }
}

fn upstream_is_server_error(error: &PlatformError) -> bool {
    !matches!(
        error,
        PlatformError::NotFound(_) | PlatformError::RateLimited(_)
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, message) = match &self {
            Self::Platform(e) => platform_response(e),
            Self::Booking(e) => booking_response(e),
            // The customer can retry a declined payment
            Self::Payment(e) => (StatusCode::PAYMENT_REQUIRED, e.to_string()),
            // Guard messages are written for the customer
            Self::Blocked(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            Self::Cart(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::NotFound(what) => (StatusCode::NOT_FOUND, format!("Not found: {what}")),
            Self::Unauthorized(_) => (
                StatusCode::UNAUTHORIZED,
                "Please log in to continue".to_string(),
            ),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            // Don't expose internal error details to clients
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn platform_response(error: &PlatformError) -> (StatusCode, String) {
    match error {
        PlatformError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found".to_string()),
        PlatformError::RateLimited(seconds) => (
            StatusCode::TOO_MANY_REQUESTS,
            format!("Too many requests, retry after {seconds} seconds"),
        ),
        PlatformError::Api { status, .. } if *status == 401 => (
            StatusCode::UNAUTHORIZED,
            "Invalid credentials".to_string(),
        ),
        PlatformError::Api { status, .. } if *status == 409 => (
            StatusCode::CONFLICT,
            "An account with this email already exists".to_string(),
        ),
        _ => (
            StatusCode::BAD_GATEWAY,
            "External service error".to_string(),
        ),
    }
}

fn booking_response(error: &BookingError) -> (StatusCode, String) {
    match error.root() {
        BookingError::MissingInput(what) => (
            StatusCode::BAD_REQUEST,
            format!("Missing required input: {what}"),
        ),
        BookingError::Cart(e) => (StatusCode::BAD_REQUEST, e.to_string()),
        BookingError::Upstream(e) => platform_response(e),
        // root() never returns Shared
        BookingError::Shared(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_blocked_transition_is_unprocessable() {
        assert_eq!(
            status_of(AppError::Blocked(StepBlocked::EmptyCart)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_missing_input_is_bad_request() {
        assert_eq!(
            status_of(AppError::Booking(BookingError::MissingInput("user id"))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_upstream_failure_is_bad_gateway() {
        let err = AppError::Booking(BookingError::Upstream(PlatformError::Api {
            status: 500,
            message: "boom".to_string(),
        }));
        assert_eq!(status_of(err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_platform_not_found_maps_to_404() {
        assert_eq!(
            status_of(AppError::Platform(PlatformError::NotFound(
                "order".to_string()
            ))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_payment_declined_is_payment_required() {
        assert_eq!(
            status_of(AppError::Payment(PaymentError::Declined)),
            StatusCode::PAYMENT_REQUIRED
        );
    }

    #[test]
    fn test_unauthorized_and_internal() {
        assert_eq!(
            status_of(AppError::Unauthorized("no token".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Internal("secret detail".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
