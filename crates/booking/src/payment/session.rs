//! Payment session handshake.
//!
//! The browser-side Ryft SDK needs the account public key plus a
//! server-issued client secret tied to the order amount. The platform owns
//! the gateway account; this module pairs its session response with the
//! configured public key.

use fernhill_core::OrderId;

use crate::platform::{NewPaymentSession, Order, PlatformClient, PlatformError};

/// Everything the browser SDK needs to take a payment.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PaymentHandshake {
    pub session_id: String,
    pub client_secret: String,
    pub public_key: String,
    pub order_id: OrderId,
    pub amount_minor: i64,
}

/// Negotiate a payment session for a draft order.
///
/// The charged amount is taken from the order's metadata total, never from
/// client input.
///
/// # Errors
///
/// Returns an error if the platform rejects the session request.
pub async fn start_payment(
    platform: &PlatformClient,
    order: &Order,
    public_key: &str,
) -> Result<PaymentHandshake, PlatformError> {
    let (amount_minor, currency) = order
        .metadata
        .as_ref()
        .map_or((0, fernhill_core::CurrencyCode::default()), |metadata| {
            (metadata.total_minor, metadata.currency)
        });

    let session = platform
        .create_payment_session(&NewPaymentSession {
            order_id: order.id.clone(),
            amount_minor,
            currency,
        })
        .await?;

    Ok(PaymentHandshake {
        session_id: session.id,
        client_secret: session.client_secret,
        public_key: public_key.to_owned(),
        order_id: order.id.clone(),
        amount_minor,
    })
}
