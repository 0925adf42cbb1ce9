//! Payment session negotiation.
//!
//! The Ryft browser SDK needs a server-issued client secret; the platform
//! owns the Ryft account and issues sessions on our behalf.

use tracing::instrument;

use super::types::{NewPaymentSession, PaymentSession};
use super::{PlatformClient, PlatformError};

impl PlatformClient {
    /// Create a payment session for an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the order is not payable.
    #[instrument(skip(self, session), fields(order_id = %session.order_id))]
    pub async fn create_payment_session(
        &self,
        session: &NewPaymentSession,
    ) -> Result<PaymentSession, PlatformError> {
        self.post_json("/payments/sessions", session).await
    }
}
