//! Payment confirmation coordinator.
//!
//! Once the gateway reports success the customer has paid; nothing after
//! that point may fail the confirmation. Every post-payment step is
//! best-effort with the one hard requirement that the slug is finalized
//! before any further navigation, establishing the immutability boundary
//! for the paid order.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;
use tracing::{info, instrument, warn};

use fernhill_core::{Email, OrderId, PaymentStatus};

use crate::booking::{BookingFlow, BookingStep};
use crate::orders::{AppointmentWindow, DraftOrderCoordinator};
use crate::platform::{
    EmailAttachment, EmailMessage, NewAppointment, Order, PaymentOutcome, PlatformClient,
    UserProfile,
};
use crate::store::{BookingStore, keys};

use super::invoice::Invoice;
use super::poll;

/// Payment capture poll cadence.
const POLL_INTERVAL: Duration = Duration::from_millis(500);
const POLL_ATTEMPTS: u32 = 10;

/// Blocking payment failures, surfaced to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("Your card was declined. No payment was taken.")]
    Declined,
    #[error("Something went wrong taking your payment. Please try again.")]
    Failed,
}

/// Orchestrates the post-payment side effects.
#[derive(Clone)]
pub struct PaymentCoordinator {
    platform: PlatformClient,
    support_url: Option<String>,
    support_email: Option<Email>,
}

impl PaymentCoordinator {
    /// Create a coordinator over a platform client.
    #[must_use]
    pub const fn new(
        platform: PlatformClient,
        support_url: Option<String>,
        support_email: Option<Email>,
    ) -> Self {
        Self {
            platform,
            support_url,
            support_email,
        }
    }

    /// Handle a terminal gateway outcome for an order.
    ///
    /// On success: mark paid → finalize the slug → clear the cart → book
    /// the appointment → send the confirmation email with the invoice
    /// attached → move the flow to `success`. Steps after finalization are
    /// best-effort; their failures are logged, never surfaced.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError` only when the gateway itself reported
    /// `Declined` or `Error`; the flow state is left untouched so the
    /// customer can retry.
    #[instrument(skip(self, store, flow), fields(slug = %flow.slug(), order_id = %order_id))]
    pub async fn confirm(
        &self,
        store: &BookingStore,
        flow: &mut BookingFlow,
        order_id: &OrderId,
        outcome: PaymentOutcome,
    ) -> Result<BookingStep, PaymentError> {
        match outcome {
            PaymentOutcome::Declined => return Err(PaymentError::Declined),
            PaymentOutcome::Error => return Err(PaymentError::Failed),
            PaymentOutcome::Approved | PaymentOutcome::Captured => {}
        }

        let slug = flow.slug().clone();

        // 1. Mark paid. Idempotent upstream; a failure is logged and the
        //    flow continues - the customer has already been charged.
        let mut snapshot = match self.platform.mark_order_paid(order_id).await {
            Ok(order) => Some(order),
            Err(e) => {
                warn!(error = %e, "failed to mark order paid, continuing confirmation");
                None
            }
        };

        // 2. Finalize before any navigation: from here on no wizard
        //    re-entry may mutate this order.
        DraftOrderCoordinator::finalize(store, &slug, order_id);

        // 3. Clear the cart.
        store.remove(&keys::cart(&slug));

        // Capture may land asynchronously; give it a bounded wait.
        if !matches!(
            snapshot.as_ref().map(|order| order.payment_status),
            Some(PaymentStatus::Paid)
        ) {
            match poll::await_order(
                &self.platform,
                order_id,
                |order| order.payment_status == PaymentStatus::Paid,
                POLL_INTERVAL,
                POLL_ATTEMPTS,
            )
            .await
            {
                Ok(order) => snapshot = Some(order),
                Err(e) => warn!(error = %e, "order never reported paid, continuing"),
            }
        }

        // 4. Book the selected appointment, if the service uses one.
        if let Some(window) = store.get_json::<AppointmentWindow>(&keys::appointment(&slug)) {
            let appointment = NewAppointment {
                order_id: order_id.clone(),
                schedule_id: window.schedule_id,
                start_time: window.start_time,
                end_time: window.end_time,
            };
            if let Err(e) = self.platform.create_appointment(&appointment).await {
                warn!(error = %e, "failed to create appointment after payment");
            }
        }

        // 5. Invoice + confirmation email, with the attachment fallback.
        if let Some(order) = &snapshot {
            self.send_confirmation(store, order).await;
        } else {
            warn!("no order snapshot available, skipping confirmation email");
        }

        // 6. Success step (runs the completion purge).
        flow.complete(store);
        info!("booking confirmed");
        Ok(flow.current())
    }

    /// Send the confirmation email, retrying once without the attachment.
    ///
    /// Email failures are logged, never surfaced: payment success is
    /// independent of notification success.
    async fn send_confirmation(&self, store: &BookingStore, order: &Order) {
        let Some(recipient) = Self::recipient(store, order) else {
            warn!("no recipient address for confirmation email");
            return;
        };

        let invoice = Invoice::render(order, self.support_url.as_deref());
        let subject = format!("Your Fernhill Pharmacy order {}", order.reference);

        let mut message = EmailMessage {
            to: recipient,
            subject,
            text: format!(
                "Thank you for your order. Your reference is {}.\n\n{}",
                order.reference, invoice.text
            ),
            reply_to: self.support_email.clone(),
            attachment: Some(EmailAttachment {
                filename: invoice.filename.clone(),
                content_type: "text/plain".to_string(),
                content: BASE64.encode(invoice.text.as_bytes()),
            }),
        };

        if let Err(e) = self.platform.send_email(&message).await {
            warn!(error = %e, "confirmation email with attachment failed, retrying without");
            message.attachment = None;
            if let Err(e) = self.platform.send_email(&message).await {
                warn!(error = %e, "confirmation email failed");
            }
        }
    }

    /// Resolve the confirmation recipient: the order's shipping snapshot,
    /// else the cached profile.
    fn recipient(store: &BookingStore, order: &Order) -> Option<Email> {
        if let Some(shipping) = order
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.shipping.as_ref())
        {
            return Some(shipping.email.clone());
        }
        store
            .get_json::<UserProfile>(keys::CURRENT_USER)
            .map(|profile| profile.email)
    }
}
