//! Order metadata snapshot builder.
//!
//! The snapshot freezes everything the pharmacy needs to dispense into the
//! order resource: line items with minor and major amounts, totals,
//! shipping details, questionnaire answers, and the appointment window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fernhill_core::{Money, ScheduleId};

use crate::cart::{Cart, CartError};
use crate::platform::{
    AppointmentSnapshot, MetadataLine, OrderMetadata, QuestionnaireAnswers, ShippingSnapshot,
    UserProfile,
};

/// An appointment slot selected on the calendar step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentWindow {
    pub schedule_id: ScheduleId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Build the metadata snapshot for a draft order.
///
/// Shipping resolves to the profile's shipping override if present, else the
/// primary address; a profile with no address yields no shipping snapshot
/// (collected later by the dispensing team).
///
/// # Errors
///
/// Returns `CartError` on minor-unit overflow or a delivery fee configured
/// in a different currency than the cart.
pub fn build_snapshot(
    cart: &Cart,
    user: &UserProfile,
    appointment: Option<&AppointmentWindow>,
    questionnaire: Option<QuestionnaireAnswers>,
    delivery_fee: Money,
) -> Result<OrderMetadata, CartError> {
    let mut line_items = Vec::with_capacity(cart.items().len());
    for item in cart.items() {
        let line = item.line_total()?;
        line_items.push(MetadataLine {
            name: item.name.clone(),
            variation: item.variation.clone(),
            quantity: item.quantity,
            unit_minor: item.unit_price.minor(),
            unit: item.unit_price.to_major(),
            line_minor: line.minor(),
            line: line.to_major(),
        });
    }

    let subtotal = cart.subtotal()?;
    let total = subtotal.checked_add(delivery_fee)?;

    let shipping = user.resolved_shipping().map(|address| ShippingSnapshot {
        recipient: user.full_name(),
        email: user.email.clone(),
        phone: user.phone.clone(),
        address: address.clone(),
    });

    Ok(OrderMetadata {
        line_items,
        subtotal_minor: subtotal.minor(),
        subtotal: subtotal.to_major(),
        delivery_fee_minor: delivery_fee.minor(),
        total_minor: total.minor(),
        total: total.to_major(),
        currency: cart.currency,
        shipping,
        questionnaire,
        appointment: appointment.map(|window| AppointmentSnapshot {
            schedule_id: window.schedule_id.clone(),
            start_time: window.start_time,
            end_time: window.end_time,
        }),
    })
}
