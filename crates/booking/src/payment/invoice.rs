//! Plain-text invoice rendering.
//!
//! The confirmation email attaches a text rendering of the order snapshot.
//! Richer document formats belong to the platform's paperwork pipeline, not
//! this service.

use fernhill_core::Money;

use crate::platform::Order;

/// A rendered invoice document.
#[derive(Debug, Clone)]
pub struct Invoice {
    pub filename: String,
    pub text: String,
}

impl Invoice {
    /// Render an invoice from an order snapshot.
    #[must_use]
    pub fn render(order: &Order, support_url: Option<&str>) -> Self {
        let mut text = String::new();
        text.push_str("FERNHILL PHARMACY\n");
        text.push_str("=================\n\n");
        text.push_str(&format!("Invoice for order {}\n", order.reference));
        text.push_str(&format!(
            "Date: {}\n",
            order.updated_at.format("%-d %B %Y")
        ));
        text.push_str(&format!("Payment status: {}\n\n", order.payment_status));

        if let Some(metadata) = &order.metadata {
            for line in &metadata.line_items {
                let name = line.variation.as_ref().map_or_else(
                    || line.name.clone(),
                    |variation| format!("{} ({variation})", line.name),
                );
                let amount = Money::from_minor(line.line_minor, metadata.currency);
                text.push_str(&format!(
                    "  {name}  x{}  {}\n",
                    line.quantity,
                    amount.display()
                ));
            }
            text.push('\n');

            let subtotal = Money::from_minor(metadata.subtotal_minor, metadata.currency);
            text.push_str(&format!("Subtotal: {}\n", subtotal.display()));
            if metadata.delivery_fee_minor > 0 {
                let fee = Money::from_minor(metadata.delivery_fee_minor, metadata.currency);
                text.push_str(&format!("Delivery: {}\n", fee.display()));
            }
            let total = Money::from_minor(metadata.total_minor, metadata.currency);
            text.push_str(&format!("Total: {}\n", total.display()));

            if let Some(shipping) = &metadata.shipping {
                text.push('\n');
                text.push_str("Deliver to:\n");
                text.push_str(&format!("  {}\n", shipping.recipient));
                text.push_str(&format!("  {}\n", shipping.address.line1));
                if let Some(line2) = &shipping.address.line2 {
                    text.push_str(&format!("  {line2}\n"));
                }
                text.push_str(&format!(
                    "  {} {}\n",
                    shipping.address.city, shipping.address.postcode
                ));
            }
        }

        if let Some(url) = support_url {
            text.push_str(&format!("\nQuestions? {url}\n"));
        }

        Self {
            filename: format!("invoice-{}.txt", order.reference),
            text,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fernhill_core::{
        CurrencyCode, Email, OrderId, OrderStatus, PaymentStatus, Reference, ServiceId, UserId,
    };
    use rust_decimal::Decimal;
    use crate::platform::{Address, MetadataLine, OrderMetadata, ShippingSnapshot};

    fn paid_order() -> Order {
        Order {
            id: OrderId::new("ord_1"),
            reference: Reference::new("FH-7KQ2MX"),
            user_id: UserId::new("usr_1"),
            service_id: ServiceId::new("srv_1"),
            schedule_id: None,
            start_time: None,
            end_time: None,
            status: OrderStatus::Confirmed,
            payment_status: PaymentStatus::Paid,
            metadata: Some(OrderMetadata {
                line_items: vec![MetadataLine {
                    name: "Finasteride".to_string(),
                    variation: Some("1 mg".to_string()),
                    quantity: 2,
                    unit_minor: 500,
                    unit: Decimal::new(500, 2),
                    line_minor: 1000,
                    line: Decimal::new(1000, 2),
                }],
                subtotal_minor: 1000,
                subtotal: Decimal::new(1000, 2),
                delivery_fee_minor: 299,
                total_minor: 1299,
                total: Decimal::new(1299, 2),
                currency: CurrencyCode::GBP,
                shipping: Some(ShippingSnapshot {
                    recipient: "Jo Bloggs".to_string(),
                    email: Email::parse("jo@example.com").unwrap(),
                    phone: None,
                    address: Address {
                        line1: "1 Home St".to_string(),
                        line2: None,
                        city: "Leeds".to_string(),
                        postcode: "LS1 1AA".to_string(),
                        country: "GB".to_string(),
                    },
                }),
                questionnaire: None,
                appointment: None,
            }),
            created_at: "2026-03-02T09:00:00Z".parse().unwrap(),
            updated_at: "2026-03-02T09:30:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_render_includes_lines_and_totals() {
        let invoice = Invoice::render(&paid_order(), Some("https://fernhill.test/support"));

        assert_eq!(invoice.filename, "invoice-FH-7KQ2MX.txt");
        assert!(invoice.text.contains("Finasteride (1 mg)  x2  £10.00"));
        assert!(invoice.text.contains("Subtotal: £10.00"));
        assert!(invoice.text.contains("Delivery: £2.99"));
        assert!(invoice.text.contains("Total: £12.99"));
        assert!(invoice.text.contains("Jo Bloggs"));
        assert!(invoice.text.contains("https://fernhill.test/support"));
    }

    #[test]
    fn test_render_without_metadata_still_produces_document() {
        let mut order = paid_order();
        order.metadata = None;
        let invoice = Invoice::render(&order, None);
        assert!(invoice.text.contains("FH-7KQ2MX"));
        assert!(!invoice.text.contains("Subtotal"));
    }

    #[test]
    fn test_zero_delivery_fee_omitted() {
        let mut order = paid_order();
        if let Some(metadata) = &mut order.metadata {
            metadata.delivery_fee_minor = 0;
            metadata.total_minor = 1000;
        }
        let invoice = Invoice::render(&order, None);
        assert!(!invoice.text.contains("Delivery:"));
    }
}
