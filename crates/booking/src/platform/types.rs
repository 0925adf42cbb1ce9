//! Wire types for the pharmacy platform API.
//!
//! All requests/responses are JSON. Entities are owned by the platform; this
//! service round-trips them and holds only transient copies.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fernhill_core::{
    AppointmentId, AppointmentStatus, CurrencyCode, Email, MedicineId, OrderId, OrderStatus,
    PaymentStatus, Reference, ScheduleId, ServiceId, ServiceSlug, UserId,
};

// =============================================================================
// Catalog
// =============================================================================

/// A bookable pharmacy service (treatment category).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub slug: ServiceSlug,
    pub name: String,
    pub description: Option<String>,
    /// Whether the booking wizard requires an appointment step.
    #[serde(default)]
    pub requires_appointment: bool,
    /// Whether the medical questionnaire step applies.
    #[serde(default = "default_true")]
    pub requires_questionnaire: bool,
}

const fn default_true() -> bool {
    true
}

/// A medicine/treatment option sold under a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub id: MedicineId,
    pub sku: Option<String>,
    pub name: String,
    /// Strength/variation label (e.g., "2.5 mg").
    pub variation: Option<String>,
    /// Unit price in minor currency units.
    pub price_minor: i64,
    pub currency: CurrencyCode,
    #[serde(default)]
    pub min_quantity: Option<u32>,
    #[serde(default)]
    pub max_quantity: Option<u32>,
    #[serde(default = "default_true")]
    pub in_stock: bool,
}

// =============================================================================
// Users
// =============================================================================

/// A postal address on a customer profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub postcode: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "GB".to_string()
}

/// Customer profile as returned by `GET /auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Primary address on file.
    #[serde(default)]
    pub address: Option<Address>,
    /// Shipping override; falls back to the primary address when absent.
    #[serde(default)]
    pub shipping_address: Option<Address>,
}

impl UserProfile {
    /// Resolve the address orders should ship to: the shipping override if
    /// present, else the primary address.
    #[must_use]
    pub fn resolved_shipping(&self) -> Option<&Address> {
        self.shipping_address.as_ref().or(self.address.as_ref())
    }

    /// Full display name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Login request body.
#[derive(Debug, Serialize)]
pub struct Credentials {
    pub email: Email,
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Serialize)]
pub struct Registration {
    pub email: Email,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Successful login/registration response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    /// Bearer token for customer-scoped endpoints.
    pub token: String,
    pub user: UserProfile,
}

// =============================================================================
// Orders
// =============================================================================

/// An order resource on the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub reference: Reference,
    pub user_id: UserId,
    pub service_id: ServiceId,
    #[serde(default)]
    pub schedule_id: Option<ScheduleId>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub metadata: Option<OrderMetadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for `POST /orders`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrder {
    pub reference: Reference,
    pub user_id: UserId,
    pub service_id: ServiceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<ScheduleId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub metadata: OrderMetadata,
}

/// Body for `PATCH /orders/{id}`.
///
/// Carries only the mutable fields - owner and service identity are never
/// re-sent on update.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOrder {
    pub metadata: OrderMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<ScheduleId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

/// Order list wrapper for `GET /orders?...` queries.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderList {
    pub orders: Vec<Order>,
}

// =============================================================================
// Order metadata
// =============================================================================

/// Structured order metadata snapshot.
///
/// The platform stores this verbatim and renders it into dispensing
/// paperwork, so amounts are carried in both minor units (authoritative) and
/// major units (display).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderMetadata {
    pub line_items: Vec<MetadataLine>,
    pub subtotal_minor: i64,
    pub subtotal: Decimal,
    pub delivery_fee_minor: i64,
    pub total_minor: i64,
    pub total: Decimal,
    pub currency: CurrencyCode,
    #[serde(default)]
    pub shipping: Option<ShippingSnapshot>,
    #[serde(default)]
    pub questionnaire: Option<QuestionnaireAnswers>,
    #[serde(default)]
    pub appointment: Option<AppointmentSnapshot>,
}

/// One order line in the metadata snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataLine {
    pub name: String,
    #[serde(default)]
    pub variation: Option<String>,
    pub quantity: u32,
    pub unit_minor: i64,
    pub unit: Decimal,
    pub line_minor: i64,
    pub line: Decimal,
}

/// Shipping details frozen into the order at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingSnapshot {
    pub recipient: String,
    pub email: Email,
    #[serde(default)]
    pub phone: Option<String>,
    pub address: Address,
}

/// Appointment window frozen into the order metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentSnapshot {
    pub schedule_id: ScheduleId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Medical questionnaire answers, typed per booking flow variant.
///
/// One discriminated schema instead of an open-ended dictionary: each flow
/// variant carries exactly the fields its clinical review needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flow", rename_all = "snake_case")]
pub enum QuestionnaireAnswers {
    /// First booking of this treatment with Fernhill.
    New {
        responses: Vec<QuestionnaireResponse>,
        gp_consent: bool,
    },
    /// Transferring an ongoing treatment from another pharmacy.
    Transfer {
        responses: Vec<QuestionnaireResponse>,
        current_pharmacy: String,
        nomination_consent: bool,
    },
    /// Repeat order of a previously approved treatment.
    Reorder {
        previous_order: OrderId,
        changes_reported: bool,
        responses: Vec<QuestionnaireResponse>,
    },
}

/// A single question/answer pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireResponse {
    pub question: String,
    pub answer: String,
}

// =============================================================================
// Appointments
// =============================================================================

/// Body for `POST /appointments`.
#[derive(Debug, Clone, Serialize)]
pub struct NewAppointment {
    pub order_id: OrderId,
    pub schedule_id: ScheduleId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// An appointment resource on the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub order_id: OrderId,
    pub schedule_id: ScheduleId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
}

// =============================================================================
// Payments
// =============================================================================

/// Body for `POST /payments/sessions`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPaymentSession {
    pub order_id: OrderId,
    pub amount_minor: i64,
    pub currency: CurrencyCode,
}

/// A payment session issued by the platform for the Ryft browser SDK.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSession {
    pub id: String,
    /// Handed to the browser SDK together with the public key.
    pub client_secret: String,
}

/// Terminal states reported by the payment SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentOutcome {
    Approved,
    Captured,
    Declined,
    Error,
}

impl PaymentOutcome {
    /// Whether the gateway reported a successful payment.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Approved | Self::Captured)
    }
}

// =============================================================================
// Transactional email
// =============================================================================

/// Body for `POST /emails`.
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to: Email,
    pub subject: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Email>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<EmailAttachment>,
}

/// Base64-encoded attachment payload.
#[derive(Debug, Clone, Serialize)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    /// Base64-encoded file content.
    pub content: String,
}
