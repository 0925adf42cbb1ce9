//! Draft order coordination.
//!
//! The wizard keeps exactly one draft order per (service, customer) in sync
//! with the platform as the customer moves through the steps. See
//! [`coordinator::DraftOrderCoordinator`] for the concurrency and recovery
//! rules.

pub mod coordinator;
pub mod metadata;

pub use coordinator::{BookingError, DraftOrderCoordinator, EnsureDraftOrder};
pub use metadata::AppointmentWindow;
