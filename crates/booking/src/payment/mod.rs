//! Payment confirmation orchestration.
//!
//! The gateway SDK runs in the browser; this module owns everything that
//! happens once it reports a terminal state: marking the order paid,
//! finalizing the slug, clearing the cart, booking the appointment, and the
//! invoice/confirmation email side effects.

pub mod confirm;
pub mod invoice;
pub mod poll;
pub mod session;

pub use confirm::{PaymentCoordinator, PaymentError};
pub use invoice::Invoice;
pub use poll::{PollError, await_order};
pub use session::PaymentHandshake;
