//! Bounded order status polling.
//!
//! Some platform-side transitions (payment capture, booking confirmation)
//! land asynchronously after submission. This helper polls at a fixed
//! interval with a fixed attempt budget and stops at whichever comes first:
//! a satisfying order state or budget exhaustion.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use fernhill_core::OrderId;

use crate::platform::{Order, PlatformClient};

/// Polling failure modes.
#[derive(Debug, Error)]
pub enum PollError {
    /// The attempt budget ran out before the predicate was satisfied.
    #[error("order {order_id} did not reach the expected state after {attempts} attempts")]
    TimedOut { order_id: OrderId, attempts: u32 },
}

/// Poll an order until `satisfied` returns true.
///
/// Transient fetch failures consume an attempt and the loop continues;
/// polling is a non-critical side effect and must not fail a flow that an
/// upstream hiccup would otherwise have passed.
///
/// # Errors
///
/// Returns `PollError::TimedOut` once `max_attempts` fetches have been made
/// without a satisfying state.
pub async fn await_order(
    platform: &PlatformClient,
    order_id: &OrderId,
    satisfied: impl Fn(&Order) -> bool,
    interval: Duration,
    max_attempts: u32,
) -> Result<Order, PollError> {
    for attempt in 1..=max_attempts {
        match platform.get_order(order_id).await {
            Ok(order) if satisfied(&order) => return Ok(order),
            Ok(_) => {
                debug!(%order_id, attempt, "order not yet in expected state");
            }
            Err(e) => {
                debug!(%order_id, attempt, error = %e, "order poll fetch failed");
            }
        }
        if attempt < max_attempts {
            tokio::time::sleep(interval).await;
        }
    }

    Err(PollError::TimedOut {
        order_id: order_id.clone(),
        attempts: max_attempts,
    })
}
