//! Order resource operations.

use fernhill_core::{OrderId, Reference};
use tracing::instrument;

use super::types::{CreateOrder, Order, OrderList, UpdateOrder};
use super::{PlatformClient, PlatformError};

impl PlatformClient {
    /// Create a new draft order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self, order), fields(reference = %order.reference))]
    pub async fn create_order(&self, order: &CreateOrder) -> Result<Order, PlatformError> {
        self.post_json("/orders", order).await
    }

    /// Update the mutable fields of an existing order.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::NotFound` if the order no longer exists; the
    /// caller decides whether that is recoverable.
    #[instrument(skip(self, update))]
    pub async fn update_order(
        &self,
        id: &OrderId,
        update: &UpdateOrder,
    ) -> Result<Order, PlatformError> {
        self.patch_json(&format!("/orders/{id}"), update).await
    }

    /// Fetch an order by id.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::NotFound` for an unknown id.
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order, PlatformError> {
        self.get_json(&format!("/orders/{id}")).await
    }

    /// Look up an order by its human-readable reference code.
    ///
    /// Returns `Ok(None)` when no order carries the reference; this is a
    /// normal miss during draft recovery, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn get_order_by_reference(
        &self,
        reference: &Reference,
    ) -> Result<Option<Order>, PlatformError> {
        let result: Result<OrderList, PlatformError> = self
            .get_json(&format!("/orders?reference={reference}"))
            .await;
        match result {
            Ok(list) => Ok(list.orders.into_iter().next()),
            Err(PlatformError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Mark an order paid. Idempotent on the platform side: re-marking a
    /// paid order succeeds without effect.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self))]
    pub async fn mark_order_paid(&self, id: &OrderId) -> Result<Order, PlatformError> {
        self.post_json(&format!("/orders/{id}/mark-paid"), &serde_json::json!({}))
            .await
    }

    /// List the orders belonging to the bearer of `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn get_my_orders(&self, token: &str) -> Result<Vec<Order>, PlatformError> {
        let list: OrderList = self.get_json_as("/orders?mine=true", token).await?;
        Ok(list.orders)
    }
}
