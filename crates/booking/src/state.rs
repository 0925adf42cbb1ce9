//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::BookingConfig;
use crate::orders::DraftOrderCoordinator;
use crate::payment::PaymentCoordinator;
use crate::platform::PlatformClient;
use crate::store::StoreRegistry;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to the platform client,
/// the coordinators, and the per-session store registry.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BookingConfig,
    platform: PlatformClient,
    stores: StoreRegistry,
    orders: DraftOrderCoordinator,
    payments: PaymentCoordinator,
}

impl AppState {
    /// Create a new application state from configuration.
    #[must_use]
    pub fn new(config: BookingConfig) -> Self {
        let platform = PlatformClient::new(&config.platform);
        let orders = DraftOrderCoordinator::new(platform.clone(), config.delivery_fee);
        let payments = PaymentCoordinator::new(
            platform.clone(),
            config.support_url.clone(),
            config.support_email.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                platform,
                stores: StoreRegistry::new(),
                orders,
                payments,
            }),
        }
    }

    /// Get a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &BookingConfig {
        &self.inner.config
    }

    /// Get a reference to the platform API client.
    #[must_use]
    pub fn platform(&self) -> &PlatformClient {
        &self.inner.platform
    }

    /// Get a reference to the session store registry.
    #[must_use]
    pub fn stores(&self) -> &StoreRegistry {
        &self.inner.stores
    }

    /// Get a reference to the draft order coordinator.
    #[must_use]
    pub fn orders(&self) -> &DraftOrderCoordinator {
        &self.inner.orders
    }

    /// Get a reference to the payment coordinator.
    #[must_use]
    pub fn payments(&self) -> &PaymentCoordinator {
        &self.inner.payments
    }
}
