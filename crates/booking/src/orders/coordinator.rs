//! Draft order coordinator.
//!
//! Ensures exactly one draft order exists per (service slug, customer) while
//! a booking is in progress, and that a paid order is never mutated again.
//!
//! # Concurrency
//!
//! Rapid wizard re-entry (double submits, step re-renders) can issue the
//! same ensure call several times before the first settles. Calls are
//! collapsed per (slug, user) through an owned flight registry: the first
//! caller runs the create/update sequence, later callers await the same
//! flight and receive the same settled result. The registry is per-process;
//! sessions on other instances are not coordinated and rely on the platform
//! owning the order resource.
//!
//! # Recovery
//!
//! An update that fails with a true 404 clears the cached id and falls
//! through to recovery-then-create; any other failure propagates without
//! creating a duplicate. The platform contract is that 404 on an order
//! means it was deleted server-side - if that ever loosens, this path would
//! mint duplicates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use fernhill_core::{Money, OrderId, OrderStatus, PaymentStatus, Reference, ServiceId, ServiceSlug, UserId};

use crate::cart::{Cart, CartError};
use crate::platform::{
    CreateOrder, Order, PlatformClient, PlatformError, QuestionnaireAnswers, UpdateOrder,
    UserProfile,
};
use crate::store::{BookingStore, keys};

use super::metadata::{AppointmentWindow, build_snapshot};

/// Errors from the draft order coordinator.
#[derive(Debug, Error)]
pub enum BookingError {
    /// A required input was missing; no network call was made.
    #[error("missing required input: {0}")]
    MissingInput(&'static str),

    /// Cart math failed while building the metadata snapshot.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The platform rejected or failed the call. A 404 on update is handled
    /// internally and never surfaces through this variant.
    #[error(transparent)]
    Upstream(#[from] PlatformError),

    /// The result of a flight another caller ran.
    #[error(transparent)]
    Shared(Arc<BookingError>),
}

impl BookingError {
    /// The underlying error, unwrapping shared flight results.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Shared(inner) => inner.root(),
            other => other,
        }
    }
}

/// Inputs for [`DraftOrderCoordinator::ensure_draft_order`].
#[derive(Debug, Clone)]
pub struct EnsureDraftOrder {
    pub slug: ServiceSlug,
    pub user: UserProfile,
    pub service_id: ServiceId,
    pub cart: Cart,
    pub appointment: Option<AppointmentWindow>,
    pub questionnaire: Option<QuestionnaireAnswers>,
}

type FlightKey = (ServiceSlug, UserId);
type FlightResult = Result<OrderId, Arc<BookingError>>;
type FlightCell = Arc<OnceCell<FlightResult>>;

/// Registry of in-flight ensure sequences, keyed by (slug, user).
///
/// Owned by the coordinator instance rather than living in ambient global
/// state, so tests and alternate deployments can run isolated coordinators.
#[derive(Default)]
struct FlightRegistry {
    inflight: Mutex<HashMap<FlightKey, FlightCell>>,
}

impl FlightRegistry {
    /// Get the current flight cell for a key, creating one if none exists.
    fn obtain(&self, key: &FlightKey) -> FlightCell {
        let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            inflight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

    /// Release a settled flight so the next call starts a fresh sequence.
    ///
    /// Only removes the entry if it is still the same cell; a newer flight
    /// registered after release must not be torn down.
    fn release(&self, key: &FlightKey, cell: &FlightCell) {
        let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = inflight.get(key)
            && Arc::ptr_eq(current, cell)
        {
            inflight.remove(key);
        }
    }
}

/// Coordinates draft order creation and updates against the platform.
#[derive(Clone)]
pub struct DraftOrderCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    platform: PlatformClient,
    delivery_fee: Money,
    flights: FlightRegistry,
}

impl DraftOrderCoordinator {
    /// Create a coordinator over a platform client.
    #[must_use]
    pub fn new(platform: PlatformClient, delivery_fee: Money) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                platform,
                delivery_fee,
                flights: FlightRegistry::default(),
            }),
        }
    }

    /// Ensure a draft order exists for this (slug, customer) and is in sync
    /// with the given cart/appointment/questionnaire state.
    ///
    /// Returns the order id. Concurrent calls for the same key collapse
    /// into one network sequence; once a slug is finalized the stored id is
    /// returned with no mutation attempted.
    ///
    /// # Errors
    ///
    /// - `BookingError::MissingInput` when preconditions fail (fast, no
    ///   network call)
    /// - `BookingError::Upstream` when the platform fails with anything
    ///   other than a recoverable 404 on update
    #[instrument(skip(self, store, request), fields(slug = %request.slug, user = %request.user.id))]
    pub async fn ensure_draft_order(
        &self,
        store: &BookingStore,
        request: EnsureDraftOrder,
    ) -> Result<OrderId, BookingError> {
        Self::validate(&request)?;

        // Fast path: a finalized booking always resolves to the paid order.
        if let Some(id) = store.get(&keys::finalized(&request.slug)) {
            return Ok(OrderId::new(id));
        }

        let key = (request.slug.clone(), request.user.id.clone());
        let cell = self.inner.flights.obtain(&key);

        let mut leader = false;
        let result = cell
            .get_or_init(|| {
                leader = true;
                self.run(store, request)
            })
            .await
            .clone();

        // The leader releases the flight once it has settled, success or
        // failure; waiters that already hold the cell still see the result.
        if leader {
            self.inner.flights.release(&key, &cell);
        }

        result.map_err(BookingError::Shared)
    }

    /// Mark a slug's order as finalized: payment succeeded, never mutate
    /// this order implicitly again.
    pub fn finalize(store: &BookingStore, slug: &ServiceSlug, order_id: &OrderId) {
        store.put(&keys::finalized(slug), order_id.as_str());
    }

    fn validate(request: &EnsureDraftOrder) -> Result<(), BookingError> {
        if request.slug.is_empty() {
            return Err(BookingError::MissingInput("service slug"));
        }
        if request.user.id.is_empty() {
            return Err(BookingError::MissingInput("user id"));
        }
        if request.service_id.is_empty() {
            return Err(BookingError::MissingInput("service id"));
        }
        if request.cart.is_empty() {
            return Err(BookingError::MissingInput("cart items"));
        }
        Ok(())
    }

    async fn run(&self, store: &BookingStore, request: EnsureDraftOrder) -> FlightResult {
        self.run_inner(store, request).await.map_err(Arc::new)
    }

    async fn run_inner(
        &self,
        store: &BookingStore,
        request: EnsureDraftOrder,
    ) -> Result<OrderId, BookingError> {
        let slug = request.slug.clone();

        // Re-check under the flight: a payment may have finalized the slug
        // while this call was queued.
        if let Some(id) = store.get(&keys::finalized(&slug)) {
            return Ok(OrderId::new(id));
        }

        let metadata = build_snapshot(
            &request.cart,
            &request.user,
            request.appointment.as_ref(),
            request.questionnaire.clone(),
            self.inner.delivery_fee,
        )?;

        let update = UpdateOrder {
            metadata: metadata.clone(),
            schedule_id: request
                .appointment
                .as_ref()
                .map(|window| window.schedule_id.clone()),
            start_time: request.appointment.as_ref().map(|window| window.start_time),
            end_time: request.appointment.as_ref().map(|window| window.end_time),
        };

        // 1. Cached id: update in place.
        if let Some(raw) = store.get(&keys::order_id(&slug)) {
            let id = OrderId::new(raw);
            match self.inner.platform.update_order(&id, &update).await {
                Ok(order) => {
                    Self::persist(store, &slug, &order);
                    return Ok(order.id);
                }
                Err(e) if e.is_not_found() => {
                    // Order deleted server-side; clear the stale linkage and
                    // fall through. Anything else propagates - ambiguous
                    // failures must not multiply orders.
                    warn!(order_id = %id, "cached draft order gone upstream, recreating");
                    store.remove(&keys::order_id(&slug));
                }
                Err(e) => return Err(BookingError::Upstream(e)),
            }
        }

        // 2. Recover a prior draft by its reference code.
        if let Some(raw) = store.get(&keys::order_ref(&slug)) {
            let reference = Reference::new(raw);
            if let Some(order) = self
                .inner
                .platform
                .get_order_by_reference(&reference)
                .await?
            {
                match self.inner.platform.update_order(&order.id, &update).await {
                    Ok(order) => {
                        info!(order_id = %order.id, "recovered draft order by reference");
                        Self::persist(store, &slug, &order);
                        return Ok(order.id);
                    }
                    // Vanished between lookup and update; create below.
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(BookingError::Upstream(e)),
                }
            }
        }

        // 3. Create a fresh draft.
        let create = CreateOrder {
            reference: Reference::generate(),
            user_id: request.user.id.clone(),
            service_id: request.service_id.clone(),
            schedule_id: update.schedule_id.clone(),
            start_time: update.start_time,
            end_time: update.end_time,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            metadata,
        };
        let order = self.inner.platform.create_order(&create).await?;
        info!(order_id = %order.id, reference = %order.reference, "created draft order");
        Self::persist(store, &slug, &order);
        Ok(order.id)
    }

    /// Persist the order linkage, scoped by slug so services never collide.
    fn persist(store: &BookingStore, slug: &ServiceSlug, order: &Order) {
        store.put(&keys::order_id(slug), order.id.as_str());
        store.put(&keys::order_ref(slug), order.reference.as_str());
    }
}
