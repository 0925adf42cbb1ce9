//! Draft order coordinator tests against the mock platform.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::Ordering;

use fernhill_booking::orders::BookingError;
use fernhill_booking::platform::PlatformError;
use fernhill_booking::store::{BookingStore, keys};
use fernhill_core::ServiceSlug;
use fernhill_integration_tests::{MockPlatform, ensure_request};

#[tokio::test]
async fn concurrent_ensure_calls_collapse_to_one_create() {
    let mock = MockPlatform::spawn().await;
    // Widen the race window so stragglers arrive while the first create is
    // still in flight.
    mock.state.create_delay_ms.store(100, Ordering::SeqCst);

    let coordinator = mock.coordinator();
    let store = Arc::new(BookingStore::in_memory());

    let mut handles = Vec::new();
    for _ in 0..5 {
        let coordinator = coordinator.clone();
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            coordinator
                .ensure_draft_order(&store, ensure_request("hair-loss"))
                .await
                .unwrap()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }

    // All callers resolved to the same order id...
    let first = ids[0].clone();
    assert!(ids.iter().all(|id| *id == first));

    // ...and exactly one create/update sequence hit the network.
    assert_eq!(mock.state.mutation_calls(), (1, 0));
}

#[tokio::test]
async fn second_ensure_updates_instead_of_creating() {
    let mock = MockPlatform::spawn().await;
    let coordinator = mock.coordinator();
    let store = BookingStore::in_memory();

    let first = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();
    assert_eq!(mock.state.mutation_calls(), (1, 0));

    let second = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(mock.state.mutation_calls(), (1, 1));
}

#[tokio::test]
async fn separate_slugs_get_separate_orders() {
    let mock = MockPlatform::spawn().await;
    let coordinator = mock.coordinator();
    let store = BookingStore::in_memory();

    let hair = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();
    let acne = coordinator
        .ensure_draft_order(&store, ensure_request("acne"))
        .await
        .unwrap();

    assert_ne!(hair, acne);
    assert_eq!(mock.state.mutation_calls(), (2, 0));
}

#[tokio::test]
async fn not_found_on_update_recreates_the_order() {
    let mock = MockPlatform::spawn().await;
    let coordinator = mock.coordinator();
    let store = BookingStore::in_memory();
    let slug = ServiceSlug::new("hair-loss");

    let first = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();

    // Platform-side deletion: the update 404s, reference recovery misses,
    // and a fresh order is created.
    mock.state.delete_order(first.as_str());

    let second = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(mock.state.mutation_calls(), (2, 1));
    // The new linkage is persisted
    assert_eq!(
        store.get(&keys::order_id(&slug)).as_deref(),
        Some(second.as_str())
    );
}

#[tokio::test]
async fn ambiguous_update_failure_does_not_create_a_duplicate() {
    let mock = MockPlatform::spawn().await;
    let coordinator = mock.coordinator();
    let store = BookingStore::in_memory();
    let slug = ServiceSlug::new("hair-loss");

    let first = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();

    // A 500 on update is not a 404: it must propagate without touching the
    // cached linkage or creating a second order.
    mock.state.fail_update_status.store(500, Ordering::SeqCst);

    let err = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap_err();
    match err.root() {
        BookingError::Upstream(PlatformError::Api { status, .. }) => assert_eq!(*status, 500),
        other => panic!("expected upstream 500, got {other:?}"),
    }

    assert_eq!(mock.state.create_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        store.get(&keys::order_id(&slug)).as_deref(),
        Some(first.as_str())
    );

    // Once the platform recovers, the same order is updated in place.
    mock.state.fail_update_status.store(0, Ordering::SeqCst);
    let again = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();
    assert_eq!(first, again);
    assert_eq!(mock.state.create_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn lost_id_recovers_by_reference_before_creating() {
    let mock = MockPlatform::spawn().await;
    let coordinator = mock.coordinator();
    let store = BookingStore::in_memory();
    let slug = ServiceSlug::new("hair-loss");

    let first = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();

    // The cached id is lost but the reference survives (e.g., one storage
    // tier was wiped).
    store.remove(&keys::order_id(&slug));
    assert!(store.get(&keys::order_ref(&slug)).is_some());

    let second = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();

    assert_eq!(first, second);
    // Recovered via lookup + update; no second create
    assert_eq!(mock.state.create_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn finalized_slug_never_issues_a_mutation() {
    let mock = MockPlatform::spawn().await;
    let coordinator = mock.coordinator();
    let store = BookingStore::in_memory();
    let slug = ServiceSlug::new("hair-loss");

    let id = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();

    fernhill_booking::orders::DraftOrderCoordinator::finalize(&store, &slug, &id);
    let before = mock.state.mutation_calls();

    // A stray back-navigation re-enters the wizard; the finalized id comes
    // back with zero network mutations, whatever the cart contains.
    let again = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();

    assert_eq!(again, id);
    assert_eq!(mock.state.mutation_calls(), before);
}

#[tokio::test]
async fn order_metadata_snapshot_reaches_the_platform() {
    let mock = MockPlatform::spawn().await;
    let coordinator = mock.coordinator();
    let store = BookingStore::in_memory();

    let id = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();

    let order: fernhill_booking::platform::Order = serde_json::from_value(
        mock.state
            .orders
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .unwrap(),
    )
    .unwrap();

    let metadata = order.metadata.unwrap();
    assert_eq!(metadata.subtotal_minor, 1000); // 2 × 500
    assert_eq!(metadata.total_minor, 1000);
    assert_eq!(metadata.line_items.len(), 1);
    assert_eq!(metadata.line_items[0].quantity, 2);
    let shipping = metadata.shipping.unwrap();
    assert_eq!(shipping.recipient, "Jo Bloggs");
    assert_eq!(shipping.address.line1, "1 Home St");
    assert!(order.reference.as_str().starts_with("FH-"));
}
