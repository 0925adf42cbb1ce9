//! End-to-end wizard and payment confirmation scenarios.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::Ordering;

use chrono::{Duration, Utc};
use fernhill_booking::booking::{BookingFlow, BookingStep, StepBlocked, StepContext};
use fernhill_booking::cart::Cart;
use fernhill_booking::orders::AppointmentWindow;
use fernhill_booking::payment::PaymentCoordinator;
use fernhill_booking::platform::PaymentOutcome;
use fernhill_booking::store::{BookingStore, keys};
use fernhill_core::{CurrencyCode, ScheduleId, ServiceSlug};
use fernhill_integration_tests::{MockPlatform, ensure_request, test_medicine};

fn slug() -> ServiceSlug {
    ServiceSlug::new("hair-loss")
}

#[test]
fn anonymous_wizard_walk_with_guards_and_auto_advance() {
    let store = BookingStore::in_memory();
    let mut flow = BookingFlow::start(slug(), false);

    // Empty cart blocks the first forward transition with a message.
    let err = flow
        .advance(
            &store,
            StepContext {
                cart_empty: true,
                authenticated: false,
            },
        )
        .unwrap_err();
    assert_eq!(err, StepBlocked::EmptyCart);
    assert_eq!(flow.current(), BookingStep::Treatments);

    // Adding one item unblocks navigation to login.
    let mut cart = Cart::new(CurrencyCode::GBP);
    cart.add(&test_medicine(), 1).unwrap();
    store.put_json(&keys::cart(&slug()), &cart);

    flow.advance(
        &store,
        StepContext {
            cart_empty: false,
            authenticated: false,
        },
    )
    .unwrap();
    assert_eq!(flow.current(), BookingStep::Login);

    // Login completes: the machine advances past login on its own.
    store.put(keys::AUTH_TOKEN, "tok_test");
    flow.on_authenticated(&store);
    assert_eq!(flow.current(), BookingStep::Questionnaire);
}

#[tokio::test]
async fn payment_test_success_finalizes_and_locks_the_order() {
    let mock = MockPlatform::spawn().await;
    let coordinator = mock.coordinator();
    let payments = PaymentCoordinator::new(mock.client(), None, None);
    let store = BookingStore::in_memory();

    // Reach payment with a draft order and a selected slot.
    let order_id = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();
    let start_time = Utc::now() + Duration::days(1);
    store.put_json(
        &keys::appointment(&slug()),
        &AppointmentWindow {
            schedule_id: ScheduleId::new("sch_1"),
            start_time,
            end_time: start_time + Duration::minutes(15),
        },
    );

    let mut flow = BookingFlow::restore(&store, slug(), true);
    let step = payments
        .confirm(&store, &mut flow, &order_id, PaymentOutcome::Approved)
        .await
        .unwrap();
    assert_eq!(step, BookingStep::Success);

    // The order was marked paid and the slug finalized.
    assert_eq!(
        mock.state.payment_status(order_id.as_str()).as_deref(),
        Some("paid")
    );
    assert_eq!(
        store.get(&keys::finalized(&slug())).as_deref(),
        Some(order_id.as_str())
    );

    // Cart and transient state are gone; the appointment was booked.
    assert_eq!(store.get(&keys::cart(&slug())), None);
    assert_eq!(mock.state.appointments.lock().unwrap().len(), 1);

    // The confirmation email went out with the invoice attached.
    let emails = mock.state.emails.lock().unwrap().clone();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0]["to"], "jo@example.com");
    assert!(!emails[0]["attachment"].is_null());
    assert!(
        emails[0]["attachment"]["filename"]
            .as_str()
            .unwrap()
            .starts_with("invoice-")
    );

    // A stray back-navigation re-enters the wizard: same order id, zero
    // further mutations.
    let before = mock.state.mutation_calls();
    let again = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();
    assert_eq!(again, order_id);
    assert_eq!(mock.state.mutation_calls(), before);
}

#[tokio::test]
async fn confirmation_email_retries_without_attachment() {
    let mock = MockPlatform::spawn().await;
    let coordinator = mock.coordinator();
    let payments = PaymentCoordinator::new(mock.client(), None, None);
    let store = BookingStore::in_memory();

    let order_id = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();

    // The email endpoint rejects attachments (e.g., size policy): the
    // confirmation must retry once without and still succeed.
    mock.state.fail_attachment_email.store(true, Ordering::SeqCst);

    let mut flow = BookingFlow::restore(&store, slug(), true);
    let step = payments
        .confirm(&store, &mut flow, &order_id, PaymentOutcome::Captured)
        .await
        .unwrap();
    assert_eq!(step, BookingStep::Success);

    assert_eq!(mock.state.email_calls.load(Ordering::SeqCst), 2);
    let emails = mock.state.emails.lock().unwrap().clone();
    assert_eq!(emails.len(), 1);
    assert!(emails[0]["attachment"].is_null());
}

#[tokio::test]
async fn declined_payment_leaves_the_draft_mutable() {
    let mock = MockPlatform::spawn().await;
    let coordinator = mock.coordinator();
    let payments = PaymentCoordinator::new(mock.client(), None, None);
    let store = BookingStore::in_memory();

    let order_id = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();

    let mut flow = BookingFlow::restore(&store, slug(), true);
    payments
        .confirm(&store, &mut flow, &order_id, PaymentOutcome::Declined)
        .await
        .unwrap_err();

    // Nothing was finalized; a retry still updates the same draft.
    assert_eq!(store.get(&keys::finalized(&slug())), None);
    assert_eq!(mock.state.mark_paid_calls.load(Ordering::SeqCst), 0);

    let again = coordinator
        .ensure_draft_order(&store, ensure_request("hair-loss"))
        .await
        .unwrap();
    assert_eq!(again, order_id);
    assert_eq!(mock.state.mutation_calls(), (1, 1));
}
