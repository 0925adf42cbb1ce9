//! Booking wizard step machine.
//!
//! Steps run `treatments → [login] → questionnaire → calendar → payment →
//! success`. The login step is structurally removed from the sequence when
//! the session is already authenticated - it is never visited, not skipped
//! at runtime.
//!
//! Forward transitions are guarded per origin step; backward transitions
//! are always allowed while not on the first step. The current step is
//! persisted per service slug after every transition and repaired on
//! restore if the authentication state changed since it was written.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fernhill_core::ServiceSlug;

use crate::store::{BookingStore, keys};

/// A wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    Treatments,
    Login,
    Questionnaire,
    Calendar,
    Payment,
    Success,
}

impl BookingStep {
    /// Stable storage key for the step.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Treatments => "treatments",
            Self::Login => "login",
            Self::Questionnaire => "questionnaire",
            Self::Calendar => "calendar",
            Self::Payment => "payment",
            Self::Success => "success",
        }
    }

    /// Parse a stored step key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "treatments" => Some(Self::Treatments),
            "login" => Some(Self::Login),
            "questionnaire" => Some(Self::Questionnaire),
            "calendar" => Some(Self::Calendar),
            "payment" => Some(Self::Payment),
            "success" => Some(Self::Success),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// The ordered step sequence for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSequence(Vec<BookingStep>);

impl StepSequence {
    /// Build the sequence for a session's authentication state.
    ///
    /// Authenticated sessions get a sequence with no login step at all.
    #[must_use]
    pub fn for_auth(authenticated: bool) -> Self {
        let mut steps = vec![BookingStep::Treatments];
        if !authenticated {
            steps.push(BookingStep::Login);
        }
        steps.extend([
            BookingStep::Questionnaire,
            BookingStep::Calendar,
            BookingStep::Payment,
            BookingStep::Success,
        ]);
        Self(steps)
    }

    /// The steps in order.
    #[must_use]
    pub fn steps(&self) -> &[BookingStep] {
        &self.0
    }

    /// Index of a step within this sequence.
    #[must_use]
    pub fn position(&self, step: BookingStep) -> Option<usize> {
        self.0.iter().position(|s| *s == step)
    }

    fn get(&self, index: usize) -> Option<BookingStep> {
        self.0.get(index).copied()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// Session facts the guards need.
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    pub cart_empty: bool,
    pub authenticated: bool,
}

/// A blocked forward transition. The message is user-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StepBlocked {
    #[error("Select at least one treatment to continue")]
    EmptyCart,
    #[error("Log in or create an account to continue")]
    NotAuthenticated,
    #[error("You have completed this booking")]
    Completed,
}

/// The wizard position for one service booking.
#[derive(Debug, Clone)]
pub struct BookingFlow {
    slug: ServiceSlug,
    sequence: StepSequence,
    current: usize,
}

impl BookingFlow {
    /// Start a fresh flow at the first step.
    #[must_use]
    pub fn start(slug: ServiceSlug, authenticated: bool) -> Self {
        Self {
            slug,
            sequence: StepSequence::for_auth(authenticated),
            current: 0,
        }
    }

    /// Restore the persisted flow for a slug, repairing stale state.
    ///
    /// Repairs:
    /// - a restored `login` step while already authenticated advances to
    ///   the step after login
    /// - a restored non-initial, non-login step while unauthenticated is
    ///   forced back to `login`
    #[must_use]
    pub fn restore(store: &BookingStore, slug: ServiceSlug, authenticated: bool) -> Self {
        let mut flow = Self::start(slug.clone(), authenticated);

        let Some(stored) = store
            .get(&keys::booking_step(&slug))
            .and_then(|raw| BookingStep::from_key(&raw))
        else {
            return flow;
        };

        let repaired = match stored {
            BookingStep::Login if authenticated => BookingStep::Questionnaire,
            step if !authenticated && step != BookingStep::Treatments => {
                if step == BookingStep::Login {
                    step
                } else {
                    BookingStep::Login
                }
            }
            step => step,
        };

        flow.current = flow.sequence.position(repaired).unwrap_or(0);
        if repaired != stored {
            flow.persist(store);
        }
        flow
    }

    /// The service this flow belongs to.
    #[must_use]
    pub const fn slug(&self) -> &ServiceSlug {
        &self.slug
    }

    /// The active step.
    #[must_use]
    pub fn current(&self) -> BookingStep {
        self.sequence.get(self.current).unwrap_or(BookingStep::Treatments)
    }

    /// The sequence this session walks.
    #[must_use]
    pub const fn sequence(&self) -> &StepSequence {
        &self.sequence
    }

    /// Advance to the next step, enforcing the origin step's guard.
    ///
    /// Entering `success` purges the slug's transient state (never the
    /// authentication keys).
    ///
    /// # Errors
    ///
    /// Returns `StepBlocked` and leaves the state unchanged when a guard
    /// fails or the flow is already complete.
    pub fn advance(
        &mut self,
        store: &BookingStore,
        ctx: StepContext,
    ) -> Result<BookingStep, StepBlocked> {
        match self.current() {
            BookingStep::Treatments if ctx.cart_empty => return Err(StepBlocked::EmptyCart),
            BookingStep::Login if !ctx.authenticated => return Err(StepBlocked::NotAuthenticated),
            BookingStep::Success => return Err(StepBlocked::Completed),
            _ => {}
        }

        if self.current + 1 >= self.sequence.len() {
            return Err(StepBlocked::Completed);
        }
        self.current += 1;

        if self.current() == BookingStep::Success {
            store.clear_booking(&self.slug);
        }
        self.persist(store);
        Ok(self.current())
    }

    /// Step back. No guard; a no-op on the first step.
    pub fn back(&mut self, store: &BookingStore) -> BookingStep {
        if self.current > 0 {
            self.current -= 1;
            self.persist(store);
        }
        self.current()
    }

    /// React to authentication completing.
    ///
    /// Rebuilds the sequence without the login step; if the customer was
    /// sitting on `login`, they are force-advanced to the step that follows
    /// it, without another explicit "next".
    pub fn on_authenticated(&mut self, store: &BookingStore) {
        let was_login = self.current() == BookingStep::Login;
        let current = self.current();
        self.sequence = StepSequence::for_auth(true);
        self.current = if was_login {
            self.sequence
                .position(BookingStep::Questionnaire)
                .unwrap_or(0)
        } else {
            self.sequence.position(current).unwrap_or(0)
        };
        self.persist(store);
    }

    /// Jump straight to `success` after a confirmed payment, running the
    /// completion purge.
    pub fn complete(&mut self, store: &BookingStore) {
        store.clear_booking(&self.slug);
        self.current = self
            .sequence
            .position(BookingStep::Success)
            .unwrap_or(self.sequence.len().saturating_sub(1));
        self.persist(store);
    }

    /// Durably record the current step, keyed by slug.
    fn persist(&self, store: &BookingStore) {
        store.put(&keys::booking_step(&self.slug), self.current().key());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn slug() -> ServiceSlug {
        ServiceSlug::new("weight-loss")
    }

    #[test]
    fn test_sequence_drops_login_when_authenticated() {
        let anon = StepSequence::for_auth(false);
        assert_eq!(
            anon.steps(),
            &[
                BookingStep::Treatments,
                BookingStep::Login,
                BookingStep::Questionnaire,
                BookingStep::Calendar,
                BookingStep::Payment,
                BookingStep::Success,
            ]
        );

        let authed = StepSequence::for_auth(true);
        assert!(authed.position(BookingStep::Login).is_none());
        assert_eq!(authed.steps().len(), 5);
    }

    #[test]
    fn test_advance_blocked_on_empty_cart() {
        let store = BookingStore::in_memory();
        let mut flow = BookingFlow::start(slug(), false);

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
        // No state change on a blocked transition
        assert_eq!(flow.current(), BookingStep::Treatments);
        assert_eq!(err.to_string(), "Select at least one treatment to continue");
    }

    #[test]
    fn test_advance_blocked_on_login_without_auth() {
        let store = BookingStore::in_memory();
        let mut flow = BookingFlow::start(slug(), false);
        flow.advance(
            &store,
            StepContext {
                cart_empty: false,
                authenticated: false,
            },
        )
        .unwrap();
        assert_eq!(flow.current(), BookingStep::Login);

        let err = flow
            .advance(
                &store,
                StepContext {
                    cart_empty: false,
                    authenticated: false,
                },
            )
            .unwrap_err();
        assert_eq!(err, StepBlocked::NotAuthenticated);
        assert_eq!(flow.current(), BookingStep::Login);
    }

    #[test]
    fn test_login_completion_auto_advances() {
        let store = BookingStore::in_memory();
        let mut flow = BookingFlow::start(slug(), false);
        flow.advance(
            &store,
            StepContext {
                cart_empty: false,
                authenticated: false,
            },
        )
        .unwrap();
        assert_eq!(flow.current(), BookingStep::Login);

        // Authentication completes while sitting on login: the machine
        // advances past login without another "next".
        flow.on_authenticated(&store);
        assert_eq!(flow.current(), BookingStep::Questionnaire);
        assert!(flow.sequence().position(BookingStep::Login).is_none());
    }

    #[test]
    fn test_back_is_unguarded_until_first_step() {
        let store = BookingStore::in_memory();
        let mut flow = BookingFlow::start(slug(), true);
        flow.advance(
            &store,
            StepContext {
                cart_empty: false,
                authenticated: true,
            },
        )
        .unwrap();
        assert_eq!(flow.current(), BookingStep::Questionnaire);

        assert_eq!(flow.back(&store), BookingStep::Treatments);
        // Already at the first step: no-op
        assert_eq!(flow.back(&store), BookingStep::Treatments);
    }

    #[test]
    fn test_entering_success_purges_transient_state() {
        let store = BookingStore::in_memory();
        store.put(keys::AUTH_TOKEN, "tok_1");
        store.put(&keys::order_id(&slug()), "ord_1");
        store.put(&keys::questionnaire(&slug()), "{}");

        let mut flow = BookingFlow::start(slug(), true);
        let ctx = StepContext {
            cart_empty: false,
            authenticated: true,
        };
        // treatments → questionnaire → calendar → payment → success
        for _ in 0..4 {
            flow.advance(&store, ctx).unwrap();
        }
        assert_eq!(flow.current(), BookingStep::Success);

        assert_eq!(store.get(&keys::order_id(&slug())), None);
        assert_eq!(store.get(&keys::questionnaire(&slug())), None);
        // Never the auth keys
        assert_eq!(store.get(keys::AUTH_TOKEN).as_deref(), Some("tok_1"));
    }

    #[test]
    fn test_advance_past_success_is_blocked() {
        let store = BookingStore::in_memory();
        let mut flow = BookingFlow::start(slug(), true);
        let ctx = StepContext {
            cart_empty: false,
            authenticated: true,
        };
        for _ in 0..4 {
            flow.advance(&store, ctx).unwrap();
        }
        assert_eq!(flow.advance(&store, ctx).unwrap_err(), StepBlocked::Completed);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let store = BookingStore::in_memory();
        let mut flow = BookingFlow::start(slug(), true);
        flow.advance(
            &store,
            StepContext {
                cart_empty: false,
                authenticated: true,
            },
        )
        .unwrap();
        assert_eq!(flow.current(), BookingStep::Questionnaire);

        let restored = BookingFlow::restore(&store, slug(), true);
        assert_eq!(restored.current(), BookingStep::Questionnaire);
    }

    #[test]
    fn test_restore_repairs_login_when_already_authenticated() {
        let store = BookingStore::in_memory();
        store.put(&keys::booking_step(&slug()), BookingStep::Login.key());

        let flow = BookingFlow::restore(&store, slug(), true);
        assert_eq!(flow.current(), BookingStep::Questionnaire);
        // The repair is persisted back
        assert_eq!(
            store.get(&keys::booking_step(&slug())).as_deref(),
            Some("questionnaire")
        );
    }

    #[test]
    fn test_restore_forces_login_when_unauthenticated() {
        let store = BookingStore::in_memory();
        store.put(&keys::booking_step(&slug()), BookingStep::Payment.key());

        let flow = BookingFlow::restore(&store, slug(), false);
        assert_eq!(flow.current(), BookingStep::Login);
    }

    #[test]
    fn test_restore_keeps_treatments_when_unauthenticated() {
        let store = BookingStore::in_memory();
        store.put(&keys::booking_step(&slug()), BookingStep::Treatments.key());

        let flow = BookingFlow::restore(&store, slug(), false);
        assert_eq!(flow.current(), BookingStep::Treatments);
    }

    #[test]
    fn test_restore_with_no_stored_step_starts_fresh() {
        let store = BookingStore::in_memory();
        let flow = BookingFlow::restore(&store, slug(), false);
        assert_eq!(flow.current(), BookingStep::Treatments);
    }

    #[test]
    fn test_complete_jumps_to_success_and_purges() {
        let store = BookingStore::in_memory();
        store.put(&keys::cart(&slug()), "{}");

        let mut flow = BookingFlow::start(slug(), true);
        flow.complete(&store);
        assert_eq!(flow.current(), BookingStep::Success);
        assert_eq!(store.get(&keys::cart(&slug())), None);
    }

    #[test]
    fn test_step_key_roundtrip() {
        for step in [
            BookingStep::Treatments,
            BookingStep::Login,
            BookingStep::Questionnaire,
            BookingStep::Calendar,
            BookingStep::Payment,
            BookingStep::Success,
        ] {
            assert_eq!(BookingStep::from_key(step.key()), Some(step));
        }
        assert_eq!(BookingStep::from_key("bogus"), None);
    }
}
