//! Key schema for the booking store.
//!
//! Global keys carry authentication state and survive booking completion.
//! Slug-scoped keys (`<name>.<slug>`) carry one booking's transient state so
//! two services never collide on the same customer session.

use fernhill_core::ServiceSlug;

/// Customer bearer token for the platform API. Global; never purged by
/// booking completion.
pub const AUTH_TOKEN: &str = "auth_token";

/// Cached customer profile (JSON [`crate::platform::UserProfile`]). Global.
pub const CURRENT_USER: &str = "current_user";

/// Draft order id for a service.
#[must_use]
pub fn order_id(slug: &ServiceSlug) -> String {
    format!("order_id.{slug}")
}

/// Draft order reference code for a service, used to recover a draft when
/// the cached id is lost.
#[must_use]
pub fn order_ref(slug: &ServiceSlug) -> String {
    format!("order_ref.{slug}")
}

/// Finalized marker for a service. The value is the paid order's id.
///
/// Present means "payment succeeded; never mutate this order implicitly".
/// Survives the completion purge.
#[must_use]
pub fn finalized(slug: &ServiceSlug) -> String {
    format!("finalized.{slug}")
}

/// Persisted wizard step for a service.
#[must_use]
pub fn booking_step(slug: &ServiceSlug) -> String {
    format!("booking_step.{slug}")
}

/// Questionnaire answers for a service (JSON
/// [`crate::platform::QuestionnaireAnswers`]).
#[must_use]
pub fn questionnaire(slug: &ServiceSlug) -> String {
    format!("questionnaire.{slug}")
}

/// Selected appointment window for a service (JSON
/// [`crate::orders::AppointmentWindow`]).
#[must_use]
pub fn appointment(slug: &ServiceSlug) -> String {
    format!("appointment.{slug}")
}

/// Cart contents for a service (JSON [`crate::cart::Cart`]).
#[must_use]
pub fn cart(slug: &ServiceSlug) -> String {
    format!("cart.{slug}")
}

/// Slug-scoped keys removed when a booking completes.
///
/// The finalized marker is deliberately absent: it is the guard that keeps
/// a completed booking's order immutable afterwards.
pub const PURGED_ON_COMPLETION: &[fn(&ServiceSlug) -> String] = &[
    order_id,
    order_ref,
    booking_step,
    questionnaire,
    appointment,
    cart,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_slug_scoped() {
        let slug = ServiceSlug::new("acne");
        assert_eq!(order_id(&slug), "order_id.acne");
        assert_eq!(order_ref(&slug), "order_ref.acne");
        assert_eq!(finalized(&slug), "finalized.acne");
        assert_eq!(booking_step(&slug), "booking_step.acne");
        assert_eq!(questionnaire(&slug), "questionnaire.acne");
        assert_eq!(appointment(&slug), "appointment.acne");
        assert_eq!(cart(&slug), "cart.acne");
    }

    #[test]
    fn test_purge_set_excludes_finalized() {
        let slug = ServiceSlug::new("acne");
        let purged: Vec<String> = PURGED_ON_COMPLETION.iter().map(|f| f(&slug)).collect();
        assert!(!purged.contains(&finalized(&slug)));
        assert!(purged.contains(&order_id(&slug)));
    }
}
