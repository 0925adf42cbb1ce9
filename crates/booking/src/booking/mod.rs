//! Booking wizard state.

pub mod steps;

pub use steps::{BookingFlow, BookingStep, StepBlocked, StepContext, StepSequence};
