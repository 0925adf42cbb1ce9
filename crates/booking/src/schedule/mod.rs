//! Appointment schedules and slot generation.

pub mod slots;

pub use slots::{
    DateOverride, DaySlots, DayWindow, ScheduleDef, Slot, WeeklyHours, slots_for_date,
};
