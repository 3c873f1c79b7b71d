//! # Reminders Feature
//!
//! Scheduled reminders with optional fixed-interval recurrence.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true

pub mod engine;
pub mod notifier;

pub use engine::{
    parse_time_input, NewReminder, RecurrencePattern, Reminder, ReminderEngine, ReminderNotifier,
    ReminderStatus, ReminderStore, SCAN_INTERVAL,
};
pub use notifier::DiscordReminderNotifier;
