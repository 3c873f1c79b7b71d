//! # Features Layer
//!
//! Each submodule is one user-facing feature; cross-feature sharing goes
//! through `core` and `database` only.

pub mod music;
pub mod reminders;
pub mod weather;

pub use music::{PlaybackScheduler, Track};
pub use reminders::ReminderEngine;
pub use weather::WeatherClient;
