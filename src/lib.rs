// Core layer - configuration, embeds, message helpers
pub mod core;

// Features layer - all feature modules
pub mod features;

// Infrastructure
pub mod database;

// Application layer
pub mod command_handler;
pub mod commands;

// Re-export the most commonly used items
pub use core::Config;
pub use database::Database;
pub use features::{PlaybackScheduler, ReminderEngine, WeatherClient};
