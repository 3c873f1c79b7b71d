//! Shared context for command handlers
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use std::sync::Arc;

use crate::database::Database;
use crate::features::music::PlaybackScheduler;
use crate::features::weather::WeatherClient;

/// Services shared by every command handler
#[derive(Clone)]
pub struct CommandContext {
    pub database: Database,
    pub scheduler: Arc<PlaybackScheduler>,
    pub weather: WeatherClient,
    /// Cap on active reminders per user, from config
    pub max_reminders_per_user: usize,
    /// Process start, for the uptime command
    pub start_time: std::time::Instant,
}

impl CommandContext {
    pub fn new(
        database: Database,
        scheduler: Arc<PlaybackScheduler>,
        weather: WeatherClient,
        max_reminders_per_user: usize,
    ) -> Self {
        CommandContext {
            database,
            scheduler,
            weather,
            max_reminders_per_user,
            start_time: std::time::Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_context_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<CommandContext>();
    }
}
