//! Environment-backed bot configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::{Context, Result};

/// Runtime configuration loaded from environment variables (.env supported)
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token (required)
    pub discord_token: String,
    /// Guild ID for instant command registration during development
    pub discord_guild_id: Option<String>,
    /// Path to the sqlite database file
    pub database_path: String,
    /// Default log filter when RUST_LOG is not set
    pub log_level: String,
    /// WeatherAPI key; weather commands degrade gracefully without it
    pub weather_api_key: Option<String>,
    /// Volume applied to a fresh playback session, 0.0..=1.0
    pub default_volume: f32,
    /// Maximum tracks waiting in a single guild's queue
    pub max_queue_size: usize,
    /// Maximum active reminders per user
    pub max_reminders_per_user: usize,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Only `DISCORD_TOKEN` is required; everything else has a sensible
    /// default or is optional.
    pub fn from_env() -> Result<Self> {
        let discord_token = std::env::var("DISCORD_TOKEN")
            .context("DISCORD_TOKEN environment variable is required")?;

        let discord_guild_id = std::env::var("DISCORD_GUILD_ID").ok().filter(|s| !s.is_empty());
        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "data/harmony.db".to_string());
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let weather_api_key = std::env::var("WEATHER_API_KEY").ok().filter(|s| !s.is_empty());

        let default_volume = std::env::var("DEFAULT_VOLUME")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(0.5)
            .clamp(0.0, 1.0);

        let max_queue_size = std::env::var("MAX_QUEUE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);

        let max_reminders_per_user = std::env::var("MAX_REMINDERS_PER_USER")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(50);

        Ok(Config {
            discord_token,
            discord_guild_id,
            database_path,
            log_level,
            weather_api_key,
            default_volume,
            max_queue_size,
            max_reminders_per_user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state, so they all run through this guard
    // to avoid interleaving with each other under the parallel test runner.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn clear_env() {
        for key in [
            "DISCORD_TOKEN",
            "DISCORD_GUILD_ID",
            "DATABASE_PATH",
            "LOG_LEVEL",
            "WEATHER_API_KEY",
            "DEFAULT_VOLUME",
            "MAX_QUEUE_SIZE",
            "MAX_REMINDERS_PER_USER",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        assert!(Config::from_env().is_err());
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("DISCORD_TOKEN", "token");

        let config = Config::from_env().unwrap();
        assert_eq!(config.database_path, "data/harmony.db");
        assert_eq!(config.log_level, "info");
        assert!(config.weather_api_key.is_none());
        assert!((config.default_volume - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.max_queue_size, 100);
        assert_eq!(config.max_reminders_per_user, 50);
    }

    #[test]
    fn test_volume_is_clamped() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("DISCORD_TOKEN", "token");
        std::env::set_var("DEFAULT_VOLUME", "3.0");

        let config = Config::from_env().unwrap();
        assert!((config.default_volume - 1.0).abs() < f32::EPSILON);
    }
}
