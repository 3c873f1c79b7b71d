//! Utility command handlers
//!
//! Handles: ping, uptime, version, roll
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::SlashCommandHandler;
use crate::commands::handlers::respond_text;
use crate::commands::slash::get_integer_option;

/// Handler for miscellaneous utility commands
pub struct UtilityHandler;

#[async_trait]
impl SlashCommandHandler for UtilityHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["ping", "uptime", "version", "roll"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let reply = match command.data.name.as_str() {
            "ping" => "🏓 Pong!".to_string(),
            "uptime" => format!("⏱️ Up for {}", format_uptime(ctx.start_time.elapsed().as_secs())),
            "version" => format!("🤖 Harmony v{}", env!("CARGO_PKG_VERSION")),
            "roll" => {
                let sides = get_integer_option(&command.data.options, "sides")
                    .unwrap_or(6)
                    .clamp(2, 1000);
                let rolled = rand::rng().random_range(1..=sides);
                format!("🎲 Rolled a d{sides}: **{rolled}**")
            }
            _ => return Ok(()),
        };

        respond_text(serenity_ctx, command, reply).await
    }
}

/// Render seconds as "Xd Yh Zm Ws", skipping leading zero units
fn format_uptime(total_seconds: u64) -> String {
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 || !parts.is_empty() {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 || !parts.is_empty() {
        parts.push(format!("{minutes}m"));
    }
    parts.push(format!("{seconds}s"));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utility_handler_commands() {
        let handler = UtilityHandler;
        assert_eq!(handler.command_names().len(), 4);
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(5), "5s");
        assert_eq!(format_uptime(65), "1m 5s");
        assert_eq!(format_uptime(3_665), "1h 1m 5s");
        assert_eq!(format_uptime(90_065), "1d 1h 1m 5s");
        assert_eq!(format_uptime(86_400), "1d 0h 0m 0s");
    }
}
