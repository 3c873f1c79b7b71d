//! Event management command handlers
//!
//! Handles: create_event, events, event_info, join_event, leave_event
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use log::info;
use serenity::builder::CreateEmbed;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::SlashCommandHandler;
use crate::commands::handlers::{respond_embed, respond_text};
use crate::commands::slash::{get_integer_option, get_string_option};
use crate::core::embeds::{colors, event_embed};

/// Accepted event date formats, tried in order
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M", "%d/%m/%Y %H:%M"];

fn parse_event_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Handler for event management commands
pub struct EventsHandler;

#[async_trait]
impl SlashCommandHandler for EventsHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["create_event", "events", "event_info", "join_event", "leave_event"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let Some(guild_id) = command.guild_id else {
            return respond_text(serenity_ctx, command, "❌ Events only work inside a server.")
                .await;
        };
        let guild_id = guild_id.0;

        match command.data.name.as_str() {
            "create_event" => self.handle_create(&ctx, serenity_ctx, command, guild_id).await,
            "events" => self.handle_list(&ctx, serenity_ctx, command, guild_id).await,
            "event_info" => self.handle_info(&ctx, serenity_ctx, command).await,
            "join_event" => self.handle_join(&ctx, serenity_ctx, command).await,
            "leave_event" => self.handle_leave(&ctx, serenity_ctx, command).await,
            _ => Ok(()),
        }
    }
}

impl EventsHandler {
    async fn handle_create(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        guild_id: u64,
    ) -> Result<()> {
        let title = get_string_option(&command.data.options, "title")
            .ok_or_else(|| anyhow::anyhow!("Missing title parameter"))?;
        let date_str = get_string_option(&command.data.options, "date")
            .ok_or_else(|| anyhow::anyhow!("Missing date parameter"))?;
        let description = get_string_option(&command.data.options, "description");
        let max_participants = get_integer_option(&command.data.options, "max_participants");

        let Some(event_date) = parse_event_date(&date_str) else {
            return respond_text(
                serenity_ctx,
                command,
                "❌ Invalid date format. Use `YYYY-MM-DD HH:MM` or `DD/MM/YYYY HH:MM`.",
            )
            .await;
        };

        if event_date <= Utc::now() {
            return respond_text(serenity_ctx, command, "❌ The event date must be in the future.")
                .await;
        }

        let event_id = ctx
            .database
            .create_event(
                &title,
                description.as_deref(),
                command.user.id.0,
                guild_id,
                command.channel_id.0,
                event_date,
                max_participants.unwrap_or(-1),
            )
            .await?;

        info!("Created event {event_id} '{title}' in guild {guild_id}");

        match ctx.database.get_event(event_id).await? {
            Some(event) => respond_embed(serenity_ctx, command, event_embed(&event, 0)).await,
            None => respond_text(serenity_ctx, command, format!("🎉 Created event #{event_id}."))
                .await,
        }
    }

    async fn handle_list(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        guild_id: u64,
    ) -> Result<()> {
        let events = ctx.database.get_guild_events(guild_id).await?;

        if events.is_empty() {
            return respond_text(
                serenity_ctx,
                command,
                "🎉 No upcoming events. Create one with `/create_event`!",
            )
            .await;
        }

        let mut embed = CreateEmbed::default();
        embed.title("🎉 Upcoming events").color(colors::EVENT);

        for event in events.iter().take(10) {
            embed.field(
                format!("#{} {}", event.id, event.title),
                format!("📅 {}", event.event_date.format("%d/%m/%Y %H:%M UTC")),
                false,
            );
        }

        if events.len() > 10 {
            embed.footer(|f| f.text(format!("Showing 10/{} events", events.len())));
        }

        respond_embed(serenity_ctx, command, embed).await
    }

    async fn handle_info(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let event_id = get_integer_option(&command.data.options, "id")
            .ok_or_else(|| anyhow::anyhow!("Missing id parameter"))?;

        let Some(event) = ctx.database.get_event(event_id).await? else {
            return respond_text(serenity_ctx, command, format!("❌ Event #{event_id} not found."))
                .await;
        };

        let participants = ctx.database.get_event_participants(event_id).await?;
        let mut embed = event_embed(&event, participants.len());
        if !participants.is_empty() {
            let mentions: Vec<String> =
                participants.iter().take(20).map(|id| format!("<@{id}>")).collect();
            embed.field("🙋 Joined", mentions.join(" "), false);
        }

        respond_embed(serenity_ctx, command, embed).await
    }

    async fn handle_join(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let event_id = get_integer_option(&command.data.options, "id")
            .ok_or_else(|| anyhow::anyhow!("Missing id parameter"))?;
        let user_id = command.user.id.0;

        let Some(event) = ctx.database.get_event(event_id).await? else {
            return respond_text(serenity_ctx, command, format!("❌ Event #{event_id} not found."))
                .await;
        };

        if event.max_participants >= 0 {
            let participants = ctx.database.get_event_participants(event_id).await?;
            if participants.len() as i64 >= event.max_participants {
                return respond_text(
                    serenity_ctx,
                    command,
                    format!("❌ Event **{}** is full.", event.title),
                )
                .await;
            }
        }

        if ctx.database.join_event(event_id, user_id).await? {
            info!("User {user_id} joined event {event_id}");
            respond_text(serenity_ctx, command, format!("✅ You joined **{}**!", event.title)).await
        } else {
            respond_text(serenity_ctx, command, "❌ You already joined this event.").await
        }
    }

    async fn handle_leave(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let event_id = get_integer_option(&command.data.options, "id")
            .ok_or_else(|| anyhow::anyhow!("Missing id parameter"))?;
        let user_id = command.user.id.0;

        if ctx.database.leave_event(event_id, user_id).await? {
            info!("User {user_id} left event {event_id}");
            respond_text(serenity_ctx, command, format!("✅ You left event #{event_id}.")).await
        } else {
            respond_text(serenity_ctx, command, "❌ You haven't joined that event.").await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_handler_commands() {
        let handler = EventsHandler;
        assert_eq!(handler.command_names().len(), 5);
    }

    #[test]
    fn test_parse_event_date_formats() {
        let expected = Utc.with_ymd_and_hms(2030, 12, 24, 20, 0, 0).unwrap();
        assert_eq!(parse_event_date("2030-12-24 20:00"), Some(expected));
        assert_eq!(parse_event_date("24/12/2030 20:00"), Some(expected));
        assert_eq!(parse_event_date("december 24"), None);
    }
}
