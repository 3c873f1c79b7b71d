//! Reminder command handlers
//!
//! Handles: remind, my_reminders, cancel_reminder
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use serenity::builder::CreateEmbed;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::SlashCommandHandler;
use crate::commands::handlers::{respond_embed, respond_text};
use crate::commands::slash::{get_integer_option, get_string_option};
use crate::core::embeds::{colors, reminder_created_embed};
use crate::features::reminders::{
    parse_time_input, NewReminder, RecurrencePattern, Reminder, ReminderStatus,
};

/// Handler for reminder-related commands
pub struct RemindHandler;

#[async_trait]
impl SlashCommandHandler for RemindHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["remind", "my_reminders", "cancel_reminder"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        match command.data.name.as_str() {
            "remind" => self.handle_remind(&ctx, serenity_ctx, command).await,
            "my_reminders" => self.handle_my_reminders(&ctx, serenity_ctx, command).await,
            "cancel_reminder" => self.handle_cancel(&ctx, serenity_ctx, command).await,
            _ => Ok(()),
        }
    }
}

impl RemindHandler {
    /// Handle /remind - create a new reminder
    async fn handle_remind(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let user_id = command.user.id.0;
        let guild_id = command.guild_id.map(|id| id.0).unwrap_or(0);
        let channel_id = command.channel_id.0;

        let time_str = get_string_option(&command.data.options, "time")
            .ok_or_else(|| anyhow::anyhow!("Missing time parameter"))?;
        let message = get_string_option(&command.data.options, "message")
            .ok_or_else(|| anyhow::anyhow!("Missing message parameter"))?;

        let now = Utc::now();
        let Some(remind_time) = parse_time_input(&time_str, now) else {
            return respond_text(
                serenity_ctx,
                command,
                "❌ Invalid time format. Use `5m`, `2h`, `1d`, `HH:MM`, or `YYYY-MM-DD HH:MM`.",
            )
            .await;
        };

        if remind_time <= now {
            return respond_text(
                serenity_ctx,
                command,
                "❌ The reminder time must be in the future.",
            )
            .await;
        }

        let recurring_pattern = match get_string_option(&command.data.options, "recurring") {
            None => None,
            Some(tag) => match RecurrencePattern::parse(&tag) {
                Some(pattern) => Some(pattern),
                None => {
                    return respond_text(
                        serenity_ctx,
                        command,
                        "❌ Invalid recurrence. Use: hourly, daily, weekly, monthly.",
                    )
                    .await;
                }
            },
        };

        let existing = ctx.database.get_user_reminders(user_id).await?;
        if existing.len() >= ctx.max_reminders_per_user {
            return respond_text(
                serenity_ctx,
                command,
                format!(
                    "❌ You already have {} active reminders. Cancel some first.",
                    existing.len()
                ),
            )
            .await;
        }

        let id = ctx
            .database
            .add_reminder(NewReminder {
                user_id,
                guild_id,
                channel_id,
                message: &message,
                remind_time,
                recurring_pattern,
            })
            .await?;

        info!(
            "Created reminder {id} for user {user_id} at {} (recurring: {:?})",
            remind_time.format("%Y-%m-%d %H:%M"),
            recurring_pattern.map(|p| p.as_str())
        );

        let reminder = Reminder {
            id,
            user_id,
            guild_id,
            channel_id,
            message,
            remind_time,
            is_recurring: recurring_pattern.is_some(),
            recurring_pattern,
            status: ReminderStatus::Active,
        };
        respond_embed(serenity_ctx, command, reminder_created_embed(&reminder)).await
    }

    /// Handle /my_reminders - list the caller's active reminders
    async fn handle_my_reminders(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let user_id = command.user.id.0;
        let reminders = ctx.database.get_user_reminders(user_id).await?;

        if reminders.is_empty() {
            return respond_text(
                serenity_ctx,
                command,
                "📋 You don't have any pending reminders.\nUse `/remind` to create one!",
            )
            .await;
        }

        let mut embed = CreateEmbed::default();
        embed.title("⏰ Your reminders").color(colors::PRIMARY);

        for reminder in reminders.iter().take(10) {
            let mut value = format!(
                "📝 {}\n📅 {}",
                reminder.message,
                reminder.remind_time.format("%d/%m/%Y %H:%M UTC")
            );
            if let Some(pattern) = reminder.recurring_pattern {
                value.push_str(&format!("\n🔄 Repeats: {}", pattern.as_str()));
            }
            embed.field(format!("🔔 Reminder #{}", reminder.id), value, false);
        }

        if reminders.len() > 10 {
            embed.footer(|f| f.text(format!("Showing 10/{} reminders", reminders.len())));
        }

        respond_embed(serenity_ctx, command, embed).await
    }

    /// Handle /cancel_reminder - owner-only cancellation
    async fn handle_cancel(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let user_id = command.user.id.0;
        let reminder_id = get_integer_option(&command.data.options, "id")
            .ok_or_else(|| anyhow::anyhow!("Missing id parameter"))?;

        let removed = ctx.database.remove_reminder(reminder_id, user_id).await?;
        if removed {
            info!("Cancelled reminder {reminder_id} for user {user_id}");
            respond_text(serenity_ctx, command, format!("✅ Cancelled reminder #{reminder_id}.")).await
        } else {
            respond_text(
                serenity_ctx,
                command,
                format!("❌ Reminder #{reminder_id} not found or doesn't belong to you."),
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remind_handler_commands() {
        let handler = RemindHandler;
        let names = handler.command_names();

        assert!(names.contains(&"remind"));
        assert!(names.contains(&"my_reminders"));
        assert!(names.contains(&"cancel_reminder"));
        assert_eq!(names.len(), 3);
    }
}
