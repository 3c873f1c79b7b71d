//! Discord-backed reminder delivery

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serenity::http::Http;
use serenity::model::id::ChannelId;
use std::sync::Arc;

use crate::core::embeds::reminder_fired_embed;
use crate::features::reminders::{Reminder, ReminderNotifier};

/// Sends fired reminders to their origin channel through the Discord HTTP API
pub struct DiscordReminderNotifier {
    http: Arc<Http>,
}

impl DiscordReminderNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        DiscordReminderNotifier { http }
    }
}

#[async_trait]
impl ReminderNotifier for DiscordReminderNotifier {
    async fn send_reminder(&self, reminder: &Reminder) -> Result<()> {
        debug!(
            "Delivering reminder {} to channel {}",
            reminder.id, reminder.channel_id
        );

        ChannelId(reminder.channel_id)
            .send_message(&self.http, |message| {
                message
                    .content(format!("<@{}>", reminder.user_id))
                    .set_embed(reminder_fired_embed(reminder))
            })
            .await?;
        Ok(())
    }
}
