//! Top-level command dispatch
//!
//! Routes slash command interactions to the per-feature handlers through the
//! registry, and tracks user activity on regular messages.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::Result;
use log::{debug, warn};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::channel::Message;
use serenity::prelude::Context;
use std::sync::Arc;
use uuid::Uuid;

use crate::commands::context::CommandContext;
use crate::commands::handlers::{
    EventsHandler, MusicHandler, RemindHandler, UtilityHandler, WeatherHandler,
};
use crate::commands::registry::CommandRegistry;

/// Dispatches interactions and gateway messages to the feature handlers
#[derive(Clone)]
pub struct CommandHandler {
    context: Arc<CommandContext>,
    registry: CommandRegistry,
}

impl CommandHandler {
    pub fn new(context: CommandContext) -> Self {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(RemindHandler));
        registry.register(Arc::new(MusicHandler));
        registry.register(Arc::new(EventsHandler));
        registry.register(Arc::new(WeatherHandler));
        registry.register(Arc::new(UtilityHandler));

        CommandHandler {
            context: Arc::new(context),
            registry,
        }
    }

    /// Route a slash command to its handler
    pub async fn handle_slash_command(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let request_id = Uuid::new_v4();
        debug!(
            "[{request_id}] /{} from user {} (guild {:?})",
            command.data.name, command.user.id, command.guild_id
        );

        match self.registry.get(&command.data.name) {
            Some(handler) => handler.handle(self.context.clone(), ctx, command).await,
            None => {
                warn!("[{request_id}] No handler registered for '{}'", command.data.name);
                Ok(())
            }
        }
    }

    /// Track user activity for every non-bot message
    pub async fn handle_message(&self, _ctx: &Context, msg: &Message) -> Result<()> {
        self.context
            .database
            .upsert_user(msg.author.id.0, &msg.author.name, None)
            .await?;
        self.context.database.bump_user_activity(msg.author.id.0).await?;
        Ok(())
    }
}
