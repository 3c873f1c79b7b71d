use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::application::interaction::Interaction;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use std::sync::Arc;
use tokio::sync::Notify;

use harmony::commands::{
    register_global_commands, register_guild_commands, CommandContext, CommandHandler,
};
use harmony::core::Config;
use harmony::database::Database;
use harmony::features::music::{DiscordPlaybackNotifier, PlaybackScheduler, YtDlpResolver};
use harmony::features::reminders::{DiscordReminderNotifier, ReminderEngine};
use harmony::features::weather::WeatherClient;

struct Handler {
    command_handler: Arc<CommandHandler>,
    guild_id: Option<GuildId>,
    /// Released once the gateway is up, which starts the reminder scanner
    reminder_ready: Arc<Notify>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        if let Err(e) = self.command_handler.handle_message(&ctx, &msg).await {
            error!("Error handling message: {e}");
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        // Guild commands update instantly and suit development; global
        // registration may take up to an hour to propagate.
        if let Some(guild_id) = self.guild_id {
            info!("🔧 Development mode: Registering commands for guild {guild_id}");
            if let Err(e) = register_guild_commands(&ctx, guild_id).await {
                error!("❌ Failed to register guild slash commands: {e}");
            }
        } else {
            info!("🌍 Production mode: Registering commands globally");
            if let Err(e) = register_global_commands(&ctx).await {
                error!("❌ Failed to register global slash commands: {e}");
            }
        }

        self.reminder_ready.notify_one();
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::ApplicationCommand(command) = interaction {
            if let Err(e) = self
                .command_handler
                .handle_slash_command(&ctx, &command)
                .await
            {
                error!("Error handling slash command '{}': {}", command.data.name, e);

                let error_message =
                    "❌ Sorry, I encountered an error processing your command. Please try again.";

                // The handler may have deferred already; try editing first,
                // fall back to a fresh response.
                #[allow(clippy::redundant_pattern_matching)]
                if let Err(_) = command
                    .edit_original_interaction_response(&ctx.http, |response| {
                        response.content(error_message)
                    })
                    .await
                {
                    let _ = command
                        .create_interaction_response(&ctx.http, |response| {
                            response
                                .kind(serenity::model::application::interaction::InteractionResponseType::ChannelMessageWithSource)
                                .interaction_response_data(|message| message.content(error_message))
                        })
                        .await;
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting Harmony Discord bot...");

    let database = Database::new(&config.database_path).await?;
    let weather = WeatherClient::new(config.weather_api_key.clone());

    // Dedicated HTTP client for the background deliverers; the gateway client
    // keeps its own.
    let http = Arc::new(Http::new(&config.discord_token));

    // Playback scheduler and its control loop
    let resolver = Arc::new(YtDlpResolver::new());
    let playback_notifier = Arc::new(DiscordPlaybackNotifier::new(http.clone()));
    let (scheduler, player_events) = PlaybackScheduler::new(
        resolver,
        playback_notifier,
        config.default_volume,
        config.max_queue_size,
    );
    tokio::spawn(scheduler.clone().run(player_events));

    // Reminder engine, held until the gateway reports ready
    let reminder_ready = Arc::new(Notify::new());
    let reminder_notifier = Arc::new(DiscordReminderNotifier::new(http));
    let engine = ReminderEngine::new(Arc::new(database.clone()), reminder_notifier);
    tokio::spawn(engine.run(reminder_ready.clone()));

    let context = CommandContext::new(
        database,
        scheduler,
        weather,
        config.max_reminders_per_user,
    );
    let command_handler = CommandHandler::new(context);

    // Parse guild ID if provided for development mode
    let guild_id = config
        .discord_guild_id
        .as_ref()
        .and_then(|id| id.parse::<u64>().ok())
        .map(GuildId);

    let handler = Handler {
        command_handler: Arc::new(command_handler),
        guild_id,
        reminder_ready,
    };

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Bot configured successfully. Connecting to Discord gateway...");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
