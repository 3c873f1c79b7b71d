//! # Command Handlers
//!
//! One handler per feature area, all dispatched through the registry.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

mod event;
mod music;
mod remind;
mod utility;
mod weather;

pub use event::EventsHandler;
pub use music::MusicHandler;
pub use remind::RemindHandler;
pub use utility::UtilityHandler;
pub use weather::WeatherHandler;

use anyhow::Result;
use serenity::builder::CreateEmbed;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::Context;

/// Reply to an interaction with plain text
pub(crate) async fn respond_text(
    serenity_ctx: &Context,
    command: &ApplicationCommandInteraction,
    content: impl Into<String>,
) -> Result<()> {
    let content = content.into();
    command
        .create_interaction_response(&serenity_ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(content))
        })
        .await?;
    Ok(())
}

/// Reply to an interaction with an embed
pub(crate) async fn respond_embed(
    serenity_ctx: &Context,
    command: &ApplicationCommandInteraction,
    embed: CreateEmbed,
) -> Result<()> {
    command
        .create_interaction_response(&serenity_ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.set_embed(embed))
        })
        .await?;
    Ok(())
}

/// Follow up after a deferred interaction with plain text
pub(crate) async fn followup_text(
    serenity_ctx: &Context,
    command: &ApplicationCommandInteraction,
    content: impl Into<String>,
) -> Result<()> {
    let content = content.into();
    command
        .create_followup_message(&serenity_ctx.http, |message| message.content(content))
        .await?;
    Ok(())
}

/// Follow up after a deferred interaction with an embed
pub(crate) async fn followup_embed(
    serenity_ctx: &Context,
    command: &ApplicationCommandInteraction,
    embed: CreateEmbed,
) -> Result<()> {
    command
        .create_followup_message(&serenity_ctx.http, |message| message.set_embed(embed))
        .await?;
    Ok(())
}
