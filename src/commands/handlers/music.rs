//! Music command handlers
//!
//! Handles: join, leave, play, queue, nowplaying, skip, stop, pause, resume,
//! volume, loop
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::id::GuildId;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::SlashCommandHandler;
use crate::commands::handlers::{followup_text, respond_embed, respond_text};
use crate::commands::slash::{get_bool_option, get_integer_option, get_string_option};
use crate::core::embeds::{now_playing_embed, queue_embed};
use crate::features::music::{FfmpegSink, JoinOutcome, PlayOutcome};

/// Handler for playback control commands
pub struct MusicHandler;

#[async_trait]
impl SlashCommandHandler for MusicHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &[
            "join", "leave", "play", "queue", "nowplaying", "skip", "stop", "pause", "resume",
            "volume", "loop",
        ]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        // every music command is guild-only
        let Some(guild_id) = command.guild_id else {
            return respond_text(serenity_ctx, command, "❌ Music only works inside a server.")
                .await;
        };

        match command.data.name.as_str() {
            "join" => self.handle_join(&ctx, serenity_ctx, command, guild_id).await,
            "leave" => self.handle_leave(&ctx, serenity_ctx, command, guild_id).await,
            "play" => self.handle_play(&ctx, serenity_ctx, command, guild_id).await,
            "queue" => self.handle_queue(&ctx, serenity_ctx, command, guild_id).await,
            "nowplaying" => self.handle_nowplaying(&ctx, serenity_ctx, command, guild_id).await,
            "skip" => self.handle_skip(&ctx, serenity_ctx, command, guild_id).await,
            "stop" => self.handle_stop(&ctx, serenity_ctx, command, guild_id).await,
            "pause" => self.handle_pause(&ctx, serenity_ctx, command, guild_id).await,
            "resume" => self.handle_resume(&ctx, serenity_ctx, command, guild_id).await,
            "volume" => self.handle_volume(&ctx, serenity_ctx, command, guild_id).await,
            "loop" => self.handle_loop(&ctx, serenity_ctx, command, guild_id).await,
            _ => Ok(()),
        }
    }
}

impl MusicHandler {
    /// Voice channel the invoking user is currently in, from the cache
    fn caller_voice_channel(
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        guild_id: GuildId,
    ) -> Option<u64> {
        serenity_ctx
            .cache
            .guild(guild_id)
            .and_then(|guild| {
                guild
                    .voice_states
                    .get(&command.user.id)
                    .and_then(|state| state.channel_id)
            })
            .map(|channel| channel.0)
    }

    /// Create a session bound to the caller's voice channel if there is none
    fn ensure_session(
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        guild_id: GuildId,
    ) -> Result<JoinOutcome, &'static str> {
        if ctx.scheduler.is_connected(guild_id.0) {
            return Ok(JoinOutcome::AlreadyConnected);
        }
        let Some(voice_channel) = Self::caller_voice_channel(serenity_ctx, command, guild_id)
        else {
            return Err("❌ Join a voice channel first!");
        };
        Ok(ctx.scheduler.join(
            guild_id.0,
            voice_channel,
            command.channel_id.0,
            Arc::new(FfmpegSink::new()),
        ))
    }

    async fn handle_join(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        guild_id: GuildId,
    ) -> Result<()> {
        match Self::ensure_session(ctx, serenity_ctx, command, guild_id) {
            Ok(JoinOutcome::Joined) => {
                respond_text(serenity_ctx, command, "🎵 Connected to your voice channel.").await
            }
            Ok(JoinOutcome::AlreadyConnected) => {
                respond_text(serenity_ctx, command, "I'm already in a voice channel.").await
            }
            Err(reply) => respond_text(serenity_ctx, command, reply).await,
        }
    }

    async fn handle_leave(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        guild_id: GuildId,
    ) -> Result<()> {
        if ctx.scheduler.leave(guild_id.0).await {
            respond_text(serenity_ctx, command, "👋 Left the voice channel.").await
        } else {
            respond_text(serenity_ctx, command, "❌ I'm not in a voice channel.").await
        }
    }

    async fn handle_play(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        guild_id: GuildId,
    ) -> Result<()> {
        let query = get_string_option(&command.data.options, "query")
            .ok_or_else(|| anyhow::anyhow!("Missing query parameter"))?;

        if let Err(reply) = Self::ensure_session(ctx, serenity_ctx, command, guild_id) {
            return respond_text(serenity_ctx, command, reply).await;
        }

        // resolution shells out to yt-dlp, so acknowledge first
        command.defer(&serenity_ctx.http).await?;

        match ctx.scheduler.play(guild_id.0, &query).await {
            Ok(PlayOutcome::Started(track)) => {
                info!("Started '{}' in guild {}", track.title, guild_id);
                followup_text(serenity_ctx, command, format!("🎵 Now playing: **{}**", track.title))
                    .await
            }
            Ok(PlayOutcome::Queued { track, position }) => {
                followup_text(
                    serenity_ctx,
                    command,
                    format!("➕ Added to queue (#{position}): **{}**", track.title),
                )
                .await
            }
            Ok(PlayOutcome::NotFound) => {
                followup_text(serenity_ctx, command, "❌ Couldn't find or play that track.").await
            }
            Ok(PlayOutcome::QueueFull) => {
                followup_text(serenity_ctx, command, "❌ The queue is full.").await
            }
            Ok(PlayOutcome::NotConnected) => {
                followup_text(serenity_ctx, command, "❌ Join a voice channel first!").await
            }
            Err(e) => {
                warn!("Play failed in guild {guild_id}: {e}");
                followup_text(serenity_ctx, command, "❌ Something went wrong starting playback.")
                    .await
            }
        }
    }

    async fn handle_queue(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        guild_id: GuildId,
    ) -> Result<()> {
        match ctx.scheduler.queue_snapshot(guild_id.0) {
            Some((current, upcoming)) if current.is_some() || !upcoming.is_empty() => {
                respond_embed(serenity_ctx, command, queue_embed(current.as_ref(), &upcoming)).await
            }
            _ => respond_text(serenity_ctx, command, "📭 The queue is empty.").await,
        }
    }

    async fn handle_nowplaying(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        guild_id: GuildId,
    ) -> Result<()> {
        match ctx.scheduler.now_playing(guild_id.0) {
            Some(now) => {
                respond_embed(
                    serenity_ctx,
                    command,
                    now_playing_embed(&now.track, now.volume, now.queue_len),
                )
                .await
            }
            None => respond_text(serenity_ctx, command, "❌ Nothing is playing right now.").await,
        }
    }

    async fn handle_skip(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        guild_id: GuildId,
    ) -> Result<()> {
        if ctx.scheduler.skip(guild_id.0).await {
            respond_text(serenity_ctx, command, "⏭️ Skipped the current track.").await
        } else {
            respond_text(serenity_ctx, command, "❌ Nothing is playing right now.").await
        }
    }

    async fn handle_stop(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        guild_id: GuildId,
    ) -> Result<()> {
        if ctx.scheduler.stop(guild_id.0).await {
            respond_text(serenity_ctx, command, "⏹️ Stopped playback and cleared the queue.").await
        } else {
            respond_text(serenity_ctx, command, "❌ Nothing is playing right now.").await
        }
    }

    async fn handle_pause(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        guild_id: GuildId,
    ) -> Result<()> {
        if ctx.scheduler.pause(guild_id.0).await {
            respond_text(serenity_ctx, command, "⏸️ Paused playback.").await
        } else {
            respond_text(serenity_ctx, command, "❌ Nothing is playing right now.").await
        }
    }

    async fn handle_resume(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        guild_id: GuildId,
    ) -> Result<()> {
        if ctx.scheduler.resume(guild_id.0).await {
            respond_text(serenity_ctx, command, "▶️ Resumed playback.").await
        } else {
            respond_text(serenity_ctx, command, "❌ Nothing is paused right now.").await
        }
    }

    async fn handle_volume(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        guild_id: GuildId,
    ) -> Result<()> {
        let level = get_integer_option(&command.data.options, "level")
            .ok_or_else(|| anyhow::anyhow!("Missing level parameter"))?
            .clamp(0, 100) as u8;

        match ctx.scheduler.set_volume(guild_id.0, level).await {
            Some(true) => {
                respond_text(serenity_ctx, command, format!("🔊 Volume set to {level}%.")).await
            }
            Some(false) => {
                respond_text(
                    serenity_ctx,
                    command,
                    format!("🔊 Volume set to {level}% from the next track on."),
                )
                .await
            }
            None => respond_text(serenity_ctx, command, "❌ I'm not in a voice channel.").await,
        }
    }

    async fn handle_loop(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        guild_id: GuildId,
    ) -> Result<()> {
        let enabled = get_bool_option(&command.data.options, "enabled")
            .ok_or_else(|| anyhow::anyhow!("Missing enabled parameter"))?;

        match ctx.scheduler.set_loop(guild_id.0, enabled) {
            Some(true) => respond_text(serenity_ctx, command, "🔁 Loop enabled.").await,
            Some(false) => respond_text(serenity_ctx, command, "➡️ Loop disabled.").await,
            None => respond_text(serenity_ctx, command, "❌ I'm not in a voice channel.").await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_music_handler_commands() {
        let handler = MusicHandler;
        let names = handler.command_names();

        assert_eq!(names.len(), 11);
        assert!(names.contains(&"play"));
        assert!(names.contains(&"loop"));
        assert!(names.contains(&"nowplaying"));
    }
}
