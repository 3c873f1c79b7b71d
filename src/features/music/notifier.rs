//! Discord-backed playback announcements

use anyhow::Result;
use async_trait::async_trait;
use serenity::http::Http;
use serenity::model::id::ChannelId;
use std::sync::Arc;

use crate::features::music::{PlaybackNotifier, Track};

/// Posts advancement announcements to the session's bound text channel
pub struct DiscordPlaybackNotifier {
    http: Arc<Http>,
}

impl DiscordPlaybackNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        DiscordPlaybackNotifier { http }
    }
}

#[async_trait]
impl PlaybackNotifier for DiscordPlaybackNotifier {
    async fn now_playing(&self, channel_id: u64, track: &Track) -> Result<()> {
        ChannelId(channel_id)
            .say(&self.http, format!("🎵 Now playing: **{}**", track.title))
            .await?;
        Ok(())
    }

    async fn queue_finished(&self, channel_id: u64) -> Result<()> {
        ChannelId(channel_id)
            .say(&self.http, "🎵 Finished playing everything in the queue.")
            .await?;
        Ok(())
    }
}
