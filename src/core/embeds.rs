//! Shared embed builders for bot responses
//!
//! Embed construction used by both command handlers and the background
//! delivery paths (reminder notifier, playback notifier).
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0

use serenity::builder::CreateEmbed;

use crate::core::truncate_for_embed;
use crate::database::Event;
use crate::features::music::Track;
use crate::features::reminders::Reminder;

/// Standard accent colors for embeds
pub mod colors {
    pub const PRIMARY: u32 = 0x0099ff;
    pub const SUCCESS: u32 = 0x00ff00;
    pub const WARNING: u32 = 0xffa500;
    pub const ERROR: u32 = 0xff0000;
    pub const MUSIC: u32 = 0x9b59b6;
    pub const EVENT: u32 = 0xe74c3c;
    pub const REMINDER: u32 = 0xf39c12;
}

/// Embed delivered to the channel when a reminder fires
pub fn reminder_fired_embed(reminder: &Reminder) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed
        .title("🔔 Reminder!")
        .description(truncate_for_embed(&reminder.message))
        .color(colors::REMINDER);

    if reminder.is_recurring {
        if let Some(pattern) = reminder.recurring_pattern {
            embed.field("🔄 Repeats", pattern.as_str(), true);
        }
    }

    embed.footer(|f| f.text(format!("Reminder ID: {}", reminder.id)));
    embed
}

/// Confirmation embed shown after a reminder is created
pub fn reminder_created_embed(reminder: &Reminder) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed
        .title("⏰ Reminder created")
        .description(format!("**Message:** {}", truncate_for_embed(&reminder.message)))
        .color(colors::SUCCESS)
        .field(
            "📅 Time",
            reminder.remind_time.format("%d/%m/%Y %H:%M UTC").to_string(),
            true,
        );

    if let Some(pattern) = reminder.recurring_pattern {
        embed.field("🔄 Repeats", pattern.as_str(), true);
    }

    embed.field("🆔 Reminder ID", reminder.id.to_string(), true);
    embed
}

/// Now-playing embed with track metadata and session stats
pub fn now_playing_embed(track: &Track, volume: f32, queue_len: usize) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed
        .title("🎵 Now playing")
        .description(format!(
            "**{}** `[{}]`",
            track.title,
            format_track_duration(track.duration_seconds)
        ))
        .color(colors::MUSIC)
        .field("👤 Uploader", &track.uploader, true)
        .field("🔊 Volume", format!("{}%", (volume * 100.0).round() as u32), true)
        .field("📋 Queue", format!("{queue_len} tracks"), true);

    if !track.webpage_url.is_empty() {
        embed.url(&track.webpage_url);
    }
    embed
}

/// Queue listing embed; `current` is shown separately from the waiting tracks
pub fn queue_embed(current: Option<&Track>, upcoming: &[Track]) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed.title("📋 Music queue").color(colors::MUSIC);

    let listing = if upcoming.is_empty() {
        "The queue is empty.".to_string()
    } else {
        upcoming
            .iter()
            .enumerate()
            .map(|(i, track)| {
                format!(
                    "{}. **{}** `[{}]`",
                    i + 1,
                    track.title,
                    format_track_duration(track.duration_seconds)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    embed.description(truncate_for_embed(&listing));

    if let Some(track) = current {
        embed.field("🎵 Now playing", format!("**{}**", track.title), false);
    }

    embed.footer(|f| f.text(format!("{} tracks in queue", upcoming.len())));
    embed
}

/// Event details embed used by creation confirmations and event_info
pub fn event_embed(event: &Event, participant_count: usize) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed
        .title(format!("🎉 {}", event.title))
        .color(colors::EVENT)
        .field(
            "📅 Date",
            event.event_date.format("%d/%m/%Y %H:%M UTC").to_string(),
            true,
        )
        .field("🆔 Event ID", event.id.to_string(), true);

    if let Some(description) = &event.description {
        embed.description(truncate_for_embed(description));
    }

    let capacity = if event.max_participants < 0 {
        format!("{participant_count}")
    } else {
        format!("{participant_count}/{}", event.max_participants)
    };
    embed.field("👥 Participants", capacity, true);
    embed
}

/// Format a track duration as MM:SS or HH:MM:SS; zero means a live stream
pub fn format_track_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "Live".to_string();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_track_duration() {
        assert_eq!(format_track_duration(0), "Live");
        assert_eq!(format_track_duration(35), "00:35");
        assert_eq!(format_track_duration(215), "03:35");
        assert_eq!(format_track_duration(3661), "01:01:01");
    }

    #[test]
    fn test_queue_embed_builds_for_empty_queue() {
        let _embed = queue_embed(None, &[]);
    }

    #[test]
    fn test_now_playing_embed_builds() {
        let track = Track {
            title: "Test song".to_string(),
            stream_url: "https://example.com/stream".to_string(),
            webpage_url: "https://example.com/watch".to_string(),
            duration_seconds: 215,
            uploader: "Test uploader".to_string(),
        };
        let _embed = now_playing_embed(&track, 0.5, 3);
    }
}
