//! # Music Feature
//!
//! Per-guild playback sessions: queueing, completion-driven advancement, and
//! the yt-dlp/ffmpeg adapters behind the resolver and sink contracts.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true

pub mod notifier;
pub mod queue;
pub mod resolver;
pub mod scheduler;
pub mod sink;

pub use notifier::DiscordPlaybackNotifier;
pub use queue::{Track, TrackQueue};
pub use resolver::{TrackResolver, YtDlpResolver};
pub use scheduler::{
    JoinOutcome, NowPlaying, PlayOutcome, PlaybackNotifier, PlaybackScheduler, PlayerEvent,
    PlayerSession,
};
pub use sink::{AudioSink, CompletionHook, FfmpegSink};
