//! Media resolution through yt-dlp
//!
//! Turns a direct URL or a free-text search term into a [`Track`] with a
//! streamable source URL, using `yt-dlp -j` in a subprocess.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::features::music::Track;

/// Media-resolution collaborator: query in, playable track out.
///
/// `Ok(None)` means the query produced no result; errors are reserved for
/// unexpected failures (tool missing, malformed output).
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<Option<Track>>;
}

/// Resolver backed by the yt-dlp CLI
pub struct YtDlpResolver {
    timeout: Duration,
}

impl YtDlpResolver {
    pub fn new() -> Self {
        YtDlpResolver {
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        YtDlpResolver { timeout }
    }
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> Result<Option<Track>> {
        let target = if query.starts_with("http://") || query.starts_with("https://") {
            query.to_string()
        } else {
            format!("ytsearch1:{query}")
        };

        info!("Resolving media query: {target}");

        let mut cmd = Command::new("yt-dlp");
        cmd.args([
            "-j",
            "--no-playlist",
            "--no-warnings",
            "--quiet",
            "--format",
            "bestaudio/best",
        ])
        .arg(&target)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.context("failed to run yt-dlp")?,
            Err(_) => {
                warn!("yt-dlp timed out after {}s for query: {target}", self.timeout.as_secs());
                return Ok(None);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp returned {:?}: {}", output.status.code(), stderr.trim());
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(line) = stdout.lines().find(|line| !line.trim().is_empty()) else {
            return Ok(None);
        };

        let json: serde_json::Value =
            serde_json::from_str(line).context("failed to parse yt-dlp JSON output")?;

        Ok(track_from_json(&json))
    }
}

/// Map a yt-dlp JSON object to a track; `None` when no stream URL is present
fn track_from_json(json: &serde_json::Value) -> Option<Track> {
    let stream_url = json.get("url").and_then(|v| v.as_str())?.to_string();

    Some(Track {
        title: json
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_string(),
        stream_url,
        webpage_url: json
            .get("webpage_url")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        duration_seconds: json.get("duration").and_then(|v| v.as_f64()).unwrap_or(0.0) as u64,
        uploader: json
            .get("uploader")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_track_from_full_json() {
        let json = json!({
            "url": "https://cdn.example/audio",
            "title": "Some song",
            "duration": 215.3,
            "uploader": "Some channel",
            "webpage_url": "https://www.youtube.com/watch?v=abc"
        });

        let track = track_from_json(&json).unwrap();
        assert_eq!(track.title, "Some song");
        assert_eq!(track.stream_url, "https://cdn.example/audio");
        assert_eq!(track.duration_seconds, 215);
        assert_eq!(track.uploader, "Some channel");
    }

    #[test]
    fn test_track_from_sparse_json_uses_defaults() {
        let json = json!({ "url": "https://cdn.example/live" });

        let track = track_from_json(&json).unwrap();
        assert_eq!(track.title, "Unknown");
        assert_eq!(track.duration_seconds, 0);
        assert_eq!(track.uploader, "Unknown");
        assert!(track.webpage_url.is_empty());
    }

    #[test]
    fn test_missing_stream_url_is_not_a_track() {
        let json = json!({ "title": "no stream here" });
        assert!(track_from_json(&json).is_none());
    }
}
