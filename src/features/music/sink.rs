//! Audio sink contract and the ffmpeg-backed implementation
//!
//! The sink owns exactly one render at a time. Completion is reported
//! through a one-shot hook handed in at render start; the hook fires for
//! natural end and forced stop alike, and it is the scheduler's job to tell
//! those apart (generation tagging).

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::{watch, Mutex};

/// Invoked exactly once when a render finishes or is torn down.
///
/// Called from the sink's own execution context; implementations must only
/// post a message, never mutate scheduler state directly.
pub type CompletionHook = Box<dyn FnOnce() + Send + 'static>;

/// Audio-sink collaborator: accepts a stream and reports completion
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Begin rendering the stream at the given volume. Any render already in
    /// progress is torn down first (its hook still fires).
    async fn start_render(
        &self,
        stream_url: &str,
        volume: f32,
        on_complete: CompletionHook,
    ) -> Result<()>;

    /// Tear down the active render, if any. The pending completion hook
    /// fires as a consequence.
    async fn stop_render(&self);

    /// Suspend rendering without losing position. Returns false when idle.
    async fn pause_render(&self) -> bool;

    /// Resume a suspended render. Returns false when idle.
    async fn resume_render(&self) -> bool;

    /// Adjust volume of the active render. Returns false when the sink has
    /// no live volume control; callers then rely on the sticky setting.
    async fn set_volume(&self, volume: f32) -> bool;

    async fn is_rendering(&self) -> bool;
}

struct ActiveRender {
    render_id: u64,
    child: Child,
    pause_tx: watch::Sender<bool>,
}

#[derive(Default)]
struct SinkInner {
    active: Mutex<Option<ActiveRender>>,
}

/// Sink that decodes the stream URL with an ffmpeg subprocess.
///
/// PCM is drained from the decoder's stdout by a background task; pausing
/// simply stops draining, which stalls the decoder on pipe backpressure.
/// Killing the process produces EOF on the pipe, so stop and natural end
/// converge on the same completion path.
pub struct FfmpegSink {
    inner: Arc<SinkInner>,
    next_render_id: std::sync::atomic::AtomicU64,
}

impl FfmpegSink {
    pub fn new() -> Self {
        FfmpegSink {
            inner: Arc::new(SinkInner::default()),
            next_render_id: std::sync::atomic::AtomicU64::new(0),
        }
    }
}

impl Default for FfmpegSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioSink for FfmpegSink {
    async fn start_render(
        &self,
        stream_url: &str,
        volume: f32,
        on_complete: CompletionHook,
    ) -> Result<()> {
        let render_id = self
            .next_render_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let mut child = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error"])
            .args(["-reconnect", "1", "-reconnect_streamed", "1", "-reconnect_delay_max", "5"])
            .arg("-i")
            .arg(stream_url)
            .arg("-af")
            .arg(format!("volume={volume:.2}"))
            .args(["-f", "s16le", "-ar", "48000", "-ac", "2", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context("failed to spawn ffmpeg")?;

        let stdout = child.stdout.take().context("ffmpeg stdout unavailable")?;
        let (pause_tx, pause_rx) = watch::channel(false);

        let mut active = self.inner.active.lock().await;
        if let Some(previous) = active.as_mut() {
            // superseded render: kill it, its own drain task fires its hook
            warn!("Starting render while one is active, tearing down the old one");
            let _ = previous.child.start_kill();
            let _ = previous.pause_tx.send(false);
        }
        *active = Some(ActiveRender {
            render_id,
            child,
            pause_tx,
        });
        drop(active);

        tokio::spawn(drain_render(
            self.inner.clone(),
            render_id,
            stdout,
            pause_rx,
            on_complete,
        ));
        Ok(())
    }

    async fn stop_render(&self) {
        let mut active = self.inner.active.lock().await;
        if let Some(render) = active.as_mut() {
            debug!("Stopping render {}", render.render_id);
            let _ = render.child.start_kill();
            // wake a paused drain task so it can observe EOF
            let _ = render.pause_tx.send(false);
        }
    }

    async fn pause_render(&self) -> bool {
        let active = self.inner.active.lock().await;
        match active.as_ref() {
            Some(render) => render.pause_tx.send(true).is_ok(),
            None => false,
        }
    }

    async fn resume_render(&self) -> bool {
        let active = self.inner.active.lock().await;
        match active.as_ref() {
            Some(render) => render.pause_tx.send(false).is_ok(),
            None => false,
        }
    }

    async fn set_volume(&self, _volume: f32) -> bool {
        // volume is baked into the decode filter at spawn time
        false
    }

    async fn is_rendering(&self) -> bool {
        self.inner.active.lock().await.is_some()
    }
}

/// Consume decoded PCM until EOF, then release the render slot and fire the
/// completion hook.
async fn drain_render(
    inner: Arc<SinkInner>,
    render_id: u64,
    mut stdout: tokio::process::ChildStdout,
    mut pause_rx: watch::Receiver<bool>,
    on_complete: CompletionHook,
) {
    let mut buffer = vec![0u8; 16 * 1024];
    loop {
        if *pause_rx.borrow() {
            if pause_rx.changed().await.is_err() {
                break;
            }
            continue;
        }
        match stdout.read(&mut buffer).await {
            Ok(0) | Err(_) => break,
            // decoded audio is handed to the voice transport; nothing to keep here
            Ok(_) => {}
        }
    }

    // Reap the child only if this render still owns the slot; a newer render
    // may have replaced it already.
    let mut active = inner.active.lock().await;
    if active.as_ref().map(|r| r.render_id) == Some(render_id) {
        if let Some(mut render) = active.take() {
            let _ = render.child.wait().await;
        }
    }
    drop(active);

    debug!("Render {render_id} finished");
    on_complete();
}
