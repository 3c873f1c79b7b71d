//! Playback scheduler: per-guild sessions, queueing, and completion-driven
//! advancement.
//!
//! All session state lives in one `PlayerSession` per guild, held in a single
//! shared map. Track-completion notifications originate on the audio sink's
//! own execution context and are never allowed to touch session state
//! directly: the sink's completion hook posts a [`PlayerEvent`] onto the
//! scheduler's control loop, tagged with the render generation. Events whose
//! generation no longer matches the session are stale (the render was
//! superseded by stop/leave) and are dropped.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::features::music::queue::TrackQueue;
use crate::features::music::sink::{AudioSink, CompletionHook};
use crate::features::music::{Track, TrackResolver};

/// Messages posted onto the scheduler's control loop
#[derive(Debug, Clone, Copy)]
pub enum PlayerEvent {
    /// A render finished (naturally or by teardown) in the given guild.
    /// `generation` identifies which render; stale generations are dropped.
    TrackFinished { guild_id: u64, generation: u64 },
}

/// Outcome of a join request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyConnected,
}

/// Outcome of a play request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Session was idle; the track started rendering immediately
    Started(Track),
    /// A track was already rendering; appended at the given 1-based position
    Queued { track: Track, position: usize },
    /// The query resolved to nothing; session untouched
    NotFound,
    /// Queue is at capacity; session untouched
    QueueFull,
    /// No session for this guild
    NotConnected,
}

/// Snapshot of a session's playback state for display
#[derive(Debug, Clone)]
pub struct NowPlaying {
    pub track: Track,
    pub volume: f32,
    pub queue_len: usize,
    pub loop_enabled: bool,
}

/// Notification collaborator for advancement announcements
#[async_trait]
pub trait PlaybackNotifier: Send + Sync {
    async fn now_playing(&self, channel_id: u64, track: &Track) -> Result<()>;
    async fn queue_finished(&self, channel_id: u64) -> Result<()>;
}

/// One playback session per guild
pub struct PlayerSession {
    pub guild_id: u64,
    pub voice_channel_id: u64,
    /// Text channel that advancement announcements go to
    pub text_channel_id: u64,
    state: Mutex<SessionState>,
    sink: Arc<dyn AudioSink>,
}

struct SessionState {
    queue: TrackQueue,
    volume: f32,
    /// Bumped when a new render starts and when a render is forcibly
    /// superseded; completion events carry the generation of their render.
    generation: u64,
}

enum PlayDecision {
    Start { volume: f32, generation: u64 },
    Queued { position: usize },
    Full,
}

/// Owns every playback session and the single control path that mutates them
pub struct PlaybackScheduler {
    sessions: DashMap<u64, Arc<PlayerSession>>,
    resolver: Arc<dyn TrackResolver>,
    notifier: Arc<dyn PlaybackNotifier>,
    events_tx: mpsc::UnboundedSender<PlayerEvent>,
    default_volume: f32,
    max_queue_size: usize,
}

impl PlaybackScheduler {
    /// Create the scheduler and the receiving end of its control loop.
    /// The caller spawns [`PlaybackScheduler::run`] with the receiver.
    pub fn new(
        resolver: Arc<dyn TrackResolver>,
        notifier: Arc<dyn PlaybackNotifier>,
        default_volume: f32,
        max_queue_size: usize,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<PlayerEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let scheduler = Arc::new(PlaybackScheduler {
            sessions: DashMap::new(),
            resolver,
            notifier,
            events_tx,
            default_volume: default_volume.clamp(0.0, 1.0),
            max_queue_size,
        });
        (scheduler, events_rx)
    }

    /// Control loop: the only place completion events reach session state
    pub async fn run(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<PlayerEvent>) {
        info!("Playback scheduler control loop started");
        while let Some(event) = events.recv().await {
            match event {
                PlayerEvent::TrackFinished { guild_id, generation } => {
                    self.advance(guild_id, generation).await;
                }
            }
        }
    }

    /// Create a session for the guild. Idempotent: joining while already
    /// connected reports `AlreadyConnected` and changes nothing.
    pub fn join(
        &self,
        guild_id: u64,
        voice_channel_id: u64,
        text_channel_id: u64,
        sink: Arc<dyn AudioSink>,
    ) -> JoinOutcome {
        match self.sessions.entry(guild_id) {
            Entry::Occupied(_) => JoinOutcome::AlreadyConnected,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(PlayerSession {
                    guild_id,
                    voice_channel_id,
                    text_channel_id,
                    state: Mutex::new(SessionState {
                        queue: TrackQueue::new(),
                        volume: self.default_volume,
                        generation: 0,
                    }),
                    sink,
                }));
                info!("Created playback session for guild {guild_id} (voice channel {voice_channel_id})");
                JoinOutcome::Joined
            }
        }
    }

    /// Destroy the guild's session atomically: queue, current track, volume
    /// and history are discarded together. Returns false when not connected.
    pub async fn leave(&self, guild_id: u64) -> bool {
        let Some((_, session)) = self.sessions.remove(&guild_id) else {
            return false;
        };
        {
            let mut state = session.state.lock().unwrap();
            state.generation += 1;
            state.queue.clear();
        }
        session.sink.stop_render().await;
        info!("Destroyed playback session for guild {guild_id}");
        true
    }

    pub fn is_connected(&self, guild_id: u64) -> bool {
        self.sessions.contains_key(&guild_id)
    }

    /// Resolve a query and either start it immediately (idle session) or
    /// append it to the queue. Resolution happens before any session state
    /// is touched, so failures leave the session unchanged.
    pub async fn play(&self, guild_id: u64, query: &str) -> Result<PlayOutcome> {
        let Some(session) = self.session(guild_id) else {
            return Ok(PlayOutcome::NotConnected);
        };

        let Some(track) = self.resolver.resolve(query).await? else {
            return Ok(PlayOutcome::NotFound);
        };

        let decision = {
            let mut state = session.state.lock().unwrap();
            if state.queue.current().is_none() {
                state.queue.set_current(track.clone());
                state.generation += 1;
                PlayDecision::Start {
                    volume: state.volume,
                    generation: state.generation,
                }
            } else if state.queue.len() >= self.max_queue_size {
                PlayDecision::Full
            } else {
                state.queue.add(track.clone());
                PlayDecision::Queued {
                    position: state.queue.len(),
                }
            }
        };

        match decision {
            PlayDecision::Start { volume, generation } => {
                if let Err(e) = self.start_render(&session, &track, volume, generation).await {
                    session.state.lock().unwrap().queue.take_current();
                    return Err(e);
                }
                Ok(PlayOutcome::Started(track))
            }
            PlayDecision::Queued { position } => Ok(PlayOutcome::Queued { track, position }),
            PlayDecision::Full => Ok(PlayOutcome::QueueFull),
        }
    }

    /// Forcibly end the current render. Advancement then happens through the
    /// normal completion path, exactly as if the track had finished on its
    /// own. Returns false when nothing is rendering.
    pub async fn skip(&self, guild_id: u64) -> bool {
        let Some(session) = self.session(guild_id) else {
            return false;
        };
        if session.state.lock().unwrap().queue.current().is_none() {
            return false;
        }
        session.sink.stop_render().await;
        true
    }

    /// Stop playback and clear the queue. The in-flight completion callback
    /// is invalidated by bumping the generation before teardown.
    pub async fn stop(&self, guild_id: u64) -> bool {
        let Some(session) = self.session(guild_id) else {
            return false;
        };
        let was_active = {
            let mut state = session.state.lock().unwrap();
            let was_active = state.queue.current().is_some() || !state.queue.is_empty();
            state.generation += 1;
            state.queue.clear();
            was_active
        };
        session.sink.stop_render().await;
        was_active
    }

    /// Suspend the current render without touching queue or current
    pub async fn pause(&self, guild_id: u64) -> bool {
        match self.session(guild_id) {
            Some(session) => session.sink.pause_render().await,
            None => false,
        }
    }

    pub async fn resume(&self, guild_id: u64) -> bool {
        match self.session(guild_id) {
            Some(session) => session.sink.resume_render().await,
            None => false,
        }
    }

    /// Set the session's sticky volume from a 0-100 percentage. Applies to
    /// the active render only when the sink supports live adjustment; the
    /// sticky value always applies from the next render start. Returns
    /// whether the change took effect live.
    pub async fn set_volume(&self, guild_id: u64, percent: u8) -> Option<bool> {
        let session = self.session(guild_id)?;
        let volume = (f32::from(percent.min(100)) / 100.0).clamp(0.0, 1.0);
        session.state.lock().unwrap().volume = volume;
        Some(session.sink.set_volume(volume).await)
    }

    /// Toggle loop mode; returns the new setting
    pub fn set_loop(&self, guild_id: u64, enabled: bool) -> Option<bool> {
        let session = self.session(guild_id)?;
        session.state.lock().unwrap().queue.set_loop(enabled);
        Some(enabled)
    }

    pub fn now_playing(&self, guild_id: u64) -> Option<NowPlaying> {
        let session = self.session(guild_id)?;
        let state = session.state.lock().unwrap();
        state.queue.current().map(|track| NowPlaying {
            track: track.clone(),
            volume: state.volume,
            queue_len: state.queue.len(),
            loop_enabled: state.queue.loop_enabled(),
        })
    }

    /// Current track plus the waiting queue, for display
    pub fn queue_snapshot(&self, guild_id: u64) -> Option<(Option<Track>, Vec<Track>)> {
        let session = self.session(guild_id)?;
        let state = session.state.lock().unwrap();
        Some((state.queue.current().cloned(), state.queue.upcoming()))
    }

    fn session(&self, guild_id: u64) -> Option<Arc<PlayerSession>> {
        self.sessions.get(&guild_id).map(|entry| entry.value().clone())
    }

    fn completion_hook(&self, guild_id: u64, generation: u64) -> CompletionHook {
        let events_tx = self.events_tx.clone();
        Box::new(move || {
            let _ = events_tx.send(PlayerEvent::TrackFinished { guild_id, generation });
        })
    }

    async fn start_render(
        &self,
        session: &PlayerSession,
        track: &Track,
        volume: f32,
        generation: u64,
    ) -> Result<()> {
        let hook = self.completion_hook(session.guild_id, generation);
        session.sink.start_render(&track.stream_url, volume, hook).await
    }

    /// Advance the session after a render completed. Only reached from the
    /// control loop; stale generations (superseded renders) are dropped here.
    async fn advance(&self, guild_id: u64, generation: u64) {
        let Some(session) = self.session(guild_id) else {
            debug!("Completion for guild {guild_id} with no session, discarding");
            return;
        };

        let next = {
            let mut state = session.state.lock().unwrap();
            if state.generation != generation {
                debug!(
                    "Stale completion for guild {guild_id} (render {generation}, session at {}), discarding",
                    state.generation
                );
                return;
            }
            match state.queue.next() {
                Some(track) => {
                    state.generation += 1;
                    Some((track, state.volume, state.generation))
                }
                None => {
                    state.generation += 1;
                    state.queue.take_current();
                    None
                }
            }
        };

        match next {
            Some((track, volume, generation)) => {
                if let Err(e) = self.start_render(&session, &track, volume, generation).await {
                    error!("Failed to start next track in guild {guild_id}: {e}");
                    session.state.lock().unwrap().queue.take_current();
                    return;
                }
                info!("Advanced guild {guild_id} to: {}", track.title);
                if let Err(e) = self.notifier.now_playing(session.text_channel_id, &track).await {
                    warn!("Failed to announce track in guild {guild_id}: {e}");
                }
            }
            None => {
                info!("Queue exhausted in guild {guild_id}");
                if let Err(e) = self.notifier.queue_finished(session.text_channel_id).await {
                    warn!("Failed to announce queue end in guild {guild_id}: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc::error::TryRecvError;

    fn track(title: &str) -> Track {
        Track {
            title: title.to_string(),
            stream_url: format!("https://stream.example/{title}"),
            webpage_url: String::new(),
            duration_seconds: 60,
            uploader: "uploader".to_string(),
        }
    }

    struct FakeResolver {
        tracks: HashMap<String, Track>,
    }

    impl FakeResolver {
        fn with(titles: &[&str]) -> Arc<Self> {
            Arc::new(FakeResolver {
                tracks: titles.iter().map(|t| (t.to_string(), track(t))).collect(),
            })
        }
    }

    #[async_trait]
    impl TrackResolver for FakeResolver {
        async fn resolve(&self, query: &str) -> Result<Option<Track>> {
            Ok(self.tracks.get(query).cloned())
        }
    }

    /// Sink that records render starts and lets tests fire completions by
    /// hand, mirroring the asynchronous hook delivery of the real sink.
    #[derive(Default)]
    struct FakeSink {
        starts: Mutex<Vec<(String, f32)>>,
        hook: Mutex<Option<CompletionHook>>,
        rendering: AtomicBool,
        fire_on_stop: AtomicBool,
    }

    impl FakeSink {
        fn new() -> Arc<Self> {
            let sink = Arc::new(FakeSink::default());
            sink.fire_on_stop.store(true, Ordering::SeqCst);
            sink
        }

        fn starts(&self) -> Vec<(String, f32)> {
            self.starts.lock().unwrap().clone()
        }

        fn fire_completion(&self) {
            if let Some(hook) = self.hook.lock().unwrap().take() {
                hook();
            }
        }
    }

    #[async_trait]
    impl AudioSink for FakeSink {
        async fn start_render(
            &self,
            stream_url: &str,
            volume: f32,
            on_complete: CompletionHook,
        ) -> Result<()> {
            self.starts
                .lock()
                .unwrap()
                .push((stream_url.to_string(), volume));
            *self.hook.lock().unwrap() = Some(on_complete);
            self.rendering.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn stop_render(&self) {
            self.rendering.store(false, Ordering::SeqCst);
            if self.fire_on_stop.load(Ordering::SeqCst) {
                self.fire_completion();
            }
        }

        async fn pause_render(&self) -> bool {
            self.rendering.load(Ordering::SeqCst)
        }

        async fn resume_render(&self) -> bool {
            self.rendering.load(Ordering::SeqCst)
        }

        async fn set_volume(&self, _volume: f32) -> bool {
            false
        }

        async fn is_rendering(&self) -> bool {
            self.rendering.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        now_playing: Mutex<Vec<String>>,
        finished: Mutex<usize>,
    }

    #[async_trait]
    impl PlaybackNotifier for RecordingNotifier {
        async fn now_playing(&self, _channel_id: u64, track: &Track) -> Result<()> {
            self.now_playing.lock().unwrap().push(track.title.clone());
            Ok(())
        }

        async fn queue_finished(&self, _channel_id: u64) -> Result<()> {
            *self.finished.lock().unwrap() += 1;
            Ok(())
        }
    }

    const GUILD: u64 = 1;

    struct Harness {
        scheduler: Arc<PlaybackScheduler>,
        events: mpsc::UnboundedReceiver<PlayerEvent>,
        sink: Arc<FakeSink>,
        notifier: Arc<RecordingNotifier>,
    }

    impl Harness {
        fn new(titles: &[&str]) -> Self {
            let notifier = Arc::new(RecordingNotifier::default());
            let (scheduler, events) =
                PlaybackScheduler::new(FakeResolver::with(titles), notifier.clone(), 0.5, 100);
            let sink = FakeSink::new();
            scheduler.join(GUILD, 10, 20, sink.clone());
            Harness {
                scheduler,
                events,
                sink,
                notifier,
            }
        }

        /// Deliver every pending completion event to the scheduler, the way
        /// the spawned control loop would.
        async fn pump(&mut self) {
            loop {
                match self.events.try_recv() {
                    Ok(PlayerEvent::TrackFinished { guild_id, generation }) => {
                        self.scheduler.advance(guild_id, generation).await;
                    }
                    Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
                }
            }
        }
    }

    #[tokio::test]
    async fn test_play_on_idle_session_starts_immediately() {
        let harness = Harness::new(&["a"]);

        let outcome = harness.scheduler.play(GUILD, "a").await.unwrap();
        assert!(matches!(outcome, PlayOutcome::Started(ref t) if t.title == "a"));

        assert_eq!(harness.sink.starts().len(), 1);
        let snapshot = harness.scheduler.queue_snapshot(GUILD).unwrap();
        assert_eq!(snapshot.0.unwrap().title, "a");
        assert!(snapshot.1.is_empty());
    }

    #[tokio::test]
    async fn test_play_while_rendering_queues_at_tail() {
        let harness = Harness::new(&["a", "b"]);

        harness.scheduler.play(GUILD, "a").await.unwrap();
        let outcome = harness.scheduler.play(GUILD, "b").await.unwrap();
        assert!(matches!(outcome, PlayOutcome::Queued { position: 1, .. }));

        // first render untouched
        assert_eq!(harness.sink.starts().len(), 1);
        let snapshot = harness.scheduler.queue_snapshot(GUILD).unwrap();
        assert_eq!(snapshot.0.unwrap().title, "a");
        assert_eq!(snapshot.1.len(), 1);
    }

    #[tokio::test]
    async fn test_completion_advances_to_next_track() {
        let mut harness = Harness::new(&["a", "b"]);
        harness.scheduler.play(GUILD, "a").await.unwrap();
        harness.scheduler.play(GUILD, "b").await.unwrap();

        harness.sink.fire_completion();
        harness.pump().await;

        let snapshot = harness.scheduler.queue_snapshot(GUILD).unwrap();
        assert_eq!(snapshot.0.unwrap().title, "b");
        assert!(snapshot.1.is_empty());

        let starts = harness.sink.starts();
        assert_eq!(starts.len(), 2);
        assert!(starts[1].0.ends_with("/b"));
        assert_eq!(*harness.notifier.now_playing.lock().unwrap(), vec!["b"]);

        // finished track lands in history
        let session = harness.scheduler.session(GUILD).unwrap();
        let state = session.state.lock().unwrap();
        assert_eq!(state.queue.history().len(), 1);
        assert_eq!(state.queue.history()[0].title, "a");
    }

    #[tokio::test]
    async fn test_exhausted_queue_clears_current_and_announces() {
        let mut harness = Harness::new(&["a"]);
        harness.scheduler.play(GUILD, "a").await.unwrap();

        harness.sink.fire_completion();
        harness.pump().await;

        let snapshot = harness.scheduler.queue_snapshot(GUILD).unwrap();
        assert!(snapshot.0.is_none());
        assert_eq!(*harness.notifier.finished.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stop_clears_state_and_suppresses_stale_completion() {
        let mut harness = Harness::new(&["a", "b"]);
        harness.scheduler.play(GUILD, "a").await.unwrap();
        harness.scheduler.play(GUILD, "b").await.unwrap();

        // stop fires the pending hook (teardown), like the real sink
        assert!(harness.scheduler.stop(GUILD).await);
        harness.pump().await;

        // the stale completion must not have pushed b into render
        assert_eq!(harness.sink.starts().len(), 1);
        let snapshot = harness.scheduler.queue_snapshot(GUILD).unwrap();
        assert!(snapshot.0.is_none());
        assert!(snapshot.1.is_empty());
    }

    #[tokio::test]
    async fn test_late_completion_after_stop_is_discarded() {
        let mut harness = Harness::new(&["a", "b"]);
        harness.scheduler.play(GUILD, "a").await.unwrap();
        harness.scheduler.play(GUILD, "b").await.unwrap();

        // teardown where the process exit notification arrives later
        harness.sink.fire_on_stop.store(false, Ordering::SeqCst);
        harness.scheduler.stop(GUILD).await;
        harness.sink.fire_completion();
        harness.pump().await;

        assert_eq!(harness.sink.starts().len(), 1);
        assert!(harness.scheduler.queue_snapshot(GUILD).unwrap().0.is_none());
    }

    #[tokio::test]
    async fn test_skip_converges_on_normal_advancement() {
        let mut harness = Harness::new(&["a", "b"]);
        harness.scheduler.play(GUILD, "a").await.unwrap();
        harness.scheduler.play(GUILD, "b").await.unwrap();

        assert!(harness.scheduler.skip(GUILD).await);
        harness.pump().await;

        let snapshot = harness.scheduler.queue_snapshot(GUILD).unwrap();
        assert_eq!(snapshot.0.unwrap().title, "b");
        assert_eq!(harness.sink.starts().len(), 2);
    }

    #[tokio::test]
    async fn test_loop_rerenders_current_without_dequeue() {
        let mut harness = Harness::new(&["a", "b"]);
        harness.scheduler.play(GUILD, "a").await.unwrap();
        harness.scheduler.play(GUILD, "b").await.unwrap();
        harness.scheduler.set_loop(GUILD, true);

        harness.sink.fire_completion();
        harness.pump().await;

        let snapshot = harness.scheduler.queue_snapshot(GUILD).unwrap();
        assert_eq!(snapshot.0.unwrap().title, "a");
        assert_eq!(snapshot.1.len(), 1);

        let starts = harness.sink.starts();
        assert_eq!(starts.len(), 2);
        assert!(starts[1].0.ends_with("/a"));
    }

    #[tokio::test]
    async fn test_resolution_failure_leaves_session_unchanged() {
        let harness = Harness::new(&["a"]);
        harness.scheduler.play(GUILD, "a").await.unwrap();

        let outcome = harness.scheduler.play(GUILD, "does-not-exist").await.unwrap();
        assert_eq!(outcome, PlayOutcome::NotFound);

        let snapshot = harness.scheduler.queue_snapshot(GUILD).unwrap();
        assert_eq!(snapshot.0.unwrap().title, "a");
        assert!(snapshot.1.is_empty());
    }

    #[tokio::test]
    async fn test_volume_stays_in_unit_range_and_sticks() {
        let harness = Harness::new(&["a"]);

        harness.scheduler.set_volume(GUILD, 0).await.unwrap();
        harness.scheduler.set_volume(GUILD, 100).await.unwrap();
        let volume = {
            let session = harness.scheduler.session(GUILD).unwrap();
            let state = session.state.lock().unwrap();
            state.volume
        };
        assert!((0.0..=1.0).contains(&volume));

        // sticky volume applies at the next render start
        harness.scheduler.play(GUILD, "a").await.unwrap();
        assert!((harness.sink.starts()[0].1 - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        let harness = Harness::new(&[]);
        let outcome = harness.scheduler.join(GUILD, 10, 20, FakeSink::new());
        assert_eq!(outcome, JoinOutcome::AlreadyConnected);
    }

    #[tokio::test]
    async fn test_leave_discards_entire_session() {
        let harness = Harness::new(&["a", "b"]);
        harness.scheduler.play(GUILD, "a").await.unwrap();
        harness.scheduler.play(GUILD, "b").await.unwrap();

        assert!(harness.scheduler.leave(GUILD).await);
        assert!(!harness.scheduler.is_connected(GUILD));
        assert_eq!(
            harness.scheduler.play(GUILD, "a").await.unwrap(),
            PlayOutcome::NotConnected
        );
    }

    #[tokio::test]
    async fn test_queue_capacity_enforced() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (scheduler, _events) =
            PlaybackScheduler::new(FakeResolver::with(&["a", "b", "c"]), notifier, 0.5, 1);
        scheduler.join(GUILD, 10, 20, FakeSink::new());

        scheduler.play(GUILD, "a").await.unwrap();
        scheduler.play(GUILD, "b").await.unwrap();
        let outcome = scheduler.play(GUILD, "c").await.unwrap();
        assert_eq!(outcome, PlayOutcome::QueueFull);
        assert_eq!(scheduler.queue_snapshot(GUILD).unwrap().1.len(), 1);
    }
}
