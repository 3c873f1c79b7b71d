//! Per-session track queue with history and loop support

use std::collections::VecDeque;

/// A resolved playable item. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    /// Direct streamable URL handed to the audio sink
    pub stream_url: String,
    /// Human-facing page URL, may be empty
    pub webpage_url: String,
    /// Duration in seconds; 0 means live/unknown
    pub duration_seconds: u64,
    pub uploader: String,
}

/// FIFO queue plus the now-playing pointer and an append-only history.
///
/// When `loop_enabled` is set, [`TrackQueue::next`] keeps returning the
/// current track without dequeuing.
#[derive(Debug, Default)]
pub struct TrackQueue {
    queue: VecDeque<Track>,
    history: Vec<Track>,
    current: Option<Track>,
    loop_enabled: bool,
}

impl TrackQueue {
    pub fn new() -> Self {
        TrackQueue::default()
    }

    /// Append a track to the tail of the queue
    pub fn add(&mut self, track: Track) {
        self.queue.push_back(track);
    }

    /// Advance to the next track and return it.
    ///
    /// With looping enabled and a current track set, returns the current
    /// track again and leaves the queue untouched. Otherwise pops the head,
    /// pushing the finished current track onto the history.
    pub fn next(&mut self) -> Option<Track> {
        if self.loop_enabled {
            if let Some(current) = &self.current {
                return Some(current.clone());
            }
        }

        let track = self.queue.pop_front()?;
        if let Some(finished) = self.current.take() {
            self.history.push(finished);
        }
        self.current = Some(track.clone());
        Some(track)
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    /// Install a track as now-playing without touching the queue (used when
    /// playback starts on an idle session)
    pub fn set_current(&mut self, track: Track) {
        self.current = Some(track);
    }

    /// Drop the now-playing pointer, leaving queue and history alone
    pub fn take_current(&mut self) -> Option<Track> {
        self.current.take()
    }

    /// Discard the queue and the now-playing pointer. History survives.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.current = None;
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn upcoming(&self) -> Vec<Track> {
        self.queue.iter().cloned().collect()
    }

    pub fn history(&self) -> &[Track] {
        &self.history
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str) -> Track {
        Track {
            title: title.to_string(),
            stream_url: format!("https://stream.example/{title}"),
            webpage_url: format!("https://watch.example/{title}"),
            duration_seconds: 180,
            uploader: "uploader".to_string(),
        }
    }

    #[test]
    fn test_fifo_order_preserved() {
        let mut queue = TrackQueue::new();
        queue.add(track("a"));
        queue.add(track("b"));
        queue.add(track("c"));

        assert_eq!(queue.next().unwrap().title, "a");
        assert_eq!(queue.next().unwrap().title, "b");
        assert_eq!(queue.next().unwrap().title, "c");
        assert!(queue.next().is_none());
    }

    #[test]
    fn test_next_moves_finished_track_to_history() {
        let mut queue = TrackQueue::new();
        queue.set_current(track("a"));
        queue.add(track("b"));

        let next = queue.next().unwrap();
        assert_eq!(next.title, "b");
        assert_eq!(queue.current().unwrap().title, "b");
        assert_eq!(queue.history().len(), 1);
        assert_eq!(queue.history()[0].title, "a");
    }

    #[test]
    fn test_loop_returns_current_without_dequeue() {
        let mut queue = TrackQueue::new();
        queue.set_current(track("a"));
        queue.add(track("b"));
        queue.set_loop(true);

        assert_eq!(queue.next().unwrap().title, "a");
        assert_eq!(queue.next().unwrap().title, "a");
        assert_eq!(queue.len(), 1);
        assert!(queue.history().is_empty());
    }

    #[test]
    fn test_loop_with_no_current_falls_through_to_queue() {
        let mut queue = TrackQueue::new();
        queue.set_loop(true);
        queue.add(track("a"));

        assert_eq!(queue.next().unwrap().title, "a");
    }

    #[test]
    fn test_clear_drops_queue_and_current_but_keeps_history() {
        let mut queue = TrackQueue::new();
        queue.set_current(track("a"));
        queue.add(track("b"));
        queue.next();
        queue.add(track("c"));

        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.current().is_none());
        assert_eq!(queue.history().len(), 1);
    }

    #[test]
    fn test_exhausted_queue_keeps_current() {
        let mut queue = TrackQueue::new();
        queue.set_current(track("a"));

        assert!(queue.next().is_none());
        assert_eq!(queue.current().unwrap().title, "a");
    }
}
