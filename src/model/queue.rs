//! Ordered playback queue with shuffle/repeat navigation
//!
//! The queue owns its tracks and a cursor. The cursor is `None` when the queue
//! is empty, and also when the current track was played ad hoc without being
//! enqueued. Otherwise it always points at a valid slot.

use rand::Rng;

use super::track::Track;
use super::types::RepeatMode;

/// Outcome of a `next`/`previous` step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    /// The cursor moved (or shuffle landed) on this index; load it.
    Moved(usize),
    /// Nothing changes.
    Stay,
    /// The queue is empty; stop playback and clear the current track.
    Stop,
}

#[derive(Clone, Debug, Default)]
pub struct PlaybackQueue {
    tracks: Vec<Track>,
    current: Option<usize>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    /// Append a track. The cursor is left alone.
    pub fn enqueue(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Remove the entry at `index`.
    ///
    /// The cursor keeps pointing at the same track; removing the active slot
    /// detaches the cursor (the track keeps playing ad hoc).
    pub fn remove(&mut self, index: usize) -> Option<Track> {
        if index >= self.tracks.len() {
            return None;
        }
        let removed = self.tracks.remove(index);
        self.current = match self.current {
            Some(current) if current == index => None,
            Some(current) if current > index => Some(current - 1),
            other => other,
        };
        Some(removed)
    }

    /// Point the cursor at `index` and return the track there.
    pub fn select(&mut self, index: usize) -> Option<&Track> {
        if index >= self.tracks.len() {
            return None;
        }
        self.current = Some(index);
        self.tracks.get(index)
    }

    /// Record that `track` is playing. Queue contents are untouched; the cursor
    /// is detached unless `track` already occupies the active slot.
    pub fn set_current(&mut self, track: &Track) {
        let occupies_active_slot = self
            .current_track()
            .is_some_and(|active| active.id == track.id);
        if !occupies_active_slot {
            self.current = None;
        }
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current = None;
    }

    /// Step forward under the given shuffle/repeat policy.
    ///
    /// Shuffle picks uniformly from the whole queue and may land on the
    /// current index again. Without shuffle the cursor advances, wrapping to
    /// the start only under `RepeatMode::All`; landing on the current index is
    /// a no-op.
    pub fn next<R: Rng>(&mut self, shuffle: bool, repeat: RepeatMode, rng: &mut R) -> Navigation {
        if self.tracks.is_empty() {
            self.current = None;
            return Navigation::Stop;
        }
        if shuffle {
            return self.shuffle_pick(rng);
        }

        let len = self.tracks.len();
        let candidate = match self.current {
            None => 0,
            Some(i) if i + 1 < len => i + 1,
            Some(_) if repeat == RepeatMode::All => 0,
            Some(_) => return Navigation::Stay,
        };
        self.move_to(candidate)
    }

    /// Step backward; the mirror image of [`PlaybackQueue::next`].
    ///
    /// A detached cursor counts as sitting before the first slot, so it only
    /// wraps (to the last slot) under `RepeatMode::All`.
    pub fn previous<R: Rng>(&mut self, shuffle: bool, repeat: RepeatMode, rng: &mut R) -> Navigation {
        if self.tracks.is_empty() {
            self.current = None;
            return Navigation::Stop;
        }
        if shuffle {
            return self.shuffle_pick(rng);
        }

        let len = self.tracks.len();
        let candidate = match self.current {
            Some(i) if i > 0 => i - 1,
            _ if repeat == RepeatMode::All => len - 1,
            _ => return Navigation::Stay,
        };
        self.move_to(candidate)
    }

    fn shuffle_pick<R: Rng>(&mut self, rng: &mut R) -> Navigation {
        let index = rng.gen_range(0..self.tracks.len());
        self.current = Some(index);
        Navigation::Moved(index)
    }

    fn move_to(&mut self, candidate: usize) -> Navigation {
        if self.current == Some(candidate) {
            return Navigation::Stay;
        }
        self.current = Some(candidate);
        Navigation::Moved(candidate)
    }
}
