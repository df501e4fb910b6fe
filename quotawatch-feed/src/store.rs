//! Last-good-value store for one polled endpoint.

use std::time::Instant;

/// Holds the most recent successful snapshot from one endpoint.
///
/// A failed poll never touches the store, so consumers keep seeing the
/// last good value (stale-but-available over empty). Writes carry the
/// poller's tick sequence: a write tagged with a sequence not newer than
/// the last accepted one is rejected, so a slow out-of-order response can
/// never clobber a fresher snapshot.
#[derive(Debug)]
pub struct SnapshotStore<T> {
    latest: Option<T>,
    last_seq: u64,
    updated_at: Option<Instant>,
}

impl<T> SnapshotStore<T> {
    /// Create an empty store. [`get`](Self::get) returns `None` until the
    /// first accepted write.
    pub fn new() -> Self {
        Self {
            latest: None,
            last_seq: 0,
            updated_at: None,
        }
    }

    /// Replace the held snapshot wholesale.
    ///
    /// Returns `false` and leaves the store untouched when `seq` is not
    /// newer than the last accepted sequence.
    pub fn apply(&mut self, seq: u64, value: T) -> bool {
        if seq <= self.last_seq {
            return false;
        }
        self.latest = Some(value);
        self.last_seq = seq;
        self.updated_at = Some(Instant::now());
        true
    }

    /// The latest snapshot, or `None` before the first successful poll.
    pub fn get(&self) -> Option<&T> {
        self.latest.as_ref()
    }

    /// Sequence of the last accepted write; 0 before any.
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// When the last accepted write happened.
    pub fn updated_at(&self) -> Option<Instant> {
        self.updated_at
    }
}

impl<T> Default for SnapshotStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
