// src/watch/debounce.rs

use std::collections::HashMap;

use tokio::task::AbortHandle;
use tracing::debug;

/// Debounce state of one relative path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Pending,
}

/// Per-path pending timers.
///
/// A path is present only while its timer is armed. While pending, further
/// events for it are dropped outright: they neither merge into the pending
/// notification nor push its deadline back.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: HashMap<String, AbortHandle>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, rel_path: &str) -> DebounceState {
        if self.pending.contains_key(rel_path) {
            DebounceState::Pending
        } else {
            DebounceState::Idle
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Start a debounce cycle for `rel_path` unless one is already pending.
    ///
    /// `arm` is only called when the path was idle; it must start the timer
    /// and hand back a way to cancel it. Returns true if the event was admitted.
    pub fn admit<F>(&mut self, rel_path: &str, arm: F) -> bool
    where
        F: FnOnce() -> AbortHandle,
    {
        if self.pending.contains_key(rel_path) {
            debug!(path = %rel_path, "event dropped; path already debouncing");
            return false;
        }
        self.pending.insert(rel_path.to_string(), arm());
        true
    }

    /// Mark the path idle again. Must run before the settled-change handler
    /// so that events raised during the handler open a new cycle.
    pub fn settle(&mut self, rel_path: &str) -> bool {
        self.pending.remove(rel_path).is_some()
    }

    /// Abort every armed timer.
    pub fn cancel_all(&mut self) {
        for (path, handle) in self.pending.drain() {
            debug!(%path, "cancelling pending debounce timer");
            handle.abort();
        }
    }
}
