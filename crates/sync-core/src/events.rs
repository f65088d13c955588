//! Event gate
//!
//! Bulk imports write through the system of record, which raises the same
//! save/delete events a user edit would. Handlers ignore those events while
//! the gate is paused. Pausing is scoped: [`EventGate::pause`] returns a
//! guard and the pause ends when the guard drops, on every exit path.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared pause state. Nested pauses are counted.
#[derive(Debug, Default)]
pub struct EventGate {
    depth: AtomicUsize,
}

impl EventGate {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "events resume as soon as the guard is dropped"]
    pub fn pause(&self) -> PauseGuard<'_> {
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(depth, "events paused");
        PauseGuard { gate: self }
    }

    pub fn is_paused(&self) -> bool {
        self.depth.load(Ordering::SeqCst) > 0
    }
}

/// Keeps its [`EventGate`] paused while alive.
#[derive(Debug)]
pub struct PauseGuard<'a> {
    gate: &'a EventGate,
}

impl Drop for PauseGuard<'_> {
    fn drop(&mut self) {
        let previous = self.gate.depth.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(depth = previous.saturating_sub(1), "events pause released");
    }
}
