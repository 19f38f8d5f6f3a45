//! Run-wide pause gate.
//!
//! Workers pass the gate between units of work. A paused gate holds them
//! there; a released gate stays open for good, so a kill never leaves a
//! worker parked.

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct GateState {
    paused: bool,
    released: bool,
}

/// Pause/resume gate shared by all workers of a run
#[derive(Debug, Default)]
pub struct PauseGate {
    state: Mutex<GateState>,
    opened: Condvar,
}

impl PauseGate {
    /// Create an open gate
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the gate; returns false if it was already closed
    pub fn pause(&self) -> bool {
        let mut state = self.state.lock();
        if state.paused || state.released {
            return false;
        }
        state.paused = true;
        true
    }

    /// Open the gate; returns false if it was already open
    pub fn resume(&self) -> bool {
        let mut state = self.state.lock();
        if !state.paused {
            return false;
        }
        state.paused = false;
        self.opened.notify_all();
        true
    }

    /// Whether workers are currently held
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    /// Open the gate permanently
    pub fn release(&self) {
        let mut state = self.state.lock();
        state.released = true;
        state.paused = false;
        self.opened.notify_all();
    }

    /// Block while the gate is closed
    pub fn wait_open(&self) {
        let mut state = self.state.lock();
        while state.paused && !state.released {
            self.opened.wait(&mut state);
        }
    }
}
