use std::sync::Mutex;

use anyhow::Result;
use types::beacon_state::BeaconState;

use crate::error::Error;

/// The canonical beacon state snapshot.
///
/// Requests work on clones; `commit` replaces the snapshot wholesale after
/// a finalized transition. There is never a partially applied state here.
pub struct StateStore {
    state: Mutex<Option<BeaconState>>,
}

impl StateStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state
            .lock()
            .expect("state store mutex is poisoned")
            .is_some()
    }

    /// A private copy of the canonical state for the current request.
    pub fn state_from_context(&self) -> Result<BeaconState> {
        self.state
            .lock()
            .expect("state store mutex is poisoned")
            .clone()
            .ok_or_else(|| Error::StateNotInitialized.into())
    }

    pub fn commit(&self, state: BeaconState) {
        *self.state.lock().expect("state store mutex is poisoned") = Some(state);
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
