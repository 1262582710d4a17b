//! Observer that records every delivered state

use std::sync::Arc;

use parking_lot::Mutex;
use strand_core::StreamState;
use strand_state::{StateEquality, StreamStateSubject, SubscriptionId};

/// Shared log of delivered states
#[derive(Clone, Default)]
pub struct StateRecorder {
    states: Arc<Mutex<Vec<Arc<StreamState>>>>,
}

impl StateRecorder {
    pub fn new() -> Self {
        StateRecorder::default()
    }

    /// Subscribe to `subject`; the held state is recorded immediately
    pub fn attach<E: StateEquality>(&self, subject: &StreamStateSubject<E>) -> SubscriptionId {
        let states = self.states.clone();
        subject.subscribe(move |state| states.lock().push(state.clone()))
    }

    pub fn states(&self) -> Vec<Arc<StreamState>> {
        self.states.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.lock().is_empty()
    }

    /// Log length of every delivered state
    pub fn log_lens(&self) -> Vec<usize> {
        self.states.lock().iter().map(|s| s.len()).collect()
    }

    pub fn last(&self) -> Option<Arc<StreamState>> {
        self.states.lock().last().cloned()
    }
}
