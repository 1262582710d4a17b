//! Simulated pubsub network and anchor service
//!
//! Nodes announce full states to the simulated network; queries answer
//! with the announced state unless the network is partitioned (error) or
//! slower than the caller's timeout (no answer).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use strand_core::{Cid, StrandError, StrandResult, StreamId, StreamState, UnixTimestamp};
use strand_state::select_state;
use strand_sync::{AnchorService, StreamNetwork};
use tracing::trace;

use crate::fixtures::anchored;

/// In-process stand-in for the pubsub layer
#[derive(Default)]
pub struct SimulatedNetwork {
    tips: RwLock<HashMap<StreamId, StreamState>>,
    latency: RwLock<Duration>,
    partitioned: RwLock<bool>,
    queries: Mutex<Vec<(StreamId, Duration)>>,
    published: Mutex<Vec<(StreamId, Cid)>>,
}

impl SimulatedNetwork {
    pub fn new() -> Self {
        SimulatedNetwork::default()
    }

    /// Make `state` the network's answer for its stream. An announcement
    /// that would roll the known tip back is ignored.
    pub fn announce(&self, state: StreamState) {
        let id = state.stream_id();
        let mut tips = self.tips.write();
        let chosen = match tips.get(&id) {
            Some(known) => match select_state(&Arc::new(known.clone()), Arc::new(state)) {
                Ok(chosen) => (*chosen).clone(),
                Err(_) => return,
            },
            None => state,
        };
        tips.insert(id, chosen);
    }

    /// Simulated response time; answers slower than a query's timeout are lost
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.write() = latency;
    }

    pub fn set_partitioned(&self, partitioned: bool) {
        *self.partitioned.write() = partitioned;
    }

    pub fn queries(&self) -> Vec<(StreamId, Duration)> {
        self.queries.lock().clone()
    }

    pub fn published(&self) -> Vec<(StreamId, Cid)> {
        self.published.lock().clone()
    }
}

impl StreamNetwork for SimulatedNetwork {
    fn query_tip(&self, id: &StreamId, timeout: Duration) -> StrandResult<Option<StreamState>> {
        self.queries.lock().push((*id, timeout));

        if *self.partitioned.read() {
            return Err(StrandError::Network(format!("partitioned from peers of {}", id)));
        }
        if *self.latency.read() > timeout {
            trace!(stream = %id, ?timeout, "simulated query timed out");
            return Ok(None);
        }
        Ok(self.tips.read().get(id).cloned())
    }

    fn publish_tip(&self, id: &StreamId, tip: &Cid) -> StrandResult<()> {
        if *self.partitioned.read() {
            return Err(StrandError::Network(format!("cannot publish {}", tip)));
        }
        self.published.lock().push((*id, *tip));
        Ok(())
    }
}

/// Anchor service that queues requests and anchors them on demand
#[derive(Default)]
pub struct SimulatedAnchorService {
    pending: Mutex<Vec<(StreamId, Cid)>>,
    unavailable: RwLock<bool>,
}

impl SimulatedAnchorService {
    pub fn new() -> Self {
        SimulatedAnchorService::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write() = unavailable;
    }

    pub fn pending(&self) -> Vec<(StreamId, Cid)> {
        self.pending.lock().clone()
    }

    /// Anchor `state` at `at` if its tip was requested, consuming the request
    pub fn anchor(&self, state: &StreamState, at: UnixTimestamp) -> Option<StreamState> {
        let key = (state.stream_id(), state.tip().cid);
        let mut pending = self.pending.lock();
        let pos = pending.iter().position(|p| *p == key)?;
        pending.remove(pos);
        Some(anchored(state, at))
    }
}

impl AnchorService for SimulatedAnchorService {
    fn request_anchor(&self, id: &StreamId, tip: &Cid) -> StrandResult<()> {
        if *self.unavailable.read() {
            return Err(StrandError::Anchor("anchor service unavailable".into()));
        }
        self.pending.lock().push((*id, *tip));
        Ok(())
    }
}
