//! Stream repository
//!
//! Keeps one subject per running stream and feeds it according to the load
//! and update options:
//! 1. Resolve options into a plan
//! 2. Find a base state (running subject, state store, or genesis from the id)
//! 3. Ask the network for the tip if the plan says so
//! 4. Select the newer of base and answer
//! 5. Push into the subject and the store
//! 6. Anchor and publish after writes
//!
//! Errors from collaborators propagate before anything is pushed.
//!
//! Steps 4 and 5 run under a per-stream writer guard, so concurrent loads
//! and updates of one stream cannot roll its held state back. The guard is
//! re-entrant: an observer may write to the stream it is observing.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use strand_core::{
    AnchorStatus, CreateOpts, LoadOpts, StrandError, StrandResult, StreamId, StreamState,
    UpdateOpts,
};
use strand_state::{select_state, StreamStateSubject};
use tracing::{debug, info, warn};

use crate::{AnchorService, LoadPlan, MemoryStore, StateStore, StreamNetwork, SyncConfig};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    pub cache_hits: u64,
    pub network_queries: u64,
    pub network_misses: u64,
    pub pushes: u64,
    pub anchors_requested: u64,
    pub tips_published: u64,
}

/// A running stream and the guard its writers take
struct RunningStream {
    subject: Arc<StreamStateSubject>,
    writer: ReentrantMutex<()>,
}

/// Running streams plus the collaborators that feed them
pub struct Repository<N, A, S = MemoryStore> {
    config: SyncConfig,
    network: N,
    anchor: A,
    store: S,
    running: RwLock<HashMap<StreamId, Arc<RunningStream>>>,
    stats: Mutex<RepositoryStats>,
}

impl<N: StreamNetwork, A: AnchorService> Repository<N, A, MemoryStore> {
    pub fn new(config: SyncConfig, network: N, anchor: A) -> Self {
        Self::with_store(config, network, anchor, MemoryStore::new())
    }
}

impl<N: StreamNetwork, A: AnchorService, S: StateStore> Repository<N, A, S> {
    pub fn with_store(config: SyncConfig, network: N, anchor: A, store: S) -> Self {
        Repository {
            config,
            network,
            anchor,
            store,
            running: RwLock::new(HashMap::new()),
            stats: Mutex::new(RepositoryStats::default()),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn anchor_service(&self) -> &A {
        &self.anchor
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn stats(&self) -> RepositoryStats {
        self.stats.lock().clone()
    }

    /// Subject of a running stream, without loading
    pub fn get(&self, id: &StreamId) -> Option<Arc<StreamStateSubject>> {
        self.running(id).map(|stream| stream.subject.clone())
    }

    fn running(&self, id: &StreamId) -> Option<Arc<RunningStream>> {
        self.running.read().get(id).cloned()
    }

    pub fn running_count(&self) -> usize {
        self.running.read().len()
    }

    /// Stop tracking a stream. Its subject (and every subscription on it)
    /// is released once the last handle drops; the stored state is kept.
    pub fn unload(&self, id: &StreamId) -> bool {
        self.running.write().remove(id).is_some()
    }

    /// Load a stream and return its live subject.
    ///
    /// The subject always tracks the tip; `at_time` is ignored here and
    /// honored by `load_at_time`.
    pub fn load(&self, id: &StreamId, opts: &LoadOpts) -> StrandResult<Arc<StreamStateSubject>> {
        let plan = LoadPlan::resolve(opts, &self.config);
        Ok(self.load_with_plan(id, &plan)?.subject.clone())
    }

    /// Load a stream as it was at `opts.at_time`.
    ///
    /// The sync step runs first, exactly as for `load`, so the live subject
    /// still gets the refreshed tip. The returned snapshot is not pushed.
    pub fn load_at_time(&self, id: &StreamId, opts: &LoadOpts) -> StrandResult<Arc<StreamState>> {
        let plan = LoadPlan::resolve(opts, &self.config);
        let current = self.load_with_plan(id, &plan)?.subject.value();

        match plan.at_time {
            Some(at_time) => {
                let past = current.rewind(at_time);
                debug!(stream = %id, %at_time, log_len = past.len(), "rewound stream");
                Ok(Arc::new(past))
            }
            None => Ok(current),
        }
    }

    /// Apply a new state produced by a write to `id`, then anchor and
    /// publish its tip as the options (or configuration) ask.
    pub fn update(
        &self,
        id: &StreamId,
        candidate: StreamState,
        opts: &UpdateOpts,
    ) -> StrandResult<Arc<StreamState>> {
        let stream = match self.running(id) {
            Some(stream) => stream,
            None => {
                let plan = LoadPlan::resolve(&LoadOpts::default(), &self.config);
                self.load_with_plan(id, &plan)?
            }
        };

        let candidate = if self.wants_anchor(opts, &candidate) {
            candidate.with_anchor_status(AnchorStatus::Pending)
        } else {
            candidate
        };
        self.push(&stream, Arc::new(candidate))?;
        self.finish_write(id, &stream, opts)
    }

    /// Register a new stream from its genesis-only state, sync it as the
    /// create options say, then anchor and publish.
    pub fn create(
        &self,
        genesis: StreamState,
        opts: &CreateOpts,
    ) -> StrandResult<Arc<StreamStateSubject>> {
        let id = genesis.stream_id();
        if !genesis.is_genesis_only() {
            return Err(StrandError::NotGenesisOnly(id));
        }

        if self.get(&id).is_none() && self.store.get(&id).is_none() {
            info!(stream = %id, "creating stream");
            self.store.put(Arc::new(genesis));
        }

        let plan = LoadPlan::resolve_create(&opts.load, &self.config);
        let stream = self.load_with_plan(&id, &plan)?;
        self.finish_write(&id, &stream, &opts.update_opts())?;
        Ok(stream.subject.clone())
    }

    fn load_with_plan(&self, id: &StreamId, plan: &LoadPlan) -> StrandResult<Arc<RunningStream>> {
        let (base, cached) = self.base_state(id);

        let state = if plan.queries_network(cached) {
            self.stats.lock().network_queries += 1;
            debug!(stream = %id, sync = %plan.sync, timeout = ?plan.timeout, "querying network for tip");
            match self.network.query_tip(id, plan.timeout)? {
                Some(remote) => select_state(&base, Arc::new(remote))?,
                None => {
                    self.stats.lock().network_misses += 1;
                    warn!(stream = %id, timeout = ?plan.timeout, "no tip received before timeout");
                    base
                }
            }
        } else {
            debug!(stream = %id, sync = %plan.sync, cached, "skipping network");
            base
        };

        let stream = self.track(id, state)?;
        if cached {
            self.stats.lock().cache_hits += 1;
        }
        Ok(stream)
    }

    fn base_state(&self, id: &StreamId) -> (Arc<StreamState>, bool) {
        if let Some(subject) = self.get(id) {
            return (subject.value(), true);
        }
        if let Some(state) = self.store.get(id) {
            return (state, true);
        }
        (Arc::new(StreamState::from_stream_id(id)), false)
    }

    fn track(&self, id: &StreamId, state: Arc<StreamState>) -> StrandResult<Arc<RunningStream>> {
        let stream = self
            .running
            .write()
            .entry(*id)
            .or_insert_with(|| {
                Arc::new(RunningStream {
                    subject: Arc::new(StreamStateSubject::new(state.clone())),
                    writer: ReentrantMutex::new(()),
                })
            })
            .clone();

        self.push(&stream, state)?;
        Ok(stream)
    }

    /// Offer `state` to the subject unless the subject already holds a newer
    /// history, and keep the store in step. Observers run inside this call.
    fn push(&self, stream: &RunningStream, state: Arc<StreamState>) -> StrandResult<()> {
        let _writer = stream.writer.lock();
        let chosen = select_state(&stream.subject.value(), state)?;
        if stream.subject.next(chosen) {
            self.stats.lock().pushes += 1;
        }
        self.store.put(stream.subject.value());
        Ok(())
    }

    /// Set the anchor status of the held state
    fn mark(&self, stream: &RunningStream, status: AnchorStatus) -> StrandResult<()> {
        let _writer = stream.writer.lock();
        let held = stream.subject.value();
        if held.anchor_status() == status {
            return Ok(());
        }
        self.push(stream, Arc::new(held.with_anchor_status(status)))
    }

    fn wants_anchor(&self, opts: &UpdateOpts, state: &StreamState) -> bool {
        opts.anchor.unwrap_or(self.config.anchor) && !state.tip().is_anchor()
    }

    fn finish_write(
        &self,
        id: &StreamId,
        stream: &RunningStream,
        opts: &UpdateOpts,
    ) -> StrandResult<Arc<StreamState>> {
        let state = stream.subject.value();
        let tip = state.tip().cid;

        if self.wants_anchor(opts, &state) {
            self.mark(stream, AnchorStatus::Pending)?;
            if let Err(e) = self.anchor.request_anchor(id, &tip) {
                warn!(stream = %id, %tip, error = %e, "anchor request failed");
                self.mark(stream, AnchorStatus::Failed)?;
                return Err(e);
            }
            self.stats.lock().anchors_requested += 1;
            info!(stream = %id, %tip, "anchor requested");
        }

        if opts.publish.unwrap_or(self.config.publish) {
            self.network.publish_tip(id, &tip)?;
            self.stats.lock().tips_published += 1;
            debug!(stream = %id, %tip, "tip published");
        }

        let state = stream.subject.value();
        self.store.put(state.clone());
        Ok(state)
    }
}
