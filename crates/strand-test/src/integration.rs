//! End-to-end Integration Test Suite
//!
//! Several repositories share one simulated network and anchor service:
//! - Writes propagate through announcements
//! - Sync modes decide when a node looks at the network
//! - Anchoring moves a stream from pending to anchored
//! - Historical loads rewind without touching live subjects

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use strand_core::{
    codec, Cid, Commit, CreateOpts, LoadOpts, StrandResult, StreamId, StreamState, SyncMode,
    UnixTimestamp, UpdateOpts,
};
use strand_state::StreamStateSubject;
use strand_sync::{Repository, SyncConfig};
use tracing::debug;

use crate::network::{SimulatedAnchorService, SimulatedNetwork};

// ============================================================================
// SIMULATED NODE
// ============================================================================

pub type SimulatedRepository = Repository<Arc<SimulatedNetwork>, Arc<SimulatedAnchorService>>;

/// A node with its own repository on a shared simulated network
pub struct SimulatedNode {
    /// Node name, mixed into commit CIDs
    pub name: String,

    repo: SimulatedRepository,

    network: Arc<SimulatedNetwork>,

    anchor: Arc<SimulatedAnchorService>,

    /// Commit sequence counter
    seq: AtomicU64,
}

impl SimulatedNode {
    pub fn new(
        name: &str,
        config: SyncConfig,
        network: Arc<SimulatedNetwork>,
        anchor: Arc<SimulatedAnchorService>,
    ) -> Self {
        SimulatedNode {
            name: name.to_string(),
            repo: Repository::new(config, network.clone(), anchor.clone()),
            network,
            anchor,
            seq: AtomicU64::new(0),
        }
    }

    pub fn repo(&self) -> &SimulatedRepository {
        &self.repo
    }

    /// Next signed commit authored by this node
    pub fn signed_commit(&self) -> Commit {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let seed = format!("{}:{}", self.name, seq);
        Commit::signed(Cid::hash(codec::DAG_JOSE, seed.as_bytes()))
    }

    /// Create a stream, announcing its genesis if the write publishes
    pub fn create(
        &self,
        genesis: StreamState,
        opts: &CreateOpts,
    ) -> StrandResult<Arc<StreamStateSubject>> {
        let subject = self.repo.create(genesis, opts)?;
        if self.publishes(&opts.update_opts()) {
            self.network.announce(StreamState::clone(&subject.value()));
        }
        Ok(subject)
    }

    /// Append one signed commit to the node's view of `id`
    pub fn write(&self, id: &StreamId, opts: &UpdateOpts) -> StrandResult<Arc<StreamState>> {
        let current = match self.repo.get(id) {
            Some(subject) => subject.value(),
            None => {
                let local = LoadOpts::default().with_sync(SyncMode::NeverSync);
                self.repo.load(id, &local)?.value()
            }
        };

        let next = current.append(self.signed_commit())?;
        let state = self.repo.update(id, next, opts)?;
        debug!(node = %self.name, stream = %id, log_len = state.len(), "wrote commit");

        if self.publishes(opts) {
            self.network.announce(StreamState::clone(&state));
        }
        Ok(state)
    }

    /// Apply the anchor service's answer for the current tip, if it has one
    pub fn complete_anchor(
        &self,
        id: &StreamId,
        at: UnixTimestamp,
    ) -> StrandResult<Option<Arc<StreamState>>> {
        let current = match self.repo.get(id) {
            Some(subject) => subject.value(),
            None => return Ok(None),
        };
        let anchored = match self.anchor.anchor(&current, at) {
            Some(anchored) => anchored,
            None => return Ok(None),
        };

        let opts = UpdateOpts::default().with_anchor(false);
        let state = self.repo.update(id, anchored, &opts)?;
        if self.publishes(&opts) {
            self.network.announce(StreamState::clone(&state));
        }
        Ok(Some(state))
    }

    fn publishes(&self, opts: &UpdateOpts) -> bool {
        opts.publish.unwrap_or(self.repo.config().publish)
    }
}

// ============================================================================
// CLUSTER
// ============================================================================

/// Nodes sharing one network and one anchor service
pub struct SimulatedCluster {
    pub network: Arc<SimulatedNetwork>,
    pub anchor: Arc<SimulatedAnchorService>,
    pub nodes: Vec<SimulatedNode>,
}

impl SimulatedCluster {
    pub fn new(node_count: usize, config: SyncConfig) -> Self {
        let network = Arc::new(SimulatedNetwork::new());
        let anchor = Arc::new(SimulatedAnchorService::new());
        let nodes = (0..node_count)
            .map(|i| {
                SimulatedNode::new(
                    &format!("node-{}", i),
                    config.clone(),
                    network.clone(),
                    anchor.clone(),
                )
            })
            .collect();

        SimulatedCluster {
            network,
            anchor,
            nodes,
        }
    }

    pub fn node(&self, i: usize) -> &SimulatedNode {
        &self.nodes[i]
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use strand_core::{AnchorStatus, StrandError};

    use crate::fixtures::genesis_state;
    use crate::logging::init_tracing;
    use crate::recorder::StateRecorder;

    fn no_anchor() -> UpdateOpts {
        UpdateOpts::default().with_anchor(false)
    }

    fn created(cluster: &SimulatedCluster, seed: u64) -> StreamId {
        let genesis = genesis_state(seed);
        let id = genesis.stream_id();
        cluster
            .node(0)
            .create(genesis, &CreateOpts::default().with_anchor(false))
            .unwrap();
        id
    }

    #[test]
    fn test_two_nodes_converge() {
        init_tracing();
        let cluster = SimulatedCluster::new(2, SyncConfig::default());
        let id = created(&cluster, 1);
        cluster.node(0).write(&id, &no_anchor()).unwrap();
        cluster.node(0).write(&id, &no_anchor()).unwrap();

        let b = cluster.node(1);
        let subject = b.repo().load(&id, &LoadOpts::default()).unwrap();
        assert_eq!(subject.value().len(), 3);

        let recorder = StateRecorder::new();
        recorder.attach(&subject);

        cluster.node(0).write(&id, &no_anchor()).unwrap();

        // Cached: no new query
        b.repo().load(&id, &LoadOpts::default()).unwrap();
        assert_eq!(recorder.log_lens(), vec![3]);
        assert_eq!(cluster.network.queries().len(), 1);

        b.repo()
            .load(&id, &LoadOpts::default().with_sync(SyncMode::SyncAlways))
            .unwrap();
        assert_eq!(recorder.log_lens(), vec![3, 4]);
        assert_eq!(
            subject.value(),
            cluster.node(0).repo().get(&id).unwrap().value()
        );
    }

    #[test]
    fn test_repeated_sync_is_suppressed() {
        init_tracing();
        let cluster = SimulatedCluster::new(2, SyncConfig::default());
        let id = created(&cluster, 2);
        cluster.node(0).write(&id, &no_anchor()).unwrap();

        let b = cluster.node(1);
        let subject = b.repo().load(&id, &LoadOpts::default()).unwrap();
        let first = StateRecorder::new();
        let second = StateRecorder::new();
        first.attach(&subject);
        second.attach(&subject);

        let before = subject.stats();
        let always = LoadOpts::default().with_sync(SyncMode::SyncAlways);
        for _ in 0..5 {
            b.repo().load(&id, &always).unwrap();
        }

        assert_eq!(first.log_lens(), vec![2]);
        assert_eq!(first.states(), second.states());
        let after = subject.stats();
        assert_eq!(after.emitted, before.emitted);
        assert_eq!(after.suppressed, before.suppressed + 5);
    }

    #[test]
    fn test_local_history_survives_stale_network() {
        init_tracing();
        let cluster = SimulatedCluster::new(2, SyncConfig::default());
        let id = created(&cluster, 3);

        let b = cluster.node(1);
        let subject = b.repo().load(&id, &LoadOpts::default()).unwrap();
        let recorder = StateRecorder::new();
        recorder.attach(&subject);

        let unpublished = no_anchor().with_publish(false);
        b.write(&id, &unpublished).unwrap();
        b.write(&id, &unpublished).unwrap();

        b.repo()
            .load(&id, &LoadOpts::default().with_sync(SyncMode::SyncAlways))
            .unwrap();
        assert_eq!(recorder.log_lens(), vec![1, 2, 3]);
    }

    #[test]
    fn test_anchor_flow() {
        init_tracing();
        let cluster = SimulatedCluster::new(2, SyncConfig::default());
        let id = created(&cluster, 4);
        let a = cluster.node(0);

        let written = a.write(&id, &UpdateOpts::default()).unwrap();
        assert_eq!(written.anchor_status(), AnchorStatus::Pending);
        assert_eq!(cluster.anchor.pending(), vec![(id, written.tip().cid)]);
        assert!(cluster.network.published().contains(&(id, written.tip().cid)));

        let anchored = a
            .complete_anchor(&id, UnixTimestamp(500))
            .unwrap()
            .unwrap();
        assert_eq!(anchored.anchor_status(), AnchorStatus::Anchored);
        assert_eq!(anchored.len(), 3);
        assert!(cluster.anchor.pending().is_empty());
        assert_eq!(a.repo().stats().anchors_requested, 1);

        // Nothing left to anchor
        assert!(a.complete_anchor(&id, UnixTimestamp(600)).unwrap().is_none());

        let b = cluster.node(1);
        let subject = b.repo().load(&id, &LoadOpts::default()).unwrap();
        assert_eq!(subject.value().anchor_status(), AnchorStatus::Anchored);
    }

    #[test]
    fn test_anchor_service_down() {
        init_tracing();
        let cluster = SimulatedCluster::new(1, SyncConfig::default());
        let id = created(&cluster, 5);
        cluster.anchor.set_unavailable(true);

        let err = cluster
            .node(0)
            .write(&id, &UpdateOpts::default())
            .unwrap_err();
        assert!(matches!(err, StrandError::Anchor(_)));
        let held = cluster.node(0).repo().get(&id).unwrap().value();
        assert_eq!(held.anchor_status(), AnchorStatus::Failed);
        assert_eq!(held.len(), 2);
    }

    #[test]
    fn test_load_at_time_rewinds_snapshot_only() {
        init_tracing();
        let cluster = SimulatedCluster::new(2, SyncConfig::default());
        let id = created(&cluster, 6);
        let a = cluster.node(0);
        a.write(&id, &UpdateOpts::default()).unwrap();
        a.complete_anchor(&id, UnixTimestamp(1_000)).unwrap();
        a.write(&id, &no_anchor()).unwrap();

        let b = cluster.node(1);
        let before = LoadOpts::default().at_time(UnixTimestamp(999));
        let past = b.repo().load_at_time(&id, &before).unwrap();
        assert!(past.is_genesis_only());

        let after = LoadOpts::default().at_time(UnixTimestamp(1_000));
        let past = b.repo().load_at_time(&id, &after).unwrap();
        assert_eq!(past.len(), 3);
        assert!(past.tip().is_anchor());

        // The live subject still tracks the tip
        assert_eq!(b.repo().get(&id).unwrap().value().len(), 4);
    }

    #[test]
    fn test_diverged_histories_prefer_earlier_anchor() {
        init_tracing();
        let cluster = SimulatedCluster::new(2, SyncConfig::default());
        let id = created(&cluster, 7);
        let (a, b) = (cluster.node(0), cluster.node(1));

        b.repo().load(&id, &LoadOpts::default()).unwrap();
        let local = no_anchor().with_publish(false);
        b.write(&id, &local).unwrap();
        b.write(&id, &local).unwrap();
        b.write(&id, &local).unwrap();

        a.write(&id, &UpdateOpts::default()).unwrap();
        a.complete_anchor(&id, UnixTimestamp(50)).unwrap();

        let subject = b
            .repo()
            .load(&id, &LoadOpts::default().with_sync(SyncMode::SyncAlways))
            .unwrap();
        assert_eq!(subject.value(), a.repo().get(&id).unwrap().value());
        assert_eq!(subject.value().first_anchor_time(), Some(UnixTimestamp(50)));
    }

    #[test]
    fn test_never_sync_stays_offline() {
        init_tracing();
        let cluster = SimulatedCluster::new(2, SyncConfig::offline());
        let genesis = genesis_state(8);
        let id = genesis.stream_id();
        cluster.network.announce(genesis);

        let subject = cluster
            .node(1)
            .repo()
            .load(&id, &LoadOpts::default())
            .unwrap();
        assert!(subject.value().is_genesis_only());
        assert!(cluster.network.queries().is_empty());
        assert_eq!(cluster.node(1).repo().stats().network_queries, 0);
    }

    #[test]
    fn test_partition_and_timeout() {
        init_tracing();
        let cluster = SimulatedCluster::new(2, SyncConfig::default());
        let id = created(&cluster, 9);
        cluster.node(0).write(&id, &no_anchor()).unwrap();
        let b = cluster.node(1);

        cluster.network.set_partitioned(true);
        let err = b.repo().load(&id, &LoadOpts::default()).unwrap_err();
        assert!(matches!(err, StrandError::Network(_)));
        assert_eq!(b.repo().running_count(), 0);
        cluster.network.set_partitioned(false);

        cluster.network.set_latency(Duration::from_secs(5));
        let quick = LoadOpts::default().with_sync_timeout_seconds(1);
        let subject = b.repo().load(&id, &quick).unwrap();
        assert!(subject.value().is_genesis_only());
        assert_eq!(b.repo().stats().network_misses, 1);

        let patient = LoadOpts::default()
            .with_sync(SyncMode::SyncAlways)
            .with_sync_timeout_seconds(10);
        b.repo().load(&id, &patient).unwrap();
        assert_eq!(subject.value().len(), 2);

        let timeouts: Vec<Duration> = cluster.network.queries().iter().map(|q| q.1).collect();
        assert_eq!(
            timeouts,
            vec![
                Duration::from_secs(3),
                Duration::from_secs(1),
                Duration::from_secs(10)
            ]
        );
    }
}
