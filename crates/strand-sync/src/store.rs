//! State store - the node's cache and pin store for stream states

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use strand_core::{StreamId, StreamState};

/// Where loaded states are kept between loads
pub trait StateStore: Send + Sync {
    fn get(&self, id: &StreamId) -> Option<Arc<StreamState>>;

    fn put(&self, state: Arc<StreamState>);

    fn remove(&self, id: &StreamId) -> Option<Arc<StreamState>>;
}

/// In-memory state store
#[derive(Debug, Default)]
pub struct MemoryStore {
    states: RwLock<HashMap<StreamId, Arc<StreamState>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, id: &StreamId) -> Option<Arc<StreamState>> {
        self.states.read().get(id).cloned()
    }

    fn put(&self, state: Arc<StreamState>) {
        self.states.write().insert(state.stream_id(), state);
    }

    fn remove(&self, id: &StreamId) -> Option<Arc<StreamState>> {
        self.states.write().remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_core::{codec, Cid, Commit, StreamType};

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        let genesis = StreamState::genesis(StreamType::Tile, Cid::hash(codec::DAG_CBOR, b"g"));
        let id = genesis.stream_id();
        assert!(store.get(&id).is_none());

        store.put(Arc::new(genesis.clone()));
        let next = genesis
            .append(Commit::signed(Cid::hash(codec::DAG_JOSE, b"u")))
            .unwrap();
        store.put(Arc::new(next.clone()));

        assert_eq!(store.len(), 1);
        assert_eq!(*store.get(&id).unwrap(), next);
        assert!(store.remove(&id).is_some());
        assert!(store.is_empty());
    }
}
