//! Collaborators that talk to the outside world
//!
//! The repository never fetches or anchors anything itself. It calls these
//! traits, which a node wires to its pubsub layer and anchor service.

use std::sync::Arc;
use std::time::Duration;

use strand_core::{Cid, StrandResult, StreamId, StreamState};

/// Pubsub side of the network
pub trait StreamNetwork: Send + Sync {
    /// Ask peers for the current tip of `id` and wait at most `timeout`.
    /// `Ok(None)` means nobody answered in time.
    fn query_tip(&self, id: &StreamId, timeout: Duration) -> StrandResult<Option<StreamState>>;

    /// Announce `tip` as the latest commit of `id`
    fn publish_tip(&self, id: &StreamId, tip: &Cid) -> StrandResult<()>;
}

/// Anchor service client
pub trait AnchorService: Send + Sync {
    /// Request that `tip` be anchored
    fn request_anchor(&self, id: &StreamId, tip: &Cid) -> StrandResult<()>;
}

impl<T: StreamNetwork + ?Sized> StreamNetwork for Arc<T> {
    fn query_tip(&self, id: &StreamId, timeout: Duration) -> StrandResult<Option<StreamState>> {
        (**self).query_tip(id, timeout)
    }

    fn publish_tip(&self, id: &StreamId, tip: &Cid) -> StrandResult<()> {
        (**self).publish_tip(id, tip)
    }
}

impl<T: AnchorService + ?Sized> AnchorService for Arc<T> {
    fn request_anchor(&self, id: &StreamId, tip: &Cid) -> StrandResult<()> {
        (**self).request_anchor(id, tip)
    }
}
