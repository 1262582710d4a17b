//! State equality oracle
//!
//! Decides whether two stream states are the same as far as any consumer
//! can tell. The subject uses it to suppress redundant notifications, so an
//! oracle must err toward "different": a spurious notification is harmless,
//! a swallowed state change is not.

use std::sync::Arc;

use strand_core::{StrandError, StrandResult, StreamState};

/// Semantic comparison of two stream states
pub trait StateEquality: Send + Sync {
    /// `Ok(true)` if consumers could not tell `a` and `b` apart.
    /// An `Err` is treated as "not equal" by callers.
    fn equal(&self, a: &StreamState, b: &StreamState) -> StrandResult<bool>;
}

/// Explicit comparison of kind, anchor status and the ordered commit log.
/// Commits are compared by type, canonical CID and anchor timestamp.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommitLogEquality;

impl StateEquality for CommitLogEquality {
    fn equal(&self, a: &StreamState, b: &StreamState) -> StrandResult<bool> {
        if a.stream_type() != b.stream_type() || a.anchor_status() != b.anchor_status() {
            return Ok(false);
        }

        let (left, right) = (a.log(), b.log());
        if left.len() != right.len() {
            return Ok(false);
        }

        // Tip first: differing states almost always differ at the end
        for (l, r) in left.iter().rev().zip(right.iter().rev()) {
            if l.cid != r.cid || l.commit_type != r.commit_type || l.timestamp != r.timestamp {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Compares the canonical JSON encoding of both states
#[derive(Clone, Copy, Debug, Default)]
pub struct SerializedEquality;

impl StateEquality for SerializedEquality {
    fn equal(&self, a: &StreamState, b: &StreamState) -> StrandResult<bool> {
        let left = serde_json::to_vec(a).map_err(|e| StrandError::Comparison(e.to_string()))?;
        let right = serde_json::to_vec(b).map_err(|e| StrandError::Comparison(e.to_string()))?;
        Ok(left == right)
    }
}

/// Total equality: same allocation is equal without comparing, and any
/// oracle failure counts as a change.
pub fn states_equal<E>(oracle: &E, a: &Arc<StreamState>, b: &Arc<StreamState>) -> bool
where
    E: StateEquality + ?Sized,
{
    if Arc::ptr_eq(a, b) {
        return true;
    }

    match oracle.equal(a, b) {
        Ok(equal) => equal,
        Err(e) => {
            tracing::warn!(stream = %a.stream_id(), error = %e, "state comparison failed, treating as changed");
            false
        }
    }
}
