//! Tip selection between two states of the same stream
//!
//! Runs before a freshly fetched state is offered to a subject, so that a
//! stale answer from the network never rolls the held state back.

use std::cmp::Ordering;
use std::sync::Arc;

use strand_core::{StrandError, StrandResult, StreamState};

/// Which state won
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TipChoice {
    /// Keep the held state
    Current,
    /// Replace with the candidate
    Candidate,
}

/// Pick the more recent of `current` and `candidate`.
///
/// - candidate extends or equals current: candidate
/// - current strictly extends candidate: current
/// - diverged: earlier first anchor wins, then the longer log; ties keep current
pub fn select_tip(current: &StreamState, candidate: &StreamState) -> StrandResult<TipChoice> {
    let expected = current.stream_id();
    let actual = candidate.stream_id();
    if expected != actual {
        return Err(StrandError::GenesisMismatch { expected, actual });
    }

    // Equal logs go to the candidate; the subject's oracle decides whether
    // anything else (anchor status) changed
    if current.is_prefix_of(candidate) {
        return Ok(TipChoice::Candidate);
    }
    if candidate.is_prefix_of(current) {
        return Ok(TipChoice::Current);
    }

    let by_anchor = match (current.first_anchor_time(), candidate.first_anchor_time()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (None, None) => Ordering::Equal,
    };

    let choice = match by_anchor.then(candidate.len().cmp(&current.len())) {
        Ordering::Less | Ordering::Equal => TipChoice::Current,
        Ordering::Greater => TipChoice::Candidate,
    };

    tracing::debug!(
        stream = %expected,
        current_tip = %current.tip().cid,
        candidate_tip = %candidate.tip().cid,
        ?choice,
        "resolved diverged histories"
    );
    Ok(choice)
}

/// Convenience form returning the chosen state
pub fn select_state(
    current: &Arc<StreamState>,
    candidate: Arc<StreamState>,
) -> StrandResult<Arc<StreamState>> {
    Ok(match select_tip(current, &candidate)? {
        TipChoice::Current => current.clone(),
        TipChoice::Candidate => candidate,
    })
}
