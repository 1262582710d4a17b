//! Stream state
//!
//! A `StreamState` is an immutable snapshot of one stream: its kind, its
//! commit log and the fields derived from that log. New commits never mutate
//! a state; they produce a new value that replaces the old one.
//!
//! Log invariants, checked on every construction path:
//! - the log is non-empty
//! - the first entry is the genesis commit, and no other entry is
//! - commit CIDs are unique

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Cid, Commit, CommitType, StrandError, StrandResult, StreamId, StreamType, UnixTimestamp};

/// Anchoring status of the latest commit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnchorStatus {
    #[default]
    NotRequested,
    Pending,
    Processing,
    Anchored,
    Failed,
}

/// Immutable snapshot of a stream's commit log
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStreamState", rename_all = "camelCase")]
pub struct StreamState {
    #[serde(rename = "type")]
    stream_type: StreamType,
    log: Vec<Commit>,
    anchor_status: AnchorStatus,
}

/// Unchecked wire shape, validated into a `StreamState`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStreamState {
    #[serde(rename = "type")]
    stream_type: StreamType,
    log: Vec<Commit>,
    #[serde(default)]
    anchor_status: AnchorStatus,
}

impl TryFrom<RawStreamState> for StreamState {
    type Error = StrandError;

    fn try_from(raw: RawStreamState) -> StrandResult<Self> {
        validate_log(&raw.log)?;
        Ok(StreamState {
            stream_type: raw.stream_type,
            log: raw.log,
            anchor_status: raw.anchor_status,
        })
    }
}

fn validate_log(log: &[Commit]) -> StrandResult<()> {
    let first = log.first().ok_or(StrandError::EmptyLog)?;
    if first.commit_type != CommitType::Genesis {
        return Err(StrandError::MissingGenesis(first.commit_type));
    }

    let mut seen = HashSet::with_capacity(log.len());
    for (i, commit) in log.iter().enumerate() {
        if i > 0 && commit.commit_type == CommitType::Genesis {
            return Err(StrandError::MisplacedGenesis(i));
        }
        if !seen.insert(commit.cid) {
            return Err(StrandError::DuplicateCid(commit.cid));
        }
    }
    Ok(())
}

/// Status implied by the last entry of a log
fn derived_status(log: &[Commit]) -> AnchorStatus {
    match log.last() {
        Some(c) if c.is_anchor() => AnchorStatus::Anchored,
        _ => AnchorStatus::NotRequested,
    }
}

impl StreamState {
    /// State of a stream that has only its genesis commit
    pub fn genesis(stream_type: StreamType, genesis: Cid) -> Self {
        StreamState {
            stream_type,
            log: vec![Commit::genesis(genesis)],
            anchor_status: AnchorStatus::NotRequested,
        }
    }

    /// Rebuild the genesis-only state from a stream id
    pub fn from_stream_id(id: &StreamId) -> Self {
        StreamState::genesis(id.stream_type, id.genesis)
    }

    /// Build a state from a full log
    pub fn new(stream_type: StreamType, log: Vec<Commit>) -> StrandResult<Self> {
        validate_log(&log)?;
        let anchor_status = derived_status(&log);
        Ok(StreamState {
            stream_type,
            log,
            anchor_status,
        })
    }

    /// New state with `commit` appended
    pub fn append(&self, commit: Commit) -> StrandResult<Self> {
        if commit.commit_type == CommitType::Genesis {
            return Err(StrandError::MisplacedGenesis(self.log.len()));
        }
        if self.contains(&commit.cid) {
            return Err(StrandError::DuplicateCid(commit.cid));
        }

        let mut log = Vec::with_capacity(self.log.len() + 1);
        log.extend_from_slice(&self.log);
        log.push(commit);
        let anchor_status = derived_status(&log);

        Ok(StreamState {
            stream_type: self.stream_type,
            log,
            anchor_status,
        })
    }

    /// Same log, different anchor status
    pub fn with_anchor_status(&self, anchor_status: AnchorStatus) -> Self {
        StreamState {
            stream_type: self.stream_type,
            log: self.log.clone(),
            anchor_status,
        }
    }

    #[inline]
    pub fn stream_type(&self) -> StreamType {
        self.stream_type
    }

    #[inline]
    pub fn log(&self) -> &[Commit] {
        &self.log
    }

    #[inline]
    pub fn anchor_status(&self) -> AnchorStatus {
        self.anchor_status
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Never true: a valid state always holds its genesis commit
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn genesis_commit(&self) -> &Commit {
        &self.log[0]
    }

    pub fn tip(&self) -> &Commit {
        &self.log[self.log.len() - 1]
    }

    pub fn stream_id(&self) -> StreamId {
        StreamId::new(self.stream_type, self.genesis_commit().cid)
    }

    pub fn is_genesis_only(&self) -> bool {
        self.log.len() == 1
    }

    pub fn contains(&self, cid: &Cid) -> bool {
        self.log.iter().any(|c| &c.cid == cid)
    }

    pub fn last_anchor(&self) -> Option<&Commit> {
        self.log.iter().rev().find(|c| c.is_anchor())
    }

    /// Anchoring time of the earliest anchor commit
    pub fn first_anchor_time(&self) -> Option<UnixTimestamp> {
        self.log
            .iter()
            .find(|c| c.is_anchor())
            .and_then(|c| c.timestamp)
    }

    /// True if this log is a prefix of (or equal to) `other`'s log
    pub fn is_prefix_of(&self, other: &StreamState) -> bool {
        self.stream_type == other.stream_type
            && self.log.len() <= other.log.len()
            && self
                .log
                .iter()
                .zip(other.log.iter())
                .all(|(a, b)| a.cid == b.cid)
    }

    /// The state as it was at `at_time`: the log up to the last anchor
    /// commit anchored at or before `at_time`, or genesis only if none was.
    pub fn rewind(&self, at_time: UnixTimestamp) -> StreamState {
        let end = self
            .log
            .iter()
            .rposition(|c| c.is_anchor() && c.timestamp.is_some_and(|t| t <= at_time))
            .map(|i| i + 1)
            .unwrap_or(1);

        let log = self.log[..end].to_vec();
        let anchor_status = derived_status(&log);
        StreamState {
            stream_type: self.stream_type,
            log,
            anchor_status,
        }
    }
}
