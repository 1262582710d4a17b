//! Commit log entries
//!
//! A stream's history is an append-only log of commits:
//! - Genesis: the first commit, fixes the stream's identity
//! - Signed: an update authored by a controller
//! - Anchor: a proof that the log up to this point was timestamped on chain

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Cid, StrandError, StrandResult, UnixTimestamp};

/// Commit kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum CommitType {
    Genesis = 0x00,
    Signed = 0x01,
    Anchor = 0x02,
}

impl CommitType {
    /// Parse from wire byte
    pub fn from_byte(b: u8) -> StrandResult<Self> {
        match b {
            0x00 => Ok(CommitType::Genesis),
            0x01 => Ok(CommitType::Signed),
            0x02 => Ok(CommitType::Anchor),
            other => Err(StrandError::UnknownCommitType(other)),
        }
    }

    #[inline]
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            CommitType::Genesis => "GENESIS",
            CommitType::Signed => "SIGNED",
            CommitType::Anchor => "ANCHOR",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of a stream's log
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commit {
    #[serde(rename = "type")]
    pub commit_type: CommitType,
    pub cid: Cid,
    /// Anchoring time, carried by anchor commits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<UnixTimestamp>,
}

impl Commit {
    pub fn genesis(cid: Cid) -> Self {
        Commit {
            commit_type: CommitType::Genesis,
            cid,
            timestamp: None,
        }
    }

    pub fn signed(cid: Cid) -> Self {
        Commit {
            commit_type: CommitType::Signed,
            cid,
            timestamp: None,
        }
    }

    pub fn anchor(cid: Cid, timestamp: UnixTimestamp) -> Self {
        Commit {
            commit_type: CommitType::Anchor,
            cid,
            timestamp: Some(timestamp),
        }
    }

    #[inline]
    pub fn is_anchor(&self) -> bool {
        self.commit_type == CommitType::Anchor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;

    #[test]
    fn test_commit_type_bytes() {
        for t in [CommitType::Genesis, CommitType::Signed, CommitType::Anchor] {
            assert_eq!(CommitType::from_byte(t.to_byte()), Ok(t));
        }
        assert_eq!(
            CommitType::from_byte(7),
            Err(StrandError::UnknownCommitType(7))
        );
    }

    #[test]
    fn test_commit_json_shape() {
        let cid = Cid::hash(codec::DAG_CBOR, b"genesis");
        let json = serde_json::to_value(Commit::genesis(cid)).unwrap();
        assert_eq!(json["type"], "GENESIS");
        assert_eq!(json["cid"], cid.to_string());
        assert!(json.get("timestamp").is_none());

        let anchor = Commit::anchor(cid, UnixTimestamp(42));
        let json = serde_json::to_value(anchor).unwrap();
        assert_eq!(json["timestamp"], 42);
        assert!(anchor.is_anchor());
    }
}
