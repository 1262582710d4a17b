//! Error types for Strand

use thiserror::Error;

use crate::{Cid, CommitType, StreamId};

/// Core Strand errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrandError {
    // CID errors
    #[error("Invalid CID: {0}")]
    InvalidCid(String),

    #[error("Unsupported multibase prefix: {0:?}")]
    UnsupportedMultibase(char),

    #[error("Unsupported CID version: {0}")]
    UnsupportedCidVersion(u64),

    #[error("Unsupported multihash code: 0x{0:x}")]
    UnsupportedHash(u64),

    #[error("Invalid digest length: expected {expected}, got {actual}")]
    InvalidDigestLength { expected: usize, actual: usize },

    // Code errors
    #[error("Unknown commit type: {0}")]
    UnknownCommitType(u8),

    #[error("Unknown stream type: {0}")]
    UnknownStreamType(u16),

    #[error("Unknown sync mode: {0}")]
    UnknownSyncMode(u8),

    // Log errors
    #[error("Commit log is empty")]
    EmptyLog,

    #[error("First commit must be genesis, found {0:?}")]
    MissingGenesis(CommitType),

    #[error("Genesis commit at position {0}")]
    MisplacedGenesis(usize),

    #[error("Duplicate commit {0}")]
    DuplicateCid(Cid),

    #[error("Genesis mismatch: expected {expected}, got {actual}")]
    GenesisMismatch { expected: StreamId, actual: StreamId },

    #[error("Stream {0} has commits beyond genesis")]
    NotGenesisOnly(StreamId),

    // Comparison errors
    #[error("State comparison failed: {0}")]
    Comparison(String),

    // Repository errors
    #[error("Stream not found: {0}")]
    StreamNotFound(StreamId),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Anchor request failed: {0}")]
    Anchor(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for Strand operations
pub type StrandResult<T> = Result<T, StrandError>;
