//! Stream identity
//!
//! A stream is named by its kind and the CID of its genesis commit, so the
//! genesis-only state of any stream can be rebuilt from its id alone.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Cid, StrandError, StrandResult};

/// Stream kind
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u16)]
pub enum StreamType {
    #[default]
    Tile = 0,
    Caip10Link = 1,
    Model = 2,
    ModelInstanceDocument = 3,
    Unloadable = 4,
}

impl StreamType {
    pub fn from_code(code: u16) -> StrandResult<Self> {
        match code {
            0 => Ok(StreamType::Tile),
            1 => Ok(StreamType::Caip10Link),
            2 => Ok(StreamType::Model),
            3 => Ok(StreamType::ModelInstanceDocument),
            4 => Ok(StreamType::Unloadable),
            other => Err(StrandError::UnknownStreamType(other)),
        }
    }

    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            StreamType::Tile => "tile",
            StreamType::Caip10Link => "caip10-link",
            StreamType::Model => "model",
            StreamType::ModelInstanceDocument => "MID",
            StreamType::Unloadable => "unloadable",
        }
    }
}

/// Stream identity: kind plus genesis CID
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamId {
    pub stream_type: StreamType,
    pub genesis: Cid,
}

impl StreamId {
    #[inline]
    pub fn new(stream_type: StreamType, genesis: Cid) -> Self {
        StreamId {
            stream_type,
            genesis,
        }
    }
}

impl fmt::Debug for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stream({}:{:?})", self.stream_type.name(), self.genesis)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.stream_type.name(), self.genesis)
    }
}
