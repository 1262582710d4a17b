//! Content identifiers
//!
//! Commits are named by CIDv1 with a SHA2-256 multihash. The canonical text
//! form is multibase base32 (prefix `b`), which is also what equality means:
//! two CIDs are equal iff their canonical encodings are equal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::encoding::{base32_decode, base32_encode, read_varint, write_varint};
use crate::{StrandError, StrandResult};

/// CID version supported on the wire
pub const CID_VERSION: u64 = 1;
/// Multihash code for SHA2-256
pub const SHA2_256: u64 = 0x12;
/// SHA2-256 digest length
pub const DIGEST_LEN: usize = 32;
/// Multibase prefix for lower-case base32
pub const MULTIBASE_BASE32: char = 'b';

/// Well-known multicodec codes
pub mod codec {
    pub const RAW: u64 = 0x55;
    pub const DAG_PB: u64 = 0x70;
    pub const DAG_CBOR: u64 = 0x71;
    pub const DAG_JOSE: u64 = 0x85;
}

/// Content identifier: multicodec plus SHA2-256 digest
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid {
    codec: u64,
    digest: [u8; DIGEST_LEN],
}

impl Cid {
    #[inline]
    pub fn new(codec: u64, digest: [u8; DIGEST_LEN]) -> Self {
        Cid { codec, digest }
    }

    /// Derive a CID by hashing `data` with SHA2-256
    pub fn hash(codec: u64, data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Cid::new(codec, hasher.finalize().into())
    }

    #[inline]
    pub fn codec(&self) -> u64 {
        self.codec
    }

    #[inline]
    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.digest
    }

    /// Binary form: version, codec, multihash code, digest length, digest
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + DIGEST_LEN);
        write_varint(&mut out, CID_VERSION);
        write_varint(&mut out, self.codec);
        write_varint(&mut out, SHA2_256);
        write_varint(&mut out, DIGEST_LEN as u64);
        out.extend_from_slice(&self.digest);
        out
    }

    /// Parse the binary form
    pub fn from_bytes(buf: &[u8]) -> StrandResult<Self> {
        let mut offset = 0;
        let mut next = |what: &str| -> StrandResult<u64> {
            let (value, used) = read_varint(&buf[offset..])
                .ok_or_else(|| StrandError::InvalidCid(format!("truncated {}", what)))?;
            offset += used;
            Ok(value)
        };

        let version = next("version")?;
        if version != CID_VERSION {
            return Err(StrandError::UnsupportedCidVersion(version));
        }
        let codec = next("codec")?;
        let hash_code = next("multihash code")?;
        if hash_code != SHA2_256 {
            return Err(StrandError::UnsupportedHash(hash_code));
        }
        let len = next("digest length")? as usize;
        if len != DIGEST_LEN {
            return Err(StrandError::InvalidDigestLength {
                expected: DIGEST_LEN,
                actual: len,
            });
        }

        let rest = &buf[offset..];
        if rest.len() != DIGEST_LEN {
            return Err(StrandError::InvalidDigestLength {
                expected: DIGEST_LEN,
                actual: rest.len(),
            });
        }

        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(rest);
        Ok(Cid::new(codec, digest))
    }

    /// Canonical text form (multibase base32)
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(59);
        out.push(MULTIBASE_BASE32);
        out.push_str(&base32_encode(&self.to_bytes()));
        out
    }
}

impl FromStr for Cid {
    type Err = StrandError;

    fn from_str(s: &str) -> StrandResult<Self> {
        let mut chars = s.chars();
        let prefix = chars
            .next()
            .ok_or_else(|| StrandError::InvalidCid("empty".into()))?;
        if prefix != MULTIBASE_BASE32 {
            return Err(StrandError::UnsupportedMultibase(prefix));
        }
        let bytes = base32_decode(chars.as_str())
            .ok_or_else(|| StrandError::InvalidCid(format!("bad base32: {}", s)))?;
        Cid::from_bytes(&bytes)
    }
}

impl TryFrom<&str> for Cid {
    type Error = StrandError;

    fn try_from(s: &str) -> StrandResult<Self> {
        s.parse()
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({:x}:{})", self.codec, hex::encode(&self.digest[..8]))
    }
}

impl Serialize for Cid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Cid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
