//! Unix time primitives used for point-in-time loads and anchor proofs

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Whole seconds since the unix epoch
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnixTimestamp(pub u64);

impl UnixTimestamp {
    pub const EPOCH: UnixTimestamp = UnixTimestamp(0);

    #[inline]
    pub fn from_secs(secs: u64) -> Self {
        UnixTimestamp(secs)
    }

    #[inline]
    pub fn as_secs(self) -> u64 {
        self.0
    }

    /// Current wall-clock time, clamped to the epoch
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        UnixTimestamp(secs)
    }

    #[inline]
    pub fn saturating_add(self, d: Duration) -> Self {
        UnixTimestamp(self.0.saturating_add(d.as_secs()))
    }
}

impl From<u64> for UnixTimestamp {
    fn from(secs: u64) -> Self {
        UnixTimestamp(secs)
    }
}

impl fmt::Debug for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.0)
    }
}

impl fmt::Display for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
