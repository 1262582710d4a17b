//! Repository configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strand_core::{StrandError, StrandResult, SyncMode};

/// Defaults applied when an option set leaves a field unset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Sync mode for `load` when the caller gives none
    pub load_sync: SyncMode,
    /// Sync mode for `create` when the caller gives none
    pub create_sync: SyncMode,
    /// Pubsub wait when the caller gives no timeout
    pub sync_timeout_seconds: u64,
    /// Request an anchor after update/create unless told otherwise
    pub anchor: bool,
    /// Publish the new tip after update/create unless told otherwise
    pub publish: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            load_sync: SyncMode::PreferCache,
            create_sync: SyncMode::PreferCache,
            sync_timeout_seconds: 3,
            anchor: true,
            publish: true,
        }
    }
}

impl SyncConfig {
    /// Never touch the network: for offline nodes and tests
    pub fn offline() -> Self {
        SyncConfig {
            load_sync: SyncMode::NeverSync,
            create_sync: SyncMode::NeverSync,
            sync_timeout_seconds: 0,
            anchor: false,
            publish: false,
        }
    }

    /// Always refresh from the network, with a longer wait
    pub fn strict() -> Self {
        SyncConfig {
            load_sync: SyncMode::SyncAlways,
            create_sync: SyncMode::SyncAlways,
            sync_timeout_seconds: 10,
            ..SyncConfig::default()
        }
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(text: &str) -> StrandResult<Self> {
        serde_json::from_str(text).map_err(|e| StrandError::Config(e.to_string()))
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_seconds)
    }
}
