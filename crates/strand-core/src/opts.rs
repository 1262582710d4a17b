//! Load, update and create options
//!
//! Plain configuration records consumed by whatever loads or mutates a
//! stream. All fields are optional; the consumer fills in its own defaults.
//! Field names on the wire: `sync`, `syncTimeoutSeconds`, `atTime`,
//! `anchor`, `publish`.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{StrandError, StrandResult, UnixTimestamp};

/// How a loader refreshes a stream against the network
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum SyncMode {
    /// Return the cached or pinned state if present, without asking the
    /// network for a fresher tip.
    #[default]
    PreferCache = 0,
    /// Always ask the network for the current tip and wait up to the sync
    /// timeout, whether or not the stream is cached.
    SyncAlways = 1,
    /// Never ask the network. Uncached streams load as genesis only.
    NeverSync = 2,
}

impl SyncMode {
    pub fn from_code(code: u8) -> StrandResult<Self> {
        match code {
            0 => Ok(SyncMode::PreferCache),
            1 => Ok(SyncMode::SyncAlways),
            2 => Ok(SyncMode::NeverSync),
            other => Err(StrandError::UnknownSyncMode(other)),
        }
    }

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            SyncMode::PreferCache => "PREFER_CACHE",
            SyncMode::SyncAlways => "SYNC_ALWAYS",
            SyncMode::NeverSync => "NEVER_SYNC",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options shared by every operation that may load a stream
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicLoadOpts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncMode>,
    /// How long to wait for a pubsub answer when syncing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_timeout_seconds: Option<u64>,
}

impl BasicLoadOpts {
    pub fn with_sync(mut self, sync: SyncMode) -> Self {
        self.sync = Some(sync);
        self
    }

    pub fn with_sync_timeout_seconds(mut self, secs: u64) -> Self {
        self.sync_timeout_seconds = Some(secs);
        self
    }

    pub fn sync_timeout(&self) -> Option<Duration> {
        self.sync_timeout_seconds.map(Duration::from_secs)
    }
}

/// Options for loading a stream, optionally at a past point in time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadOpts {
    #[serde(flatten)]
    pub basic: BasicLoadOpts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_time: Option<UnixTimestamp>,
}

impl LoadOpts {
    pub fn with_sync(mut self, sync: SyncMode) -> Self {
        self.basic = self.basic.with_sync(sync);
        self
    }

    pub fn with_sync_timeout_seconds(mut self, secs: u64) -> Self {
        self.basic = self.basic.with_sync_timeout_seconds(secs);
        self
    }

    pub fn at_time(mut self, at: UnixTimestamp) -> Self {
        self.at_time = Some(at);
        self
    }

    #[inline]
    pub fn sync(&self) -> Option<SyncMode> {
        self.basic.sync
    }
}

impl From<BasicLoadOpts> for LoadOpts {
    fn from(basic: BasicLoadOpts) -> Self {
        LoadOpts {
            basic,
            at_time: None,
        }
    }
}

/// Options for operations that append to a stream
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateOpts {
    /// Request an anchor after the operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<bool>,
    /// Publish the new tip to pubsub after the operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<bool>,
}

impl UpdateOpts {
    pub fn with_anchor(mut self, anchor: bool) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_publish(mut self, publish: bool) -> Self {
        self.publish = Some(publish);
        self
    }
}

/// Options for creating a stream: update options plus basic load options
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateOpts {
    #[serde(flatten)]
    pub update: UpdateOpts,
    #[serde(flatten)]
    pub load: BasicLoadOpts,
}

impl CreateOpts {
    pub fn with_sync(mut self, sync: SyncMode) -> Self {
        self.load = self.load.with_sync(sync);
        self
    }

    pub fn with_sync_timeout_seconds(mut self, secs: u64) -> Self {
        self.load = self.load.with_sync_timeout_seconds(secs);
        self
    }

    pub fn with_anchor(mut self, anchor: bool) -> Self {
        self.update = self.update.with_anchor(anchor);
        self
    }

    pub fn with_publish(mut self, publish: bool) -> Self {
        self.update = self.update.with_publish(publish);
        self
    }

    /// The load half, with no point in time
    pub fn load_opts(&self) -> LoadOpts {
        LoadOpts::from(self.load)
    }

    pub fn update_opts(&self) -> UpdateOpts {
        self.update
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_mode_codes() {
        for mode in [SyncMode::PreferCache, SyncMode::SyncAlways, SyncMode::NeverSync] {
            assert_eq!(SyncMode::from_code(mode.code()), Ok(mode));
        }
        assert_eq!(SyncMode::from_code(3), Err(StrandError::UnknownSyncMode(3)));
        assert_eq!(SyncMode::default(), SyncMode::PreferCache);
    }

    #[test]
    fn test_load_opts_wire_names() {
        let opts = LoadOpts::default()
            .with_sync(SyncMode::SyncAlways)
            .with_sync_timeout_seconds(5)
            .at_time(UnixTimestamp(1_600_000_000));
        let json = serde_json::to_value(opts).unwrap();
        assert_eq!(json["sync"], "SYNC_ALWAYS");
        assert_eq!(json["syncTimeoutSeconds"], 5);
        assert_eq!(json["atTime"], 1_600_000_000u64);

        let back: LoadOpts = serde_json::from_value(json).unwrap();
        assert_eq!(back, opts);
        assert_eq!(back.basic.sync_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_empty_opts_parse() {
        let opts: LoadOpts = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, LoadOpts::default());
        let opts: CreateOpts = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, CreateOpts::default());
        assert_eq!(serde_json::to_string(&UpdateOpts::default()).unwrap(), "{}");
    }

    #[test]
    fn test_create_opts_projection() {
        let json = r#"{"anchor":false,"publish":true,"sync":"NEVER_SYNC","syncTimeoutSeconds":1}"#;
        let opts: CreateOpts = serde_json::from_str(json).unwrap();
        assert_eq!(opts.update_opts(), UpdateOpts::default().with_anchor(false).with_publish(true));
        let load = opts.load_opts();
        assert_eq!(load.sync(), Some(SyncMode::NeverSync));
        assert_eq!(load.basic.sync_timeout_seconds, Some(1));
        assert_eq!(load.at_time, None);
    }

    #[test]
    fn test_unknown_sync_mode_rejected() {
        assert!(serde_json::from_str::<LoadOpts>(r#"{"sync":"SOMETIMES"}"#).is_err());
    }
}
