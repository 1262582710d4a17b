//! Load planning
//!
//! Resolves caller options against configured defaults into the concrete
//! steps a load takes. A point in time never short-circuits the sync step:
//! the base state is fetched exactly as the sync mode says, and the
//! historical view is derived from it afterwards.

use std::time::Duration;

use strand_core::{BasicLoadOpts, LoadOpts, SyncMode, UnixTimestamp};

use crate::SyncConfig;

/// Fully resolved load options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadPlan {
    pub sync: SyncMode,
    pub timeout: Duration,
    pub at_time: Option<UnixTimestamp>,
}

impl LoadPlan {
    /// Resolve a load; unset fields fall back to `config`
    pub fn resolve(opts: &LoadOpts, config: &SyncConfig) -> Self {
        Self::build(&opts.basic, opts.at_time, config.load_sync, config)
    }

    /// Resolve the load half of a create
    pub fn resolve_create(opts: &BasicLoadOpts, config: &SyncConfig) -> Self {
        Self::build(opts, None, config.create_sync, config)
    }

    fn build(
        basic: &BasicLoadOpts,
        at_time: Option<UnixTimestamp>,
        default_sync: SyncMode,
        config: &SyncConfig,
    ) -> Self {
        LoadPlan {
            sync: basic.sync.unwrap_or(default_sync),
            timeout: basic.sync_timeout().unwrap_or_else(|| config.sync_timeout()),
            at_time,
        }
    }

    /// Whether the network is asked for the tip, given whether the stream
    /// was found in memory or in the state store
    pub fn queries_network(&self, cached: bool) -> bool {
        match self.sync {
            SyncMode::PreferCache => !cached,
            SyncMode::SyncAlways => true,
            SyncMode::NeverSync => false,
        }
    }

    #[inline]
    pub fn is_historical(&self) -> bool {
        self.at_time.is_some()
    }
}
