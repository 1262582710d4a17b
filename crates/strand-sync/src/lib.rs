//! Strand Sync - Sync-mode policy and the stream repository
//!
//! This crate turns load/update/create options into actions:
//! - Configuration defaults (SyncConfig)
//! - Load planning (which sync mode, how long to wait, which point in time)
//! - State store (cache and pin store)
//! - Network and anchor collaborator traits
//! - Repository: one subject per running stream, fed per the plan

pub mod config;
pub mod plan;
pub mod store;
pub mod network;
pub mod repository;

pub use config::*;
pub use plan::*;
pub use store::*;
pub use network::*;
pub use repository::*;
