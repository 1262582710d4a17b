//! Strand Test Harness - Simulation and validation for stream state sync
//!
//! This crate provides:
//! - Deterministic stream fixtures
//! - A simulated pubsub network and anchor service
//! - Recording observers
//! - Subject fuzzing
//! - Multi-node integration testing

pub mod fixtures;
pub mod integration;
pub mod logging;
pub mod network;
pub mod recorder;
pub mod state_fuzzer;

pub use fixtures::*;
pub use integration::*;
pub use logging::*;
pub use network::*;
pub use recorder::*;
pub use state_fuzzer::*;
