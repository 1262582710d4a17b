//! Strand State - Change-gated stream state broadcast
//!
//! This crate implements the observable side of a stream:
//! - Equality oracle (when are two states the same)
//! - Distinct-state subject (hold, compare, fan out)
//! - Tip selection between competing histories

pub mod equality;
pub mod subject;
pub mod tip;

pub use equality::*;
pub use subject::*;
pub use tip::*;
