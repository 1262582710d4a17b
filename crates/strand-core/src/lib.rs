//! Strand Core - Fundamental stream types
//!
//! This crate defines the types shared by every Strand crate:
//! - Content identifiers (Cid) and stream identity (StreamId)
//! - Commits and the immutable StreamState snapshot
//! - Unix timestamps for point-in-time loads
//! - Sync modes and load/update/create options
//! - The StrandError taxonomy

mod encoding;

pub mod cid;
pub mod id;
pub mod time;
pub mod commit;
pub mod stream;
pub mod opts;
pub mod error;

pub use cid::*;
pub use id::*;
pub use time::*;
pub use commit::*;
pub use stream::*;
pub use opts::*;
pub use error::*;
