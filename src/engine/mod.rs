// src/engine/mod.rs

//! Incremental build engine.
//!
//! - [`staleness`] decides whether a target needs a rebuild and marks the
//!   dependents of a rebuilt target stale.
//! - [`metadata`] refreshes timestamps from the outside world.
//! - [`stamps`] persists the time of each successful build.
//! - [`driver`] walks the chosen order and hands stale targets to a
//!   [`Compiler`](crate::exec::Compiler).

pub mod driver;
pub mod metadata;
pub mod stamps;
pub mod staleness;

pub use driver::{BuildDriver, BuildOrdering, BuildSummary};
pub use metadata::{LocalMetadata, ObjectMetadata};
pub use stamps::{FileStampStore, MemoryStampStore, StampStore, STAMP_FILE_PATH};
pub use staleness::{StalenessTracker, Timestamps};
