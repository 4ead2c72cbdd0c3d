// src/dag/mod.rs

//! Target identity, registry and ordering.
//!
//! - [`key`] parses and prints `library.object.type.source` keys.
//! - [`location`] derives where a target's source lives.
//! - [`graph`] owns every node and its concurrent-safe adjacency sets.
//! - [`topo`] orders the detected graph and reports cycles.

pub mod graph;
pub mod key;
pub mod location;
pub mod topo;

pub use graph::{EdgeInsert, TargetId, TargetNode, TargetRegistry};
pub use key::TargetKey;
pub use location::SourceLocation;
pub use topo::{build_order, topological_order};
