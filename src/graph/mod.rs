//! Dependency graph module — the persistent backbone of refscout.
//!
//! Provides the bidirectional file graph, the folder-walking builder,
//! and the per-project disk cache.

pub mod builder;
pub mod cache;
pub mod engine;

pub use builder::{build_graph, collect_files, file_dependencies, BuildProgress};
pub use cache::{GraphCache, GraphRecord, STALE_AFTER_SECS};
pub use engine::{DepGraph, GraphSnapshot};
