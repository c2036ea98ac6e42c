//! # refscout
//!
//! Lightweight usage search backed by a persistent file dependency graph.
//!
//! Given a cursor position, refscout locates the enclosing symbol
//! definition (class, function, or variable) and finds all genuine usages
//! of that symbol across a codebase — distinguishing real references from
//! definitions, imports, comments, and string-literal mentions. To avoid
//! rescanning whole directory trees on every query, it maintains a
//! persisted file-level import graph per project and narrows the search
//! to the transitive dependants of the file being edited.
//!
//! ## Key pieces
//!
//! - **Heuristic scanner**: a line-oriented state machine classifies
//!   code/comment/import contexts without a parser, language-agnostic
//! - **Dependency graph**: bidirectional, incremental, cached on disk
//! - **Real-time**: a file watcher keeps the graph in sync on saves
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use refscout::{find_subject, GraphCache, ProjectRegistry, Settings};
//! use std::path::{Path, PathBuf};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ProjectRegistry::new(GraphCache::new(
//!     PathBuf::from(".refscout"),
//! )));
//! let settings = Settings::default();
//! let folders = vec![PathBuf::from(".")];
//! registry.ensure_graph("myproject", &folders, &settings);
//!
//! let file = Path::new("src/widget.js");
//! let text = std::fs::read_to_string(file).unwrap();
//! if let Some(subject) = find_subject(&text, 120) {
//!     let usages = registry.find_usages("myproject", &subject.name, file, &folders, &settings);
//!     for usage in usages {
//!         println!("{}", usage.display_label(&folders));
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod project;
pub mod resolve;
pub mod scanner;
pub mod search;
pub mod watcher;

// Re-exports for convenience
pub use error::{Error, Result};

pub use config::Settings;
pub use graph::{build_graph, BuildProgress, DepGraph, GraphCache, GraphRecord};
pub use project::{BuildHandle, BuildSummary, ProjectGraph, ProjectRegistry};
pub use resolve::PathResolver;
pub use scanner::{
    classify_lines, find_imports, find_strings, find_subject, is_genuine_usage, ClassifiedLine,
    Subject, SubjectKind,
};
pub use search::{
    search_in_background, usages_in_file, usages_in_files, usages_in_folders, SearchJob, Usage,
};
pub use watcher::{start_watching, FileWatcher};
