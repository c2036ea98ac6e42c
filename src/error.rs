//! Error types for refscout.

use std::path::PathBuf;
use thiserror::Error;

/// All errors the library can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// Cache file could not be written.
    #[error("cache error: {0}")]
    Cache(String),

    /// File contents are not valid UTF-8 text.
    #[error("cannot decode file as text: {0}")]
    Decode(PathBuf),

    /// A defensive iteration cap was hit. Indicates a scanner bug,
    /// not a problem with the input — worth a bug report.
    #[error("iteration limit exceeded in {0}")]
    IterationLimit(&'static str),

    /// No class/function/variable definition found at the cursor.
    #[error("no subject found at cursor position")]
    NoSubject,

    /// The file watcher could not be started.
    #[error("file watcher error: {0}")]
    Watch(String),
}

/// Convenient result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
