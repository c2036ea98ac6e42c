//! Lightweight source scanning — the heuristic, language-agnostic side
//! of refscout.
//!
//! No parser, no AST: a line classifier state machine, string-literal
//! detection, import extraction, the genuine-usage predicate, and the
//! subject locator. A future per-language precise scanner could replace
//! this module without touching the graph or search logic.

pub mod context;
pub mod imports;
pub mod strings;
pub mod subject;
pub mod usage;

pub use context::{classify_lines, ClassifiedLine, ContextMask};
pub use imports::find_imports;
pub use strings::find_strings;
pub use subject::{find_subject, Subject, SubjectKind};
pub use usage::is_genuine_usage;
