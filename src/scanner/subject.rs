//! Subject location: which symbol is the cursor on?
//!
//! Given a cursor position in a file, determine the enclosing class,
//! function, or variable definition. The exact current line is tried
//! first; failing that, the closest definition above the cursor wins,
//! with kind priority class > function > variable.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Identifier-ish character class shared by all definition patterns.
const NAME: &str = r"[^\s\(\)\[\]\{\}+*/&\|=<>,:;~-]+";

/// The regex category that produced a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    Class,
    Function,
    Variable,
}

/// A symbol name extracted from a definition line. Ephemeral — built per
/// query and discarded after the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub name: String,
    pub kind: SubjectKind,
}

struct DefinitionPattern {
    kind: SubjectKind,
    regex: Regex,
    /// Capture groups that may hold the name; the first non-empty wins.
    groups: &'static [usize],
}

fn build(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .build()
        .expect("definition pattern compiles")
}

static PATTERNS: Lazy<[DefinitionPattern; 3]> = Lazy::new(|| {
    [
        DefinitionPattern {
            kind: SubjectKind::Class,
            regex: build(&format!(r"class ({NAME})")),
            groups: &[1],
        },
        DefinitionPattern {
            kind: SubjectKind::Function,
            regex: build(&format!(r"(function\s+({NAME}).+\{{$)|(def\s({NAME}).+:$)")),
            groups: &[2, 4],
        },
        DefinitionPattern {
            kind: SubjectKind::Variable,
            regex: build(&format!(r"(var|let|const)\s+({NAME})\s*=")),
            groups: &[2],
        },
    ]
});

impl DefinitionPattern {
    /// Extract the name from a match anchored at the start of `line`.
    fn name_at_line_start(&self, line: &str) -> Option<String> {
        let caps = self.regex.captures(line)?;
        if caps.get(0)?.start() != 0 {
            return None;
        }
        self.groups
            .iter()
            .find_map(|&g| caps.get(g))
            .map(|m| m.as_str().to_string())
    }
}

/// Find the subject at (or above) the cursor byte offset in `text`.
///
/// Returns `None` when no definition pattern matches anywhere — nothing
/// to search for.
pub fn find_subject(text: &str, cursor: usize) -> Option<Subject> {
    let mut cursor = cursor.min(text.len());
    // A byte offset inside a multibyte character snaps back to its start.
    while !text.is_char_boundary(cursor) {
        cursor -= 1;
    }
    let line_start = text[..cursor].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = text[cursor..]
        .find('\n')
        .map(|i| cursor + i)
        .unwrap_or(text.len());
    let current_line = &text[line_start..line_end];

    // The exact cursor line first, each kind in priority order.
    for pattern in PATTERNS.iter() {
        if let Some(name) = pattern.name_at_line_start(current_line) {
            return Some(Subject {
                name,
                kind: pattern.kind,
            });
        }
    }

    // Then the closest definition ending above the current line,
    // scanning backward; kind priority beats textual nearness.
    for pattern in PATTERNS.iter() {
        let matches: Vec<_> = pattern.regex.find_iter(text).collect();
        if matches.is_empty() {
            continue;
        }
        let region = matches
            .iter()
            .rev()
            .find(|m| m.end() < line_start)
            .or_else(|| matches.first());
        if let Some(region) = region {
            if let Some(name) = pattern.name_at_line_start(region.as_str()) {
                return Some(Subject {
                    name,
                    kind: pattern.kind,
                });
            }
        }
    }

    None
}
