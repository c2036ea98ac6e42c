//! The "genuine usage" predicate.
//!
//! Decides whether a literal occurrence of a subject on a code line is a
//! real reference, as opposed to the symbol's own definition, an import
//! naming it, or a mention inside a string literal.

use crate::error::Result;
use crate::scanner::strings::find_strings;

/// Characters that may legally border an identifier reference. Anything
/// else touching the subject means we matched a fragment of a longer
/// identifier. `.` is included so member access (`Foo.bar()`) counts as
/// a usage of `Foo`.
const WORD_BREAK: &str = "()[]{},+*/%!;:'\"=<>-.";

/// Keywords that, when found right before the subject, mark a definition
/// or import rather than a usage.
const IGNORED_PREFIX: [&str; 9] = [
    "import", "include", "require", "function", "const", "var", "let", "def", "class",
];

/// Import keywords anywhere earlier on the line disqualify the match.
const IGNORED_BEFORE: [&str; 3] = ["import", "include", "require"];

/// Characters stripped when inspecting the text around the subject.
const SURROUNDING_TRIM: [char; 8] = [' ', '\t', '(', '[', '{', '}', ']', ')'];

fn is_word_break(c: char) -> bool {
    c.is_whitespace() || WORD_BREAK.contains(c)
}

/// Check whether the first occurrence of `subject` in `line` is a
/// genuine usage. Returns `Ok(false)` if the subject does not occur.
pub fn is_genuine_usage(line: &str, subject: &str) -> Result<bool> {
    let Some(pos) = line.find(subject) else {
        return Ok(false);
    };
    let before = &line[..pos];
    let after = &line[pos + subject.len()..];

    if !before.is_empty() {
        // A non-break character touching the subject means we matched
        // inside a longer identifier.
        if before.chars().next_back().is_some_and(|c| !is_word_break(c)) {
            return Ok(false);
        }
        let trimmed = before.trim_end_matches(SURROUNDING_TRIM);
        if IGNORED_PREFIX.iter().any(|kw| trimmed.ends_with(kw)) {
            return Ok(false);
        }
        if IGNORED_BEFORE.iter().any(|kw| before.contains(kw)) {
            return Ok(false);
        }
    }

    if !after.is_empty() {
        if after.chars().next().is_some_and(|c| !is_word_break(c)) {
            return Ok(false);
        }
        // `name: Type` and `name = value` are the subject's own
        // declaration, not a usage of it.
        let trimmed = after.trim_start_matches(SURROUNDING_TRIM);
        if trimmed.starts_with(':') || trimmed.starts_with('=') {
            return Ok(false);
        }
    }

    // Occurrences strictly inside a string literal don't count.
    for (start, end) in find_strings(line)? {
        if start < pos && end > pos {
            return Ok(false);
        }
    }

    Ok(true)
}
