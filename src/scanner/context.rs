//! Line classification state machine.
//!
//! Streams a file line by line, tracking the current scan context (code,
//! comment, import) on a stack, and yields only the lines whose context
//! matches a requested bitmask. This is a deliberately approximate,
//! language-agnostic scanner — no AST, just line-shape heuristics shared
//! across C-style and Python-style syntaxes.

use once_cell::sync::Lazy;
use regex::Regex;

/// Bitmask of scan contexts. Combine with `|` to request several.
pub type ContextMask = u16;

pub const CODE: ContextMask = 0b0_0000_0001;
pub const SINGLE_IMPORT: ContextMask = 0b0_0000_0010;
pub const MULTI_IMPORT_START: ContextMask = 0b0_0000_0100;
pub const MULTI_IMPORT: ContextMask = 0b0_0000_1000;
pub const MULTI_IMPORT_END: ContextMask = 0b0_0001_0000;
pub const SINGLE_COMMENT: ContextMask = 0b0_0010_0000;
pub const MULTI_COMMENT_START: ContextMask = 0b0_0100_0000;
pub const MULTI_COMMENT: ContextMask = 0b0_1000_0000;
pub const MULTI_COMMENT_END: ContextMask = 0b1_0000_0000;

/// Any import-flavored context.
pub const IMPORT: ContextMask =
    SINGLE_IMPORT | MULTI_IMPORT_START | MULTI_IMPORT | MULTI_IMPORT_END;
/// Any comment-flavored context.
pub const COMMENT: ContextMask =
    SINGLE_COMMENT | MULTI_COMMENT_START | MULTI_COMMENT | MULTI_COMMENT_END;
pub const ANY: ContextMask = CODE | IMPORT | COMMENT;

const SINGLE_LINE_COMMENT: [&str; 2] = ["#", "//"];
const MULTI_LINE_COMMENT_START: &str = "/*";
const MULTI_LINE_COMMENT_END: &str = "*/";

/// `import x from "path"`, `require("path")`, `include "path"` — an
/// import keyword (not immediately followed by `[`, `:` or `.`) with a
/// quoted path somewhere on the same line.
static SINGLE_LINE_IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(import|require|include)[^\[:.].*['"][^'"]+['"].*$"#).unwrap()
});

/// An import keyword followed only by whitespace/brackets to end of line
/// opens a multi-line import block.
static MULTI_LINE_IMPORT_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(import|require|include)\b[\s()\[\]{}]*$").unwrap());

/// A line starting with a closing bracket, optionally followed by
/// `from ...`, closes a multi-line import block.
static MULTI_LINE_IMPORT_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[)}\]](\s*from.+)?$").unwrap());

/// One line emitted by the classifier.
///
/// `offset` is the byte offset of the line's start within the original
/// text and `text` is the original line without its terminator, so match
/// offsets computed on `text` translate directly into file regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedLine<'a> {
    pub offset: usize,
    /// 1-based line number.
    pub line_nr: u32,
    pub text: &'a str,
}

/// Classify `text` line by line, yielding lines whose context matches
/// `mask`. Single pass, lazy, not restartable.
pub fn classify_lines(text: &str, mask: ContextMask) -> ClassifiedLines<'_> {
    ClassifiedLines {
        lines: text.split_inclusive('\n'),
        mask,
        stack: vec![CODE],
        offset: 0,
        line_nr: 0,
    }
}

/// Iterator returned by [`classify_lines`].
pub struct ClassifiedLines<'a> {
    lines: std::str::SplitInclusive<'a, char>,
    mask: ContextMask,
    stack: Vec<ContextMask>,
    offset: usize,
    line_nr: u32,
}

impl<'a> Iterator for ClassifiedLines<'a> {
    type Item = ClassifiedLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for raw in self.lines.by_ref() {
            let offset = self.offset;
            self.offset += raw.len();
            self.line_nr += 1;
            let line_nr = self.line_nr;

            let text = raw.trim_end_matches(['\n', '\r']);
            let trimmed = text.trim_matches([' ', '\t', ';']);
            let top = *self.stack.last().expect("context stack never empty");
            let in_multi_comment = top & MULTI_COMMENT != 0;
            let in_multi_import = top & MULTI_IMPORT != 0;

            // Each branch resolves exactly one line; the first matching
            // branch wins. Single-line contexts are transient and never
            // pushed onto the stack.
            let emitted: ContextMask = if !in_multi_comment
                && SINGLE_LINE_COMMENT.iter().any(|c| trimmed.starts_with(c))
            {
                COMMENT
            } else if in_multi_comment && trimmed.starts_with(MULTI_LINE_COMMENT_END) {
                // Assumes nothing meaningful follows `*/` on the line.
                self.stack.pop();
                MULTI_COMMENT_END
            } else if !in_multi_comment && trimmed.starts_with(MULTI_LINE_COMMENT_START) {
                self.stack.push(MULTI_COMMENT);
                MULTI_COMMENT_START
            } else if !in_multi_import && SINGLE_LINE_IMPORT_RE.is_match(trimmed) {
                SINGLE_IMPORT
            } else if in_multi_import && MULTI_LINE_IMPORT_END_RE.is_match(trimmed) {
                self.stack.pop();
                MULTI_IMPORT_END
            } else if !in_multi_import && MULTI_LINE_IMPORT_START_RE.is_match(trimmed) {
                self.stack.push(MULTI_IMPORT);
                MULTI_IMPORT_START
            } else {
                top
            };

            if self.mask & emitted != 0 {
                return Some(ClassifiedLine {
                    offset,
                    line_nr,
                    text,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contexts(text: &str, mask: ContextMask) -> Vec<u32> {
        classify_lines(text, mask).map(|l| l.line_nr).collect()
    }

    #[test]
    fn multi_line_comment_block_is_comment_context() {
        let text = "let a = 1;\n/* first\nsecond\n*/\nlet b = 2;\n";
        // Lines 2-4 are comment context, not code.
        assert_eq!(contexts(text, CODE), vec![1, 5]);
        assert_eq!(contexts(text, COMMENT), vec![2, 3, 4]);
    }

    #[test]
    fn single_line_comments_are_transient() {
        let text = "# python comment\n// c comment\ncode();\n";
        assert_eq!(contexts(text, COMMENT), vec![1, 2]);
        assert_eq!(contexts(text, CODE), vec![3]);
    }

    #[test]
    fn single_line_import_detected() {
        let text = "import foo from \"./foo\";\nfoo();\n";
        assert_eq!(contexts(text, SINGLE_IMPORT), vec![1]);
        assert_eq!(contexts(text, CODE), vec![2]);
    }

    #[test]
    fn member_access_on_import_keyword_is_not_an_import() {
        // `import.meta.url` has the keyword but the following `.` fails
        // the [^\[:.] class, so it stays code context.
        let text = "System.import(\"mod\")\nimport.meta.url\n";
        assert_eq!(contexts(text, SINGLE_IMPORT), vec![1]);
        assert_eq!(contexts(text, CODE), vec![2]);
    }

    #[test]
    fn multi_line_import_block() {
        let text = "import {\n  alpha,\n  beta,\n} from \"./mod\";\ncode();\n";
        assert_eq!(contexts(text, MULTI_IMPORT_START), vec![1]);
        assert_eq!(contexts(text, MULTI_IMPORT), vec![2, 3]);
        assert_eq!(contexts(text, MULTI_IMPORT_END), vec![4]);
        assert_eq!(contexts(text, CODE), vec![5]);
    }

    #[test]
    fn offsets_track_untrimmed_line_lengths() {
        let text = "aaa\n  bbbb\ncc\n";
        let lines: Vec<_> = classify_lines(text, ANY).collect();
        assert_eq!(lines[0].offset, 0);
        assert_eq!(lines[1].offset, 4);
        assert_eq!(lines[2].offset, 11);
        assert_eq!(lines[1].text, "  bbbb");
    }

    #[test]
    fn offsets_advance_for_filtered_lines_too() {
        let text = "// comment\ncode();\n";
        let lines: Vec<_> = classify_lines(text, CODE).collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].offset, 11);
        assert_eq!(lines[0].line_nr, 2);
    }

    #[test]
    fn crlf_terminators_are_stripped_from_text() {
        let text = "one\r\ntwo\r\n";
        let lines: Vec<_> = classify_lines(text, ANY).collect();
        assert_eq!(lines[0].text, "one");
        assert_eq!(lines[1].offset, 5);
    }
}
