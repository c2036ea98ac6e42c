//! String-literal detection within a single line.
//!
//! Used to reject symbol matches that only occur inside quoted strings.
//! Operates on bytes; all delimiters are ASCII so offsets stay valid for
//! arbitrary UTF-8 lines.

use crate::error::{Error, Result};

const STRING_DELIMITERS: [u8; 3] = [b'"', b'\'', b'`'];

/// Hard cap on scan iterations per delimiter kind. Never expected to
/// trigger on real input; hitting it means a scanner bug.
const MAX_ITERATIONS: usize = 200;

/// Find string literals in a line.
///
/// Returns `(start, end)` byte offsets per literal, where `start` is the
/// opening delimiter and `end` the closing one (or the line length for an
/// unterminated literal). A delimiter preceded by an odd number of
/// backslashes is escaped and does not open or close a literal. Ranges for
/// all three delimiter kinds (`"`, `'`, `` ` ``) are merged and sorted by
/// start offset.
pub fn find_strings(line: &str) -> Result<Vec<(usize, usize)>> {
    let bytes = line.as_bytes();
    let mut ranges = Vec::new();

    for &delim in &STRING_DELIMITERS {
        let mut search_from = 0usize;
        let mut outer_iterations = 0usize;

        loop {
            outer_iterations += 1;
            if outer_iterations > MAX_ITERATIONS {
                return Err(Error::IterationLimit("find_strings"));
            }

            let Some(first) = find_byte(bytes, delim, search_from) else {
                break;
            };
            search_from = first + 1;
            if count_backslashes(bytes, first) % 2 != 0 {
                continue; // escaped opener, keep looking
            }

            // Scan forward for the matching unescaped closer.
            let mut close = None;
            let mut next = first;
            let mut inner_iterations = 0usize;
            loop {
                inner_iterations += 1;
                if inner_iterations > MAX_ITERATIONS {
                    return Err(Error::IterationLimit("find_strings"));
                }
                match find_byte(bytes, delim, next + 1) {
                    Some(pos) => {
                        next = pos;
                        if count_backslashes(bytes, pos) % 2 == 0 {
                            close = Some(pos);
                            break;
                        }
                    }
                    None => break,
                }
            }

            match close {
                Some(close) => {
                    ranges.push((first, close));
                    search_from = close + 1;
                }
                None => {
                    // Unterminated literal runs to end of line.
                    ranges.push((first, bytes.len()));
                    break;
                }
            }
        }
    }

    ranges.sort_unstable();
    Ok(ranges)
}

fn find_byte(bytes: &[u8], needle: u8, from: usize) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|&b| b == needle)
        .map(|i| from + i)
}

/// Count consecutive backslashes immediately preceding `pos`.
fn count_backslashes(bytes: &[u8], pos: usize) -> usize {
    bytes[..pos].iter().rev().take_while(|&&b| b == b'\\').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_double_and_backtick_strings() {
        let ranges = find_strings(r#""foo" + `bar` + 123"#).unwrap();
        assert_eq!(ranges, vec![(0, 4), (8, 12)]);
    }

    #[test]
    fn escaped_quote_is_not_a_delimiter() {
        let ranges = find_strings(r#"boo\"foo"bar"#).unwrap();
        // The backslash-escaped quote at 4 does not open; the real string
        // opens at the quote following `foo`... which is unterminated.
        assert_eq!(ranges, vec![(8, 12)]);
    }

    #[test]
    fn double_backslash_does_not_escape() {
        let ranges = find_strings(r#"x = "a\\" + y"#).unwrap();
        assert_eq!(ranges, vec![(4, 8)]);
    }

    #[test]
    fn unterminated_string_runs_to_end_of_line() {
        let ranges = find_strings(r#"say("hello"#).unwrap();
        assert_eq!(ranges, vec![(4, 10)]);
    }

    #[test]
    fn multiple_strings_same_delimiter() {
        let ranges = find_strings(r#"a("x", "y")"#).unwrap();
        assert_eq!(ranges, vec![(2, 4), (7, 9)]);
    }

    #[test]
    fn no_strings() {
        assert!(find_strings("let x = 1 + 2;").unwrap().is_empty());
    }
}
