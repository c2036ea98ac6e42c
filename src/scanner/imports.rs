//! Import target extraction.
//!
//! Pulls quoted import paths out of a file using the line classifier.
//! Only imports whose target is an actual quoted path string are
//! supported; bare module imports (`import os`) carry no path to follow
//! and contribute nothing.

use once_cell::sync::Lazy;
use regex::Regex;

use super::context::{self, classify_lines};

static QUOTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).unwrap());

/// Extract raw import targets from `text`, in order of appearance.
///
/// Requests import-context lines from the classifier and takes the last
/// quoted substring per line, which handles the common
/// `import x from "path"` shape where the path is the final string.
pub fn find_imports(text: &str) -> Vec<String> {
    let mask = context::SINGLE_IMPORT | context::MULTI_IMPORT | context::MULTI_IMPORT_END;
    classify_lines(text, mask)
        .filter_map(|line| {
            QUOTED_RE
                .captures_iter(line.text)
                .last()
                .map(|cap| cap[1].to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_line_imports() {
        let text = concat!(
            "import foo from \"./foo\";\n",
            "const bar = require('../lib/bar');\n",
            "code();\n",
        );
        assert_eq!(find_imports(text), vec!["./foo", "../lib/bar"]);
    }

    #[test]
    fn takes_the_last_quoted_string_on_the_line() {
        let text = "import \"side-effect\" from \"./real-path\";\n";
        assert_eq!(find_imports(text), vec!["./real-path"]);
    }

    #[test]
    fn multi_line_import_path_comes_from_the_end_line() {
        let text = concat!(
            "import {\n",
            "  alpha,\n",
            "  beta,\n",
            "} from \"./mod\";\n",
        );
        assert_eq!(find_imports(text), vec!["./mod"]);
    }

    #[test]
    fn lines_without_strings_contribute_nothing() {
        let text = "import {\n  alpha,\n} from \"./mod\";\n";
        // The interior line `alpha,` has no quoted string.
        assert_eq!(find_imports(text), vec!["./mod"]);
    }

    #[test]
    fn commented_imports_are_ignored() {
        let text = "// import foo from \"./foo\";\ncode();\n";
        assert!(find_imports(text).is_empty());
    }
}
