//! Usage search across files and folder trees.
//!
//! Restricts scanning to code-context lines, then applies the genuine-
//! usage predicate to every candidate occurrence. Per-file failures are
//! contained: an undecodable file is logged and skipped, never fatal to
//! the overall search.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use tracing::warn;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::graph::collect_files;
use crate::scanner::{classify_lines, context, is_genuine_usage};

/// One genuine usage of a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usage {
    pub path: PathBuf,
    /// 1-based line number.
    pub line_nr: u32,
    /// Byte span of the match within the file.
    pub region: (usize, usize),
}

impl Usage {
    /// Presentation label: the path with any project folder prefix
    /// stripped, plus the line number.
    pub fn display_label(&self, project_folders: &[PathBuf]) -> String {
        let mut shown = self.path.as_path();
        for folder in project_folders {
            if let Ok(stripped) = self.path.strip_prefix(folder) {
                shown = stripped;
                break;
            }
        }
        format!("{}:{}", shown.display(), self.line_nr)
    }
}

/// Find all genuine usages of `subject` in one file.
pub fn usages_in_file(path: &Path, subject: &str) -> Result<Vec<Usage>> {
    let text =
        std::fs::read_to_string(path).map_err(|_| Error::Decode(path.to_path_buf()))?;
    let mut usages = Vec::new();

    for line in classify_lines(&text, context::CODE) {
        if !line.text.contains(subject) {
            continue;
        }
        if !is_genuine_usage(line.text, subject)? {
            continue;
        }
        let offset = line
            .text
            .find(subject)
            .expect("contains() checked above");
        let start = line.offset + offset;
        usages.push(Usage {
            path: path.to_path_buf(),
            line_nr: line.line_nr,
            region: (start, start + subject.len()),
        });
    }

    Ok(usages)
}

/// Find usages across an explicit file list. Files that cannot be read
/// as text are skipped with a warning.
pub fn usages_in_files<P: AsRef<Path>>(subject: &str, files: &[P]) -> Vec<Usage> {
    let mut usages = Vec::new();
    for file in files {
        match usages_in_file(file.as_ref(), subject) {
            Ok(found) => usages.extend(found),
            Err(e) => warn!(file = %file.as_ref().display(), error = %e, "skipping file"),
        }
    }
    usages
}

/// Find usages by walking folder trees, applying the configured filters.
/// The naive fallback for when no dependency graph is available.
pub fn usages_in_folders(subject: &str, folders: &[PathBuf], settings: &Settings) -> Vec<Usage> {
    let files = collect_files(folders, settings);
    usages_in_files(subject, &files)
}

/// What a background search should scan.
pub enum SearchJob {
    Files(Vec<PathBuf>),
    Folders(Vec<PathBuf>, Settings),
}

/// Run a search on a worker thread; the result arrives on the returned
/// channel. Keeps the interactive thread free while scanning.
pub fn search_in_background(subject: String, job: SearchJob) -> mpsc::Receiver<Vec<Usage>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let usages = match job {
            SearchJob::Files(files) => usages_in_files(&subject, &files),
            SearchJob::Folders(folders, settings) => {
                usages_in_folders(&subject, &folders, &settings)
            }
        };
        // Receiver may have given up waiting; that's fine.
        let _ = tx.send(usages);
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
    }

    #[test]
    fn finds_usages_and_regions() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.js");
        let text = "import Foo from \"./foo\";\nlet x = Foo.bar();\n";
        write(&file, text);

        let usages = usages_in_file(&file, "Foo").unwrap();
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].line_nr, 2);
        let (start, end) = usages[0].region;
        assert_eq!(&text[start..end], "Foo");
    }

    #[test]
    fn definitions_comments_and_strings_do_not_count() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.js");
        write(
            &file,
            concat!(
                "class Foo extends Bar {\n",
                "}\n",
                "// Foo is great\n",
                "/*\n",
                " Foo in a block comment\n",
                "*/\n",
                "log(\"Foo\");\n",
                "run(Foo);\n",
            ),
        );

        let usages = usages_in_file(&file, "Foo").unwrap();
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].line_nr, 8);
    }

    #[test]
    fn folder_walk_skips_dot_entries() {
        let dir = tempfile::tempdir().unwrap();
        let hidden = dir.path().join(".cache");
        fs::create_dir(&hidden).unwrap();
        write(&hidden.join("gen.js"), "use(Foo);\n");
        write(&dir.path().join("app.js"), "use(Foo);\n");

        let usages = usages_in_folders(
            "Foo",
            &[dir.path().to_path_buf()],
            &Settings::default(),
        );
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].path, dir.path().join("app.js"));
    }

    #[test]
    fn unreadable_file_is_skipped_in_file_list() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.js");
        let bad = dir.path().join("bad.js");
        write(&good, "use(Foo);\n");
        fs::write(&bad, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let usages = usages_in_files("Foo", &[bad, good.clone()]);
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].path, good);
    }

    #[test]
    fn background_search_delivers_on_channel() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.js");
        write(&file, "use(Foo);\n");

        let rx = search_in_background("Foo".into(), SearchJob::Files(vec![file]));
        let usages = rx.recv().unwrap();
        assert_eq!(usages.len(), 1);
    }

    #[test]
    fn display_label_strips_project_prefix() {
        let usage = Usage {
            path: PathBuf::from("/proj/src/app.js"),
            line_nr: 3,
            region: (0, 3),
        };
        let label = usage.display_label(&[PathBuf::from("/proj")]);
        assert_eq!(label, "src/app.js:3");
    }
}
