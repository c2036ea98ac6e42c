//! Import path resolution.
//!
//! Turns raw import targets (`./foo`, `@/widgets/button`, `../lib`) into
//! concrete files on disk. Deliberately forgiving: an import that cannot
//! be resolved is logged and dropped — it is most likely a third-party
//! or standard-library import with no file in the project.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::config::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FsKind {
    File,
    Dir,
    Missing,
}

/// Resolves raw import targets against a root chain, with memoized
/// filesystem probes. One instance per scan pass.
pub struct PathResolver<'a> {
    settings: &'a Settings,
    fs_cache: RefCell<HashMap<PathBuf, FsKind>>,
}

impl<'a> PathResolver<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            fs_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Resolve each raw import target against the importing file's
    /// directory and the configured extra roots. Returns every accepted
    /// file; order follows the raw list. Duplicates are left to the
    /// caller's set semantics.
    pub fn resolve(&self, raw_paths: &[String], file_dir: &Path) -> Vec<PathBuf> {
        let mut resolved = Vec::new();

        for raw in raw_paths {
            let expanded = self.expand_alias(raw);
            let mut accepted = false;
            let mut found_excluded = false;

            let roots = std::iter::once(file_dir.to_path_buf())
                .chain(self.settings.roots.iter().cloned());
            for root in roots {
                let candidate = normalize(&root.join(&expanded));
                match self.try_candidate(&candidate, &mut resolved) {
                    Outcome::Accepted => {
                        accepted = true;
                        break;
                    }
                    Outcome::Excluded => found_excluded = true,
                    Outcome::NotFound => {}
                }
            }

            if !accepted {
                if found_excluded {
                    debug!(import = %raw, "import resolved only to filtered-out files");
                } else {
                    warn!(import = %raw, "could not resolve import, assuming external library");
                }
            }
        }

        resolved
    }

    fn try_candidate(&self, candidate: &Path, out: &mut Vec<PathBuf>) -> Outcome {
        match self.fs_kind(candidate) {
            FsKind::File => self.try_file(candidate, out),
            FsKind::Dir => self.try_directory(candidate, out),
            FsKind::Missing => self.try_basename_prefix(candidate, out),
        }
    }

    /// Exact file hit, still subject to both filters.
    fn try_file(&self, candidate: &Path, out: &mut Vec<PathBuf>) -> Outcome {
        let folder_ok = candidate
            .parent()
            .is_none_or(|dir| self.settings.folder_filter(dir));
        if folder_ok && self.file_filter_path(candidate) {
            out.push(candidate.to_path_buf());
            Outcome::Accepted
        } else {
            Outcome::Excluded
        }
    }

    /// Directory import expands to its immediate files.
    fn try_directory(&self, candidate: &Path, out: &mut Vec<PathBuf>) -> Outcome {
        if !self.settings.folder_filter(candidate) {
            return Outcome::Excluded;
        }
        let files = self.files_in_dir(candidate);
        if files.is_empty() {
            return Outcome::NotFound;
        }
        let mut any = false;
        for file in &files {
            if self.file_filter_path(file) {
                out.push(file.clone());
                any = true;
            }
        }
        if any {
            Outcome::Accepted
        } else {
            Outcome::Excluded
        }
    }

    /// Extensionless import: expand to files whose name starts with the
    /// requested basename (`./button` -> `button.js`, `button.test.js`).
    fn try_basename_prefix(&self, candidate: &Path, out: &mut Vec<PathBuf>) -> Outcome {
        let Some(parent) = candidate.parent() else {
            return Outcome::NotFound;
        };
        let Some(prefix) = candidate.file_name().and_then(|n| n.to_str()) else {
            return Outcome::NotFound;
        };
        let matches: Vec<PathBuf> = self
            .files_in_dir(parent)
            .into_iter()
            .filter(|f| {
                f.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(prefix))
            })
            .collect();
        if matches.is_empty() {
            return Outcome::NotFound;
        }
        if !self.settings.folder_filter(parent) {
            return Outcome::Excluded;
        }
        let mut any = false;
        for file in &matches {
            if self.file_filter_path(file) {
                out.push(file.clone());
                any = true;
            }
        }
        if any {
            Outcome::Accepted
        } else {
            Outcome::Excluded
        }
    }

    /// Replace a leading alias segment with its configured target.
    fn expand_alias(&self, raw: &str) -> PathBuf {
        let (head, rest) = match raw.split_once('/') {
            Some((head, rest)) => (head, Some(rest)),
            None => (raw, None),
        };
        if let Some(target) = self.settings.alias.get(head) {
            return match rest {
                Some(rest) => target.join(rest),
                None => target.clone(),
            };
        }
        PathBuf::from(raw)
    }

    fn file_filter_path(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| self.settings.file_filter(n))
    }

    fn fs_kind(&self, path: &Path) -> FsKind {
        if let Some(&kind) = self.fs_cache.borrow().get(path) {
            return kind;
        }
        let kind = match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => FsKind::File,
            Ok(meta) if meta.is_dir() => FsKind::Dir,
            _ => FsKind::Missing,
        };
        self.fs_cache.borrow_mut().insert(path.to_path_buf(), kind);
        kind
    }

    /// Immediate (non-recursive) files of a directory, sorted for
    /// deterministic output.
    fn files_in_dir(&self, dir: &Path) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| self.fs_kind(p) == FsKind::File)
            .collect();
        files.sort();
        files
    }
}

enum Outcome {
    Accepted,
    Excluded,
    NotFound,
}

/// Lexically normalize a path: resolve `.` and `..` without touching the
/// filesystem, so candidates for nonexistent files still normalize.
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(Component::ParentDir);
                }
            }
            other => result.push(other),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::write(path, "x").unwrap();
    }

    fn settings_with_extensions(exts: &[&str]) -> Settings {
        Settings {
            file_extensions: exts.iter().map(|s| s.to_string()).collect(),
            ..Settings::default()
        }
    }

    #[test]
    fn exact_file_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let foo = dir.path().join("foo.js");
        touch(&foo);

        let settings = Settings::default();
        let resolver = PathResolver::new(&settings);
        let resolved = resolver.resolve(&["./foo.js".into()], dir.path());
        assert_eq!(resolved, vec![foo]);
    }

    #[test]
    fn directory_import_expands_to_filtered_files() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("lib");
        fs::create_dir(&lib).unwrap();
        touch(&lib.join("a.js"));
        touch(&lib.join("b.js"));
        touch(&lib.join("notes.txt"));

        let settings = settings_with_extensions(&[".js"]);
        let resolver = PathResolver::new(&settings);
        let resolved = resolver.resolve(&["./lib".into()], dir.path());
        assert_eq!(resolved, vec![lib.join("a.js"), lib.join("b.js")]);
    }

    #[test]
    fn basename_prefix_fallback() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("button.js"));
        touch(&dir.path().join("button.test.js"));
        touch(&dir.path().join("badge.js"));

        let settings = Settings::default();
        let resolver = PathResolver::new(&settings);
        let resolved = resolver.resolve(&["./button".into()], dir.path());
        assert_eq!(
            resolved,
            vec![
                dir.path().join("button.js"),
                dir.path().join("button.test.js")
            ]
        );
    }

    #[test]
    fn unresolvable_import_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let resolver = PathResolver::new(&settings);
        let resolved = resolver.resolve(&["react".into()], dir.path());
        assert!(resolved.is_empty());
    }

    #[test]
    fn alias_expansion_replaces_first_segment() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir(&src).unwrap();
        touch(&src.join("app.js"));

        let mut settings = Settings::default();
        settings.alias.insert("@".into(), src.clone());
        let resolver = PathResolver::new(&settings);

        // Importing from some unrelated directory; the alias supplies
        // the absolute base.
        let resolved = resolver.resolve(&["@/app.js".into()], dir.path());
        assert_eq!(resolved, vec![src.join("app.js")]);
    }

    #[test]
    fn extra_roots_are_tried_after_file_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deep/nested");
        fs::create_dir_all(&nested).unwrap();
        let shared = dir.path().join("shared");
        fs::create_dir(&shared).unwrap();
        touch(&shared.join("util.js"));

        let settings = Settings {
            roots: vec![dir.path().to_path_buf()],
            ..Settings::default()
        };
        let resolver = PathResolver::new(&settings);
        let resolved = resolver.resolve(&["shared/util.js".into()], &nested);
        assert_eq!(resolved, vec![shared.join("util.js")]);
    }

    #[test]
    fn excluded_folder_filters_out_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let vendored = dir.path().join("node_modules");
        fs::create_dir(&vendored).unwrap();
        touch(&vendored.join("react.js"));

        let settings = Settings {
            excluded_folders: vec!["node_modules".into()],
            ..Settings::default()
        };
        let resolver = PathResolver::new(&settings);
        let resolved = resolver.resolve(&["./node_modules/react.js".into()], dir.path());
        assert!(resolved.is_empty());
    }

    #[test]
    fn relative_parent_paths_normalize() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::create_dir(&a).unwrap();
        fs::create_dir(&b).unwrap();
        touch(&b.join("mod.js"));

        let settings = Settings::default();
        let resolver = PathResolver::new(&settings);
        let resolved = resolver.resolve(&["../b/mod.js".into()], &a);
        assert_eq!(resolved, vec![b.join("mod.js")]);
    }
}
