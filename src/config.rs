//! Settings for scanning, resolution, and the dependency graph.
//!
//! Settings come from a TOML file with global keys plus optional
//! per-project overrides:
//!
//! ```toml
//! file_extensions = [".js", ".jsx"]
//! excluded_folders = ["node_modules", "dist"]
//!
//! [alias]
//! "@" = "/home/me/app/src"
//!
//! [projects.backend]
//! file_extensions = [".py"]
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Effective settings for one project (or the global defaults).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Skip the dependency graph and scan all project files per query.
    pub disable_dep_graph: bool,
    /// File name suffixes to include. Empty means no filtering.
    pub file_extensions: Vec<String>,
    /// Path fragments excluding a folder (and everything below it).
    pub excluded_folders: Vec<String>,
    /// Import path-prefix aliases, e.g. `"@" -> /abs/path/src`.
    pub alias: HashMap<String, PathBuf>,
    /// Extra base directories for resolving imports, tried after the
    /// importing file's own directory.
    pub roots: Vec<PathBuf>,
    /// Log at debug level even without RUST_LOG set.
    pub verbose_logging: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            disable_dep_graph: false,
            file_extensions: Vec::new(),
            excluded_folders: Vec::new(),
            alias: HashMap::new(),
            roots: Vec::new(),
            verbose_logging: false,
        }
    }
}

/// Per-project override block. Every field is optional; missing fields
/// fall through to the global settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsPatch {
    disable_dep_graph: Option<bool>,
    file_extensions: Option<Vec<String>>,
    excluded_folders: Option<Vec<String>>,
    alias: Option<HashMap<String, PathBuf>>,
    roots: Option<Vec<PathBuf>>,
    verbose_logging: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    #[serde(flatten)]
    global: Settings,
    projects: HashMap<String, SettingsPatch>,
}

impl Settings {
    /// Load the effective settings for `project` from a TOML file.
    /// A missing file yields the defaults; a malformed file is a hard
    /// configuration error.
    pub fn load(path: &Path, project: Option<&str>) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let file: SettingsFile = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

        let mut settings = file.global;
        if let Some(patch) = project.and_then(|name| file.projects.get(name)) {
            settings.apply(patch);
        }
        Ok(settings)
    }

    fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.disable_dep_graph {
            self.disable_dep_graph = v;
        }
        if let Some(v) = &patch.file_extensions {
            self.file_extensions = v.clone();
        }
        if let Some(v) = &patch.excluded_folders {
            self.excluded_folders = v.clone();
        }
        if let Some(v) = &patch.alias {
            self.alias = v.clone();
        }
        if let Some(v) = &patch.roots {
            self.roots = v.clone();
        }
        if let Some(v) = patch.verbose_logging {
            self.verbose_logging = v;
        }
    }

    /// True if the file name passes the extension filter.
    /// An empty extension list accepts everything.
    pub fn file_filter(&self, file_name: &str) -> bool {
        if self.file_extensions.is_empty() {
            return true;
        }
        self.file_extensions
            .iter()
            .any(|ext| file_name.ends_with(ext.as_str()))
    }

    /// True if the folder path passes the exclusion filter.
    pub fn folder_filter(&self, folder: &Path) -> bool {
        let folder = folder.to_string_lossy();
        !self
            .excluded_folders
            .iter()
            .any(|fragment| folder.contains(fragment.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let settings = Settings::load(Path::new("/nonexistent/refscout.toml"), None).unwrap();
        assert!(!settings.disable_dep_graph);
        assert!(settings.file_extensions.is_empty());
    }

    #[test]
    fn project_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refscout.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
file_extensions = [".js"]
excluded_folders = ["node_modules"]

[projects.backend]
file_extensions = [".py"]
"#
        )
        .unwrap();

        let global = Settings::load(&path, None).unwrap();
        assert_eq!(global.file_extensions, vec![".js"]);

        let backend = Settings::load(&path, Some("backend")).unwrap();
        assert_eq!(backend.file_extensions, vec![".py"]);
        // Unpatched keys fall through to the global value.
        assert_eq!(backend.excluded_folders, vec!["node_modules"]);
    }

    #[test]
    fn empty_extension_list_accepts_everything() {
        let settings = Settings::default();
        assert!(settings.file_filter("anything.xyz"));

        let settings = Settings {
            file_extensions: vec![".js".into(), ".jsx".into()],
            ..Settings::default()
        };
        assert!(settings.file_filter("app.js"));
        assert!(settings.file_filter("app.jsx"));
        assert!(!settings.file_filter("app.py"));
    }

    #[test]
    fn folder_filter_matches_fragments() {
        let settings = Settings {
            excluded_folders: vec!["node_modules".into()],
            ..Settings::default()
        };
        assert!(!settings.folder_filter(Path::new("/app/node_modules/react")));
        assert!(settings.folder_filter(Path::new("/app/src")));
    }
}
