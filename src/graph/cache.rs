//! Disk cache for per-project dependency graphs.
//!
//! One JSON file per project holding the graph snapshot and the time it
//! was last built. A missing or corrupt cache file is "no cache", never
//! an error: the caller rebuilds. Graphs older than 24 hours are stale
//! and get rebuilt too.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, error, warn};

use super::engine::{DepGraph, GraphSnapshot};
use crate::error::{Error, Result};

/// Cached graphs older than this are rebuilt.
pub const STALE_AFTER_SECS: i64 = 60 * 60 * 24;

/// On-disk record for one project.
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphRecord {
    /// Unix timestamp (seconds) of the last full build or refresh.
    pub last_update: i64,
    pub graph: GraphSnapshot,
}

impl GraphRecord {
    pub fn is_stale(&self) -> bool {
        self.is_stale_at(chrono::Utc::now().timestamp())
    }

    fn is_stale_at(&self, now: i64) -> bool {
        self.last_update < now - STALE_AFTER_SECS
    }
}

/// Manages the per-project cache files under one directory.
#[derive(Debug, Clone)]
pub struct GraphCache {
    dir: PathBuf,
}

impl GraphCache {
    /// A cache rooted at `dir`. The directory is created on first save.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn cache_path(&self, project: &str) -> PathBuf {
        // Project names can contain path separators; flatten them so the
        // cache file stays inside the cache directory.
        let safe: String = project
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.dir.join(format!("refscout-cache-{safe}.json"))
    }

    /// Load a project's graph record. Missing or unreadable cache means
    /// `None` — the caller treats that as "must rebuild".
    pub fn load(&self, project: &str) -> Option<(DepGraph, GraphRecord)> {
        let path = self.cache_path(project);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(project, error = %e, "no graph cache");
                return None;
            }
        };
        let record: GraphRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(project, error = %e, "corrupt graph cache, ignoring");
                return None;
            }
        };
        let graph = DepGraph::restore(record.graph.clone());
        Some((graph, record))
    }

    /// Persist a project's graph. Write failures are logged, not fatal.
    pub fn save(&self, project: &str, graph: &DepGraph, last_update: i64) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let record = GraphRecord {
            last_update,
            graph: graph.snapshot(),
        };
        let json = serde_json::to_string(&record)
            .map_err(|e| Error::Cache(format!("serialize graph for {project}: {e}")))?;
        let path = self.cache_path(project);
        if let Err(e) = std::fs::write(&path, json) {
            error!(project, path = %path.display(), error = %e, "failed to save dependency graph");
            return Err(Error::Cache(format!("write {}: {e}", path.display())));
        }
        debug!(project, path = %path.display(), "saved graph cache");
        Ok(())
    }

    /// Remove every cache file this manager owns.
    pub fn clear_all(&self) -> Result<()> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(()), // nothing cached yet
        };
        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("refscout-cache-") && name.ends_with(".json") {
                std::fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn sample_graph() -> DepGraph {
        let mut g = DepGraph::new();
        g.add(Path::new("/p/a.js"), Path::new("/p/b.js"));
        g.add(Path::new("/p/a.js"), Path::new("/p/c.js"));
        g
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = GraphCache::new(dir.path().to_path_buf());
        let graph = sample_graph();
        let now = chrono::Utc::now().timestamp();

        cache.save("myproj", &graph, now).unwrap();
        let (loaded, record) = cache.load("myproj").unwrap();

        assert_eq!(loaded.num_deps(), 2);
        assert_eq!(record.last_update, now);
        assert!(!record.is_stale());
    }

    #[test]
    fn missing_cache_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = GraphCache::new(dir.path().to_path_buf());
        assert!(cache.load("nothing").is_none());
    }

    #[test]
    fn corrupt_cache_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = GraphCache::new(dir.path().to_path_buf());
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(
            dir.path().join("refscout-cache-bad.json"),
            "{ not json at all",
        )
        .unwrap();
        assert!(cache.load("bad").is_none());
    }

    #[test]
    fn staleness_threshold_is_24_hours() {
        let now = chrono::Utc::now().timestamp();
        let fresh = GraphRecord {
            last_update: now - 60,
            graph: GraphSnapshot::default(),
        };
        let stale = GraphRecord {
            last_update: now - STALE_AFTER_SECS - 1,
            graph: GraphSnapshot::default(),
        };
        assert!(!fresh.is_stale());
        assert!(stale.is_stale());
    }

    #[test]
    fn clear_all_removes_cache_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = GraphCache::new(dir.path().to_path_buf());
        cache
            .save("one", &sample_graph(), chrono::Utc::now().timestamp())
            .unwrap();
        cache
            .save("two", &sample_graph(), chrono::Utc::now().timestamp())
            .unwrap();

        cache.clear_all().unwrap();
        assert!(cache.load("one").is_none());
        assert!(cache.load("two").is_none());
    }

    #[test]
    fn project_names_with_separators_stay_in_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = GraphCache::new(dir.path().to_path_buf());
        cache
            .save("weird/../name", &sample_graph(), 0)
            .unwrap();
        let (loaded, _) = cache.load("weird/../name").unwrap();
        assert_eq!(loaded.num_deps(), 2);
    }
}
