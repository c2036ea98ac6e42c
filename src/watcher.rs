//! File watcher keeping project graphs in sync.
//!
//! Watches project folders and refreshes a file's dependency edges when
//! it is saved — the standalone equivalent of an editor's on-save hook.
//! Events are debounced so a burst of writes triggers one refresh.

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEvent, Debouncer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::project::ProjectRegistry;

/// Quiet period before a burst of file events is delivered.
const DEBOUNCE: Duration = Duration::from_millis(250);

/// Handle to an active watch. Dropping it stops the watcher.
pub struct FileWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
}

/// Watch `folders` and refresh the project's graph whenever a file
/// passing the extension filter is saved.
pub fn start_watching(
    registry: Arc<ProjectRegistry>,
    project: &str,
    folders: &[PathBuf],
    settings: Settings,
) -> Result<FileWatcher> {
    let project = project.to_string();
    let mut debouncer = new_debouncer(DEBOUNCE, move |res: DebounceEventResult| match res {
        Ok(events) => {
            for event in events {
                handle_event(&registry, &project, &settings, event);
            }
        }
        Err(e) => warn!(error = %e, "file watcher error"),
    })
    .map_err(|e| Error::Watch(e.to_string()))?;

    for folder in folders {
        debouncer
            .watcher()
            .watch(folder, RecursiveMode::Recursive)
            .map_err(|e| Error::Watch(format!("{}: {e}", folder.display())))?;
    }

    Ok(FileWatcher {
        _debouncer: debouncer,
    })
}

fn handle_event(
    registry: &ProjectRegistry,
    project: &str,
    settings: &Settings,
    event: DebouncedEvent,
) {
    let path = event.path;
    // Deletions and directory events carry nothing to rescan.
    if !path.is_file() {
        return;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return;
    };
    if !settings.file_filter(name) {
        return;
    }
    match registry.refresh_file(project, &path, settings) {
        Ok(true) => debug!(file = %path.display(), "refreshed dependencies after save"),
        Ok(false) => {}
        Err(e) => warn!(file = %path.display(), error = %e, "could not refresh dependencies"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphCache;
    use std::fs;
    use std::path::Path;
    use std::time::Instant;

    fn write(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
    }

    #[test]
    fn save_refreshes_the_graph() {
        let project_dir = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let a = project_dir.path().join("a.js");
        let b = project_dir.path().join("b.js");
        let c = project_dir.path().join("c.js");
        write(&a, "import b from \"./b.js\";\n");
        write(&b, "export default 1;\n");
        write(&c, "export default 2;\n");

        let registry = Arc::new(ProjectRegistry::new(GraphCache::new(
            cache_dir.path().to_path_buf(),
        )));
        let handle = registry
            .rebuild(
                "proj",
                vec![project_dir.path().to_path_buf()],
                Settings::default(),
            )
            .unwrap();
        handle.done.recv_timeout(Duration::from_secs(10)).unwrap();

        let _watcher = start_watching(
            Arc::clone(&registry),
            "proj",
            &[project_dir.path().to_path_buf()],
            Settings::default(),
        )
        .unwrap();

        // Rewrite a.js to import c instead of b; the watcher should pick
        // the save up and rewire the edges.
        write(&a, "import c from \"./c.js\";\n");

        let entry = registry.get("proj").unwrap();
        let deadline = Instant::now() + Duration::from_secs(15);
        loop {
            if entry.dependants(&c).contains(&a) {
                break;
            }
            assert!(
                Instant::now() < deadline,
                "watcher never refreshed the saved file"
            );
            std::thread::sleep(Duration::from_millis(50));
        }
        assert!(entry.dependants(&b).is_empty());
    }
}
