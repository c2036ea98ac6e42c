//! Per-project graph registry.
//!
//! Owns the process-wide mapping from project name to its dependency
//! graph, the "currently building" set, and the disk cache. Graph reads
//! from the interactive side and writes from build workers go through a
//! per-project `RwLock`; full rebuilds construct the new graph entirely
//! off to the side and swap it in under the write lock.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{mpsc, Arc, Mutex, RwLock};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::graph::{build_graph, file_dependencies, BuildProgress, DepGraph, GraphCache};
use crate::search::{usages_in_files, usages_in_folders, Usage};

/// One project's graph plus its last build/refresh time.
pub struct ProjectGraph {
    graph: RwLock<DepGraph>,
    /// Unix seconds of the last full build or single-file refresh.
    last_update: AtomicI64,
}

impl ProjectGraph {
    fn new(graph: DepGraph, last_update: i64) -> Self {
        Self {
            graph: RwLock::new(graph),
            last_update: AtomicI64::new(last_update),
        }
    }

    pub fn num_deps(&self) -> usize {
        self.read().num_deps()
    }

    pub fn last_update(&self) -> i64 {
        self.last_update.load(Ordering::Relaxed)
    }

    /// Transitive dependants of `file` — the files whose behavior can be
    /// affected by it.
    pub fn dependants(&self, file: &Path) -> HashSet<PathBuf> {
        self.read().dependants(file)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, DepGraph> {
        self.graph.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, DepGraph> {
        self.graph.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Result of a completed background build.
#[derive(Debug)]
pub struct BuildSummary {
    pub files_scanned: usize,
    pub num_deps: usize,
    pub elapsed: Duration,
}

/// Handle to an in-flight background build: cosmetic progress counters
/// plus a channel that delivers the summary on completion.
pub struct BuildHandle {
    pub progress: Arc<BuildProgress>,
    pub done: mpsc::Receiver<BuildSummary>,
}

/// Process-wide registry of project graphs.
pub struct ProjectRegistry {
    cache: GraphCache,
    graphs: Mutex<HashMap<String, Arc<ProjectGraph>>>,
    building: Mutex<HashSet<String>>,
}

impl ProjectRegistry {
    pub fn new(cache: GraphCache) -> Self {
        Self {
            cache,
            graphs: Mutex::new(HashMap::new()),
            building: Mutex::new(HashSet::new()),
        }
    }

    /// The in-memory graph for a project, if one is loaded.
    pub fn get(&self, project: &str) -> Option<Arc<ProjectGraph>> {
        self.lock_graphs().get(project).cloned()
    }

    /// Make sure a usable graph exists for the project: load it from
    /// cache, and kick off a background rebuild when there is no cache,
    /// the cached graph is empty, or it is older than 24 hours. A stale
    /// graph is still installed so queries work while the rebuild runs.
    pub fn ensure_graph(
        self: &Arc<Self>,
        project: &str,
        folders: &[PathBuf],
        settings: &Settings,
    ) -> Option<BuildHandle> {
        if self.get(project).is_some() {
            return None;
        }

        match self.cache.load(project) {
            Some((graph, record)) if !graph.is_empty() => {
                info!(
                    project,
                    deps = graph.num_deps(),
                    "loaded dependency graph from cache"
                );
                let stale = record.is_stale();
                self.install(project, graph, record.last_update);
                if stale {
                    info!(project, "cached graph older than 24h, rebuilding");
                    return self.rebuild(project, folders.to_vec(), settings.clone());
                }
                None
            }
            Some(_) => {
                info!(project, "cached graph is empty, rebuilding");
                self.rebuild(project, folders.to_vec(), settings.clone())
            }
            None => {
                info!(project, "no cached graph, building");
                self.rebuild(project, folders.to_vec(), settings.clone())
            }
        }
    }

    /// Rebuild a project's graph on a worker thread. Returns `None` if a
    /// build for this project is already running — concurrent requests
    /// are idempotent no-ops.
    pub fn rebuild(
        self: &Arc<Self>,
        project: &str,
        folders: Vec<PathBuf>,
        settings: Settings,
    ) -> Option<BuildHandle> {
        if !self.begin_build(project) {
            debug!(project, "build already in progress, ignoring request");
            return None;
        }

        let progress = Arc::new(BuildProgress::default());
        let (tx, rx) = mpsc::channel();
        let registry = Arc::clone(self);
        let project = project.to_string();
        let worker_progress = Arc::clone(&progress);

        thread::spawn(move || {
            let started = Instant::now();
            // Built fully off to the side; readers keep using the old
            // graph until the swap below.
            let graph = build_graph(&folders, &settings, &worker_progress);
            let now = chrono::Utc::now().timestamp();
            let summary = BuildSummary {
                files_scanned: worker_progress.files_scanned(),
                num_deps: graph.num_deps(),
                elapsed: started.elapsed(),
            };

            if let Err(e) = registry.cache.save(&project, &graph, now) {
                warn!(project, error = %e, "could not persist rebuilt graph");
            }
            registry.install(&project, graph, now);
            registry.finish_build(&project);
            // The requester may have stopped listening; that's fine.
            let _ = tx.send(summary);
        });

        Some(BuildHandle { progress, done: rx })
    }

    /// Recompute one file's direct dependees after a save. Persists the
    /// graph only when the edge set actually changed. Returns whether it
    /// changed.
    pub fn refresh_file(&self, project: &str, file: &Path, settings: &Settings) -> Result<bool> {
        // No graph in memory yet: fall back to the disk cache before
        // giving up, so a save right after startup still lands.
        let entry = match self.get(project) {
            Some(entry) => entry,
            None => match self.cache.load(project) {
                Some((graph, record)) => {
                    debug!(project, "loading cached graph to refresh a saved file");
                    self.install(project, graph, record.last_update)
                }
                None => {
                    warn!(
                        project,
                        file = %file.display(),
                        "cannot refresh dependencies, no graph loaded or cached for project"
                    );
                    return Ok(false);
                }
            },
        };

        let new_deps = file_dependencies(file, settings)?;
        let old_deps = entry.read().direct_dependees(file);
        if new_deps == old_deps {
            return Ok(false);
        }

        entry.write().set(file, &new_deps);
        let now = chrono::Utc::now().timestamp();
        entry.last_update.store(now, Ordering::Relaxed);
        if let Err(e) = self.cache.save(project, &entry.read(), now) {
            warn!(project, error = %e, "could not persist refreshed graph");
        }
        Ok(true)
    }

    /// The graph-narrowed file set for a usage query: the transitive
    /// dependants of the edited file, plus the file itself.
    pub fn candidate_files(&self, project: &str, current_file: &Path) -> Option<Vec<PathBuf>> {
        let entry = self.get(project)?;
        // In a cyclic import the file is its own dependant; the set keeps
        // it from being scanned twice.
        let mut set = entry.dependants(current_file);
        set.insert(current_file.to_path_buf());
        let mut files: Vec<PathBuf> = set.into_iter().collect();
        files.sort();
        Some(files)
    }

    /// Find usages of `subject`, narrowed through the dependency graph
    /// when possible, falling back to a full folder walk when the graph
    /// is disabled or unavailable.
    pub fn find_usages(
        &self,
        project: &str,
        subject: &str,
        current_file: &Path,
        folders: &[PathBuf],
        settings: &Settings,
    ) -> Vec<Usage> {
        if settings.disable_dep_graph {
            return usages_in_folders(subject, folders, settings);
        }
        match self.candidate_files(project, current_file) {
            Some(files) => usages_in_files(subject, &files),
            None => usages_in_folders(subject, folders, settings),
        }
    }

    /// Drop all cache files and forget every in-memory graph.
    pub fn clear_caches(&self) -> Result<()> {
        self.cache.clear_all()?;
        self.lock_graphs().clear();
        Ok(())
    }

    pub fn is_building(&self, project: &str) -> bool {
        self.lock_building().contains(project)
    }

    fn install(&self, project: &str, graph: DepGraph, last_update: i64) -> Arc<ProjectGraph> {
        let mut graphs = self.lock_graphs();
        match graphs.get(project) {
            Some(entry) => {
                *entry.write() = graph;
                entry.last_update.store(last_update, Ordering::Relaxed);
                Arc::clone(entry)
            }
            None => {
                let entry = Arc::new(ProjectGraph::new(graph, last_update));
                graphs.insert(project.to_string(), Arc::clone(&entry));
                entry
            }
        }
    }

    fn begin_build(&self, project: &str) -> bool {
        self.lock_building().insert(project.to_string())
    }

    fn finish_build(&self, project: &str) {
        self.lock_building().remove(project);
    }

    fn lock_graphs(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<ProjectGraph>>> {
        self.graphs.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_building(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.building.lock().unwrap_or_else(|e| e.into_inner())
    }
}
