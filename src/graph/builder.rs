//! Graph builder — scans project folders and assembles the dependency
//! graph.
//!
//! Walks source files respecting .gitignore and the configured filters,
//! extracts import targets from each file, resolves them to concrete
//! paths, and adds the resulting edges. File scanning is parallel; the
//! graph itself is assembled on the calling thread.

use ignore::WalkBuilder;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

use super::engine::DepGraph;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::resolve::PathResolver;
use crate::scanner::find_imports;

/// Shared counters a build bumps as it goes. Purely cosmetic — polled by
/// progress displays, never used for control flow.
#[derive(Debug, Default)]
pub struct BuildProgress {
    pub files_scanned: AtomicUsize,
    pub deps_found: AtomicUsize,
}

impl BuildProgress {
    pub fn files_scanned(&self) -> usize {
        self.files_scanned.load(Ordering::Relaxed)
    }

    pub fn deps_found(&self) -> usize {
        self.deps_found.load(Ordering::Relaxed)
    }
}

/// Build a whole new dependency graph for the given project folders.
///
/// Per-file failures (undecodable files, unresolvable imports) are
/// contained and logged; they never abort the build.
pub fn build_graph(folders: &[PathBuf], settings: &Settings, progress: &BuildProgress) -> DepGraph {
    let files = collect_files(folders, settings);
    debug!(file_count = files.len(), "scanning project files for imports");

    let scanned: Vec<(PathBuf, BTreeSet<PathBuf>)> = files
        .par_iter()
        .map_init(
            || PathResolver::new(settings),
            |resolver, file_path| {
                let deps = match scan_file(file_path, resolver) {
                    Ok(deps) => deps,
                    Err(e) => {
                        warn!(file = %file_path.display(), error = %e, "skipping file");
                        BTreeSet::new()
                    }
                };
                progress.files_scanned.fetch_add(1, Ordering::Relaxed);
                progress.deps_found.fetch_add(deps.len(), Ordering::Relaxed);
                (file_path.clone(), deps)
            },
        )
        .collect();

    let mut graph = DepGraph::new();
    for (file_path, deps) in scanned {
        graph.add_all(&file_path, deps);
    }

    info!(
        files = files.len(),
        deps = graph.num_deps(),
        "dependency graph built"
    );
    graph
}

/// Compute one file's direct dependees: extract imports, resolve them,
/// drop duplicates and self-references.
pub fn file_dependencies(file_path: &Path, settings: &Settings) -> Result<BTreeSet<PathBuf>> {
    let resolver = PathResolver::new(settings);
    scan_file(file_path, &resolver)
}

fn scan_file(file_path: &Path, resolver: &PathResolver<'_>) -> Result<BTreeSet<PathBuf>> {
    let text = std::fs::read_to_string(file_path)
        .map_err(|_| Error::Decode(file_path.to_path_buf()))?;
    let imports = find_imports(&text);
    let dir = file_path.parent().unwrap_or_else(|| Path::new("."));
    let mut deps: BTreeSet<PathBuf> = resolver.resolve(&imports, dir).into_iter().collect();
    deps.remove(file_path);
    Ok(deps)
}

/// All files under `folders` that pass the filters. Dot entries are
/// skipped; .gitignore is honored.
pub fn collect_files(folders: &[PathBuf], settings: &Settings) -> Vec<PathBuf> {
    let Some((first, rest)) = folders.split_first() else {
        return Vec::new();
    };
    let mut builder = WalkBuilder::new(first);
    for folder in rest {
        builder.add(folder);
    }
    let folder_settings = settings.clone();
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .filter_entry(move |entry| {
            entry.file_type().map_or(true, |ft| !ft.is_dir())
                || folder_settings.folder_filter(entry.path())
        })
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| settings.file_filter(n))
        })
        .collect()
}
