//! The file-level dependency graph.
//!
//! Nodes are file paths; an edge `dependant -> dependee` means the
//! dependant imports the dependee. Both directions are indexed so that
//! "who do I import" and "who imports me" are equally cheap, and the two
//! maps are kept symmetric at all times outside of a mutation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Maximum BFS levels for transitive traversal. Cycle and runaway
/// protection; real import chains never get close.
const MAX_TRAVERSAL_LEVELS: usize = 50;

/// Serializable snapshot of both adjacency maps.
///
/// The backward map is derivable from the forward map but persisted
/// as-is for fast loads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphSnapshot {
    pub forward: HashMap<PathBuf, BTreeSet<PathBuf>>,
    pub backward: HashMap<PathBuf, BTreeSet<PathBuf>>,
}

/// Bidirectional dependency graph over file paths.
#[derive(Debug, Clone, Default)]
pub struct DepGraph {
    /// dependant -> set of files it imports.
    forward: HashMap<PathBuf, BTreeSet<PathBuf>>,
    /// dependee -> set of files importing it.
    backward: HashMap<PathBuf, BTreeSet<PathBuf>>,
    /// Total forward edge count, maintained incrementally for cheap
    /// progress reporting.
    num_deps: usize,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of forward edges.
    pub fn num_deps(&self) -> usize {
        self.num_deps
    }

    pub fn is_empty(&self) -> bool {
        self.num_deps == 0
    }

    /// Add one edge `dependant -> dependee`. No-op if it already exists.
    pub fn add(&mut self, dependant: &Path, dependee: &Path) {
        let inserted = self
            .forward
            .entry(dependant.to_path_buf())
            .or_default()
            .insert(dependee.to_path_buf());
        if inserted {
            self.num_deps += 1;
        }
        self.backward
            .entry(dependee.to_path_buf())
            .or_default()
            .insert(dependant.to_path_buf());
    }

    /// Add edges from `dependant` to every path in `dependees`.
    pub fn add_all<I, P>(&mut self, dependant: &Path, dependees: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for dependee in dependees {
            self.add(dependant, dependee.as_ref());
        }
    }

    /// Replace all outgoing edges of `dependant` with `dependees`.
    ///
    /// Dependees no longer present also lose their backward edge to the
    /// dependant, keeping the maps symmetric.
    pub fn set<I, P>(&mut self, dependant: &Path, dependees: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let old = self.forward.remove(dependant).unwrap_or_default();
        self.num_deps -= old.len();
        for dependee in &old {
            if let Some(backs) = self.backward.get_mut(dependee) {
                backs.remove(dependant);
                if backs.is_empty() {
                    self.backward.remove(dependee);
                }
            }
        }
        self.add_all(dependant, dependees);
    }

    /// All files that transitively import `dependee`.
    pub fn dependants(&self, dependee: &Path) -> HashSet<PathBuf> {
        Self::traverse(&self.backward, dependee)
    }

    /// All files `dependant` transitively imports.
    pub fn dependees(&self, dependant: &Path) -> HashSet<PathBuf> {
        Self::traverse(&self.forward, dependant)
    }

    /// Level-by-level transitive closure. Each level only expands nodes
    /// not seen before, so cycles terminate; the level cap is a second
    /// line of defense. The start node itself shows up in the result
    /// when a cycle makes it reachable.
    fn traverse(graph: &HashMap<PathBuf, BTreeSet<PathBuf>>, start: &Path) -> HashSet<PathBuf> {
        let mut results: HashSet<PathBuf> = HashSet::new();
        let mut frontier: Vec<PathBuf> = vec![start.to_path_buf()];

        for _ in 0..MAX_TRAVERSAL_LEVELS {
            let mut next: Vec<PathBuf> = Vec::new();
            for node in &frontier {
                if let Some(neighbors) = graph.get(node.as_path()) {
                    next.extend(
                        neighbors
                            .iter()
                            .filter(|n| !results.contains(n.as_path()))
                            .cloned(),
                    );
                }
            }
            if next.is_empty() {
                break;
            }
            results.extend(next.iter().cloned());
            frontier = next;
        }

        results
    }

    /// Snapshot both maps for persistence.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            forward: self.forward.clone(),
            backward: self.backward.clone(),
        }
    }

    /// Rebuild from a snapshot, recomputing `num_deps` from the forward
    /// edge count.
    pub fn restore(snapshot: GraphSnapshot) -> Self {
        let num_deps = snapshot.forward.values().map(BTreeSet::len).sum();
        Self {
            forward: snapshot.forward,
            backward: snapshot.backward,
            num_deps,
        }
    }

    pub fn clear(&mut self) {
        self.forward.clear();
        self.backward.clear();
        self.num_deps = 0;
    }

    /// Direct (non-transitive) dependees of a file.
    pub fn direct_dependees(&self, dependant: &Path) -> BTreeSet<PathBuf> {
        self.forward.get(dependant).cloned().unwrap_or_default()
    }

    #[cfg(test)]
    fn check_symmetry(&self) {
        for (p, deps) in &self.forward {
            for q in deps {
                assert!(
                    self.backward.get(q).is_some_and(|backs| backs.contains(p)),
                    "forward edge {p:?} -> {q:?} missing backward counterpart"
                );
            }
        }
        for (q, backs) in &self.backward {
            for p in backs {
                assert!(
                    self.forward.get(p).is_some_and(|deps| deps.contains(q)),
                    "backward edge {q:?} <- {p:?} missing forward counterpart"
                );
            }
        }
    }
}
