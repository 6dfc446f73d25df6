//! Call graph construction and reachability marking.
//!
//! Performance characteristics:
//! - Index build: O(|L|) where L = labels
//! - Graph build: O(|L| + |C|) where C = call edges
//! - Multi-source reachability: O(|L| + |E|) single BFS traversal
//!
//! Roots are the entry label plus every label named in the exclusion
//! set; one multi-source traversal marks everything reachable from any
//! of them. The visited set bounds the traversal, so call cycles
//! (mutual or self recursion) terminate.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graphmap::DiGraphMap;
use tracing::{debug, info, warn};

use crate::config::ExclusionSet;
use crate::error::{DeadasmError, DeadasmResult};
use crate::parse::Tree;

/// Identity of one label occurrence: indices into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelId {
    pub file: usize,
    pub label: usize,
}

/// Build the name-keyed label lookup.
///
/// Several files may define the same name (one global, or several
/// statics), so every name maps to all of its occurrences. Built once
/// after parsing; call resolution never rescans the tree.
pub fn build_label_index(tree: &Tree) -> HashMap<&str, Vec<LabelId>> {
    let mut index: HashMap<&str, Vec<LabelId>> = HashMap::new();
    for (file, label, l) in tree.labels() {
        index
            .entry(l.name.as_str())
            .or_default()
            .push(LabelId { file, label });
    }
    index
}

/// Build the visibility-filtered call graph.
///
/// Uses `DiGraphMap<LabelId, ()>`: `Copy` node keys and unit edges.
/// An edge caller → callee exists for every call-name resolution that
/// passes the visibility test: the callee is global, or it sits in the
/// caller's own file. Every passing occurrence gets an edge, not just
/// the first; names that resolve to nothing add none.
pub fn build_call_graph(tree: &Tree, index: &HashMap<&str, Vec<LabelId>>) -> DiGraphMap<LabelId, ()> {
    let mut g = DiGraphMap::new();

    for (file, label, _) in tree.labels() {
        g.add_node(LabelId { file, label });
    }

    for (file, label, l) in tree.labels() {
        let caller = LabelId { file, label };
        for call in &l.calls {
            let Some(candidates) = index.get(call.as_str()) else {
                continue;
            };
            for &callee in candidates {
                if callee == caller {
                    // Self recursion adds nothing to reachability.
                    continue;
                }
                let target = &tree.files[callee.file].labels[callee.label];
                if target.is_global || callee.file == caller.file {
                    g.add_edge(caller, callee, ());
                }
            }
        }
    }

    g
}

/// Multi-source BFS over the call graph.
///
/// Complexity is O(|L| + |E|) regardless of the number of roots; each
/// node and edge is visited at most once.
pub fn reachable_from_roots(
    g: &DiGraphMap<LabelId, ()>,
    roots: impl IntoIterator<Item = LabelId>,
) -> HashSet<LabelId> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();

    for root in roots {
        if g.contains_node(root) {
            if visited.insert(root) {
                queue.push_back(root);
            }
        } else {
            warn!(?root, "root label not present in call graph");
        }
    }

    while let Some(node) = queue.pop_front() {
        for n in g.neighbors(node) {
            if visited.insert(n) {
                queue.push_back(n);
            }
        }
    }

    visited
}

/// Statistics from the marking phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkSummary {
    /// Labels in the tree
    pub total_labels: usize,
    /// Labels marked used after this pass
    pub used_labels: usize,
    /// Traversal roots (entry + exclusion matches)
    pub roots: usize,
    /// Call occurrences whose name matched no label anywhere
    pub unresolved_calls: usize,
}

/// Mark every label transitively reachable from the entry point.
///
/// The entry name is force-inserted into the exclusion set first (an
/// entry point is never eligible for removal), and every label whose
/// name is excluded becomes an additional root, regardless of its
/// visibility or file. Fails with [`DeadasmError::EntryNotFound`] when
/// no global label carries the entry name; nothing is marked in that
/// case, and the caller must not rewrite.
///
/// `used` flags are only ever set, never cleared, so repeated marking
/// passes can only grow the reachable set.
pub fn mark_reachable(
    tree: &mut Tree,
    entry: &str,
    exclusions: &mut ExclusionSet,
) -> DeadasmResult<MarkSummary> {
    exclusions.insert(entry);

    let entry_id = tree
        .labels()
        .find(|(_, _, l)| l.is_global && l.name == entry)
        .map(|(file, label, _)| LabelId { file, label })
        .ok_or_else(|| DeadasmError::entry_not_found(entry))?;

    let (visited, roots, unresolved_calls) = {
        let index = build_label_index(tree);
        let graph = build_call_graph(tree, &index);

        let mut roots: Vec<LabelId> = vec![entry_id];
        for (file, label, l) in tree.labels() {
            let id = LabelId { file, label };
            if id != entry_id && exclusions.contains(&l.name) {
                roots.push(id);
            }
        }

        let unresolved = tree
            .labels()
            .flat_map(|(_, _, l)| l.calls.iter())
            .filter(|call| !index.contains_key(call.as_str()))
            .count();

        let visited = reachable_from_roots(&graph, roots.iter().copied());
        (visited, roots.len(), unresolved)
    };

    for (fi, file) in tree.files.iter_mut().enumerate() {
        for (li, label) in file.labels.iter_mut().enumerate() {
            if visited.contains(&LabelId { file: fi, label: li }) && !label.used {
                label.used = true;
                debug!(label = %label.name, file = %file.path.display(), "marked as used");
            }
        }
    }

    let summary = MarkSummary {
        total_labels: tree.label_count(),
        used_labels: tree.labels().filter(|(_, _, l)| l.used).count(),
        roots,
        unresolved_calls,
    };
    info!(
        total = summary.total_labels,
        used = summary.used_labels,
        roots = summary.roots,
        unresolved = summary.unresolved_calls,
        "reachability marking complete"
    );
    Ok(summary)
}
