//! Cycle detection for the milestone blocking graph.
//!
//! A blocking cycle means none of its milestones can ever unlock. Cycles are
//! planning mistakes, not engine failures: the edge is still added and the
//! caller logs the returned [`CycleWarning`].
//!
//! Detection is a DFS from the blocker of the new edge along existing
//! `blocked_by` edges, looking for a path back to the blocked side. Each node
//! and edge is visited at most once.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};
use std::fmt;

use super::blocking::BlockingGraph;

// ---------------------------------------------------------------------------
// CycleWarning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleWarning {
    /// Milestone names forming the loop, starting and ending at `edge_from`.
    ///
    /// Adding `A` blocked by `B` when `B` is already blocked by `C` and `C`
    /// by `A` gives `["A", "B", "C", "A"]`.
    pub cycle_path: Vec<String>,
    /// The blocked side of the new edge.
    pub edge_from: String,
    /// The blocker side of the new edge.
    pub edge_to: String,
}

impl CycleWarning {
    /// Number of distinct milestones in the cycle.
    #[must_use]
    pub fn cycle_len(&self) -> usize {
        self.cycle_path.len().saturating_sub(1)
    }

    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.edge_from == self.edge_to
    }

    #[must_use]
    pub fn is_mutual_block(&self) -> bool {
        self.cycle_len() == 2
    }
}

impl fmt::Display for CycleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_self_loop() {
            write!(f, "milestone '{}' blocks itself", self.edge_from)
        } else if self.is_mutual_block() {
            write!(
                f,
                "milestones '{}' and '{}' block each other",
                self.edge_from, self.edge_to
            )
        } else {
            write!(
                f,
                "blocking cycle of {} milestones: {}",
                self.cycle_len(),
                self.cycle_path.join(" → ")
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Would making `from` blocked by `to` close a cycle in `graph`?
///
/// Must be called before the edge is inserted.
#[must_use]
pub fn detect_cycle_on_add(graph: &BlockingGraph, from: &str, to: &str) -> Option<CycleWarning> {
    if from == to {
        return Some(CycleWarning {
            cycle_path: vec![from.to_string(), from.to_string()],
            edge_from: from.to_string(),
            edge_to: to.to_string(),
        });
    }

    let mut visited = HashSet::new();
    let mut parent: HashMap<String, String> = HashMap::new();
    if !dfs_find_path(graph, to, from, &mut visited, &mut parent) {
        return None;
    }

    // Walk parents back from `from` to `to`, then flip.
    let mut chain = vec![from.to_string()];
    let mut current = from.to_string();
    while current != to {
        match parent.get(&current) {
            Some(prev) => {
                chain.push(prev.clone());
                current = prev.clone();
            }
            None => break,
        }
    }
    chain.reverse();

    let mut cycle_path = Vec::with_capacity(chain.len() + 1);
    cycle_path.push(from.to_string());
    cycle_path.extend(chain);

    Some(CycleWarning {
        cycle_path,
        edge_from: from.to_string(),
        edge_to: to.to_string(),
    })
}

fn dfs_find_path(
    graph: &BlockingGraph,
    current: &str,
    target: &str,
    visited: &mut HashSet<String>,
    parent: &mut HashMap<String, String>,
) -> bool {
    if current == target {
        return true;
    }
    if !visited.insert(current.to_string()) {
        return false;
    }
    for next in graph.get_blockers(current) {
        if visited.contains(next) {
            continue;
        }
        parent.insert(next.to_string(), current.to_string());
        if dfs_find_path(graph, next, target, visited, parent) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)]) -> BlockingGraph {
        let mut g = BlockingGraph::new();
        for (blocker, blocked) in edges {
            g.add_edges(blocker, &[(*blocked).to_string()]);
        }
        g
    }

    #[test]
    fn self_loop() {
        let g = BlockingGraph::new();
        let warning = detect_cycle_on_add(&g, "m1", "m1").expect("self loop");
        assert!(warning.is_self_loop());
        assert_eq!(warning.cycle_len(), 1);
        assert_eq!(warning.to_string(), "milestone 'm1' blocks itself");
    }

    #[test]
    fn no_cycle_in_a_chain() {
        // a blocks b, b blocks c
        let g = graph(&[("a", "b"), ("b", "c")]);
        // d blocked by c: no path from c back to d
        assert!(detect_cycle_on_add(&g, "d", "c").is_none());
    }

    #[test]
    fn three_node_cycle_path() {
        // a blocks b, b blocks c; now c would block a
        let g = graph(&[("a", "b"), ("b", "c")]);
        let warning = detect_cycle_on_add(&g, "a", "c").expect("cycle");
        assert_eq!(warning.cycle_path, vec!["a", "c", "b", "a"]);
        assert_eq!(warning.cycle_len(), 3);
        assert!(warning.to_string().starts_with("blocking cycle of 3 milestones"));
    }
}
