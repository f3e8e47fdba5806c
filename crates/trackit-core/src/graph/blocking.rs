//! Blocking graph between milestones.
//!
//! # Overview
//!
//! A milestone's `blockingFor` list declares edges `blocker → blocked`. The
//! blocked side may name a milestone that does not exist yet; the edge is kept
//! and the milestone starts blocked once it is created.
//!
//! # Release
//!
//! When the blocker completes, [`BlockingGraph::release`] marks each of its
//! outgoing edges as released. An edge is released at most once per run, so
//! the unlock cascade built on top of it notifies at most once per
//! `(blocker, blocked)` pair. Reopening a ticket in a completed milestone does
//! not re-arm released edges.
//!
//! # Usage
//!
//! ```rust
//! use trackit_core::graph::blocking::BlockingGraph;
//!
//! let mut graph = BlockingGraph::new();
//! graph.add_edges("m1", &["m2".to_string()]);
//! assert!(graph.is_blocked("m2"));
//!
//! assert_eq!(graph.release("m1"), vec!["m2".to_string()]);
//! assert!(!graph.is_blocked("m2"));
//! assert!(graph.release("m1").is_empty());
//! ```

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::cycles::{CycleWarning, detect_cycle_on_add};

// ---------------------------------------------------------------------------
// BlockingGraph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct BlockingGraph {
    /// milestone → milestones that block it.
    blocked_by: BTreeMap<String, BTreeSet<String>>,
    /// milestone → milestones it blocks, in declaration order.
    blocks: BTreeMap<String, Vec<String>>,
    /// `(blocker, blocked)` edges already released.
    released: HashSet<(String, String)>,
}

impl BlockingGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `blocker`'s outgoing edges.
    ///
    /// Edges are always added. Each edge that closes a cycle yields a
    /// [`CycleWarning`]; surfacing it is up to the caller.
    pub fn add_edges(&mut self, blocker: &str, blocking_for: &[String]) -> Vec<CycleWarning> {
        let mut warnings = Vec::new();
        for blocked in blocking_for {
            if let Some(warning) = detect_cycle_on_add(self, blocked, blocker) {
                warnings.push(warning);
            }

            self.blocked_by
                .entry(blocked.clone())
                .or_default()
                .insert(blocker.to_string());
            let successors = self.blocks.entry(blocker.to_string()).or_default();
            if !successors.contains(blocked) {
                successors.push(blocked.clone());
            }
        }
        warnings
    }

    /// Whether any unreleased edge points at `milestone`.
    #[must_use]
    pub fn is_blocked(&self, milestone: &str) -> bool {
        self.blocked_by.get(milestone).is_some_and(|blockers| {
            blockers
                .iter()
                .any(|blocker| !self.is_released(blocker, milestone))
        })
    }

    /// Every milestone with an edge into `milestone`, released or not.
    #[must_use]
    pub fn get_blockers(&self, milestone: &str) -> Vec<&str> {
        self.blocked_by
            .get(milestone)
            .map(|blockers| blockers.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Milestones `blocker` blocks, in declaration order.
    #[must_use]
    pub fn blocked_by_me(&self, blocker: &str) -> &[String] {
        self.blocks.get(blocker).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn is_released(&self, blocker: &str, blocked: &str) -> bool {
        self.released
            .contains(&(blocker.to_string(), blocked.to_string()))
    }

    /// Release every outgoing edge of `blocker` not released before.
    ///
    /// Returns the newly released targets in declaration order.
    pub fn release(&mut self, blocker: &str) -> Vec<String> {
        let Some(successors) = self.blocks.get(blocker) else {
            return Vec::new();
        };
        let mut newly = Vec::new();
        for blocked in successors {
            if self
                .released
                .insert((blocker.to_string(), blocked.clone()))
            {
                newly.push(blocked.clone());
            }
        }
        newly
    }

    /// Every milestone name that appears on either side of an edge.
    #[must_use]
    pub fn all_ids(&self) -> BTreeSet<&str> {
        self.blocked_by
            .keys()
            .chain(self.blocks.keys())
            .map(String::as_str)
            .collect()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.blocked_by.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocked_by.is_empty()
    }
}
