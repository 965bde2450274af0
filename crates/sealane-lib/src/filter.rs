//! Query-time chokepoint exclusion.
//!
//! The filter holds a snapshot of excluded node ids copied out of the
//! registry at construction, never a back-reference, so it stays cheap to
//! build per request and free of shared mutable state.

use std::collections::HashSet;

use tracing::debug;

use crate::chokepoint::ChokepointRegistry;
use crate::graph::NodeId;

/// Edge filter that rejects edges touching excluded chokepoint nodes.
///
/// With an empty exclusion set every edge is accepted; otherwise an edge is
/// accepted iff neither endpoint is excluded. The same exclusions always
/// produce the same results; the graph itself is never mutated.
#[derive(Debug, Clone, Default)]
pub struct ChokepointFilter {
    excluded_node_ids: HashSet<NodeId>,
    excluded_chokepoints: Vec<String>,
}

impl ChokepointFilter {
    /// Filter that accepts every edge.
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Filter over an explicit set of excluded node ids.
    pub fn from_node_ids(excluded_node_ids: HashSet<NodeId>) -> Self {
        Self {
            excluded_node_ids,
            excluded_chokepoints: Vec::new(),
        }
    }

    /// Filter excluding the named chokepoints, resolved through the registry.
    ///
    /// Unknown ids contribute nothing; the retained id list is canonicalized
    /// for response echoing.
    pub fn from_chokepoints<S: AsRef<str>>(ids: &[S], registry: &ChokepointRegistry) -> Self {
        let excluded_node_ids = registry.excluded_node_ids(ids);
        let excluded_chokepoints = registry.canonicalize(ids);

        if !excluded_chokepoints.is_empty() {
            debug!(
                chokepoints = ?excluded_chokepoints,
                nodes = excluded_node_ids.len(),
                "chokepoint exclusions active"
            );
        }

        Self {
            excluded_node_ids,
            excluded_chokepoints,
        }
    }

    /// Accept an edge iff neither endpoint is excluded.
    pub fn accept(&self, base: NodeId, adj: NodeId) -> bool {
        if self.excluded_node_ids.is_empty() {
            return true;
        }
        !self.excluded_node_ids.contains(&base) && !self.excluded_node_ids.contains(&adj)
    }

    pub fn has_exclusions(&self) -> bool {
        !self.excluded_node_ids.is_empty()
    }

    pub fn excluded_node_ids(&self) -> &HashSet<NodeId> {
        &self.excluded_node_ids
    }

    /// Canonicalized chokepoint ids this filter was built from.
    pub fn excluded_chokepoints(&self) -> &[String] {
        &self.excluded_chokepoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chokepoint::Chokepoint;

    fn registry() -> ChokepointRegistry {
        let mut registry = ChokepointRegistry::new();
        registry.add(
            Chokepoint::definition("SUEZ", "Suez Canal", "AFRICA", 30.585, 32.265, 2.0, 0.5)
                .with_node_ids(HashSet::from([100, 101, 102])),
        );
        registry.add(
            Chokepoint::definition("PANAMA", "Panama Canal", "AMERICAS", 9.0, -79.5, 2.0, 0.5)
                .with_node_ids(HashSet::from([200, 201])),
        );
        registry
    }

    #[test]
    fn empty_filter_accepts_everything() {
        let filter = ChokepointFilter::accept_all();
        assert!(filter.accept(100, 200));
        assert!(!filter.has_exclusions());
    }

    #[test]
    fn rejects_edges_touching_excluded_nodes() {
        let filter = ChokepointFilter::from_chokepoints(&["SUEZ", "PANAMA"], &registry());
        assert!(!filter.accept(101, 50));
        assert!(!filter.accept(50, 200));
        assert!(filter.accept(50, 60));
    }

    #[test]
    fn unknown_chokepoints_are_dropped() {
        let filter = ChokepointFilter::from_chokepoints(&["SUEZ", "ATLANTIS"], &registry());
        assert_eq!(filter.excluded_chokepoints(), ["SUEZ"]);
        assert_eq!(filter.excluded_node_ids().len(), 3);
    }

    #[test]
    fn explicit_node_set_filter() {
        let filter = ChokepointFilter::from_node_ids(HashSet::from([7]));
        assert!(!filter.accept(7, 8));
        assert!(!filter.accept(8, 7));
        assert!(filter.accept(8, 9));
    }
}
