//! Iterative walks over the parent and synonym relations.
//!
//! Every walk keeps a visited set so that residual cycles terminate.

use crate::graph::store::{GraphStore, NodeId, RelType};
use crate::model::rank::Rank;
use std::collections::{HashSet, VecDeque};

impl GraphStore {
    /// First parent of a taxon.
    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.sources(node, RelType::ParentOf).first().copied()
    }

    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.targets(node, RelType::ParentOf)
    }

    /// Ancestors of `node`, closest first, excluding `node`.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        self.parents_until(node, None)
    }

    /// Ancestors of `node`, closest first, stopping before `stop`.
    pub fn parents_until(&self, node: NodeId, stop: Option<NodeId>) -> Vec<NodeId> {
        let mut visited = HashSet::from([node]);
        let mut chain = Vec::new();
        let mut current = node;
        while let Some(parent) = self.parent_of(current) {
            if Some(parent) == stop || !visited.insert(parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// True if the walk up from `node` comes back to a visited taxon, which
    /// leaves it without a root.
    pub fn has_parent_cycle(&self, node: NodeId) -> bool {
        let mut visited = HashSet::from([node]);
        let mut current = node;
        while let Some(parent) = self.parent_of(current) {
            if !visited.insert(parent) {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Topmost ancestor, or `node` itself when it has no parent.
    pub fn highest_parent(&self, node: NodeId) -> NodeId {
        self.ancestors(node).last().copied().unwrap_or(node)
    }

    /// Closest ancestor whose name has exactly `rank`.
    pub fn parent_with_rank(&self, node: NodeId, rank: Rank) -> Option<NodeId> {
        self.ancestors(node)
            .into_iter()
            .find(|ancestor| self.usage_rank(*ancestor) == rank)
    }

    /// Closest ancestor with a rank other than `Other` or `Unranked`.
    pub fn parent_with_concrete_rank(&self, node: NodeId) -> Option<NodeId> {
        self.ancestors(node)
            .into_iter()
            .find(|ancestor| self.usage_rank(*ancestor).not_other_or_unranked())
    }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).contains(&ancestor)
    }

    /// Accepted usages a synonym points to, in insertion order.
    pub fn accepted_of(&self, synonym: NodeId) -> Vec<NodeId> {
        self.targets(synonym, RelType::SynonymOf)
    }

    /// All taxa below `node` in breadth-first order, excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut visited = HashSet::from([node]);
        let mut queue = VecDeque::from([node]);
        let mut found = Vec::new();
        while let Some(current) = queue.pop_front() {
            for child in self.children_of(current) {
                if visited.insert(child) {
                    found.push(child);
                    queue.push_back(child);
                }
            }
        }
        found
    }
}
