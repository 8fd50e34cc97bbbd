//! Arena-backed graph store for names, usages and their relations.
//!
//! # Responsibility
//! - Own every Name and Usage node of one dataset in a dense slot arena.
//! - Maintain per-relation outgoing/incoming multimaps over edge ids.
//! - Provide the mutation primitives the normalizer passes are built on.
//!
//! # Invariants
//! - A removed node leaves a vacant slot; its `NodeId` is never reused.
//! - Adjacency lists keep insertion order, which makes every scan
//!   deterministic for the same input.
//! - Name and usage ids are unique within the store.

use crate::model::issue::Issue;
use crate::model::name::{Name, HYBRID_MARKER};
use crate::model::rank::Rank;
use crate::model::usage::{Usage, UsageKind};
use crate::model::verbatim::VerbatimKey;
use log::{debug, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Dense index of a node slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Dense index of an edge slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(u32);

impl Display for EdgeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "edge#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Name,
    Usage,
    Taxon,
    Synonym,
    /// Taxon without a parent, set by [`GraphStore::sync_roots`].
    Root,
}

impl Label {
    fn bit(self) -> u8 {
        match self {
            Self::Name => 1,
            Self::Usage => 1 << 1,
            Self::Taxon => 1 << 2,
            Self::Synonym => 1 << 3,
            Self::Root => 1 << 4,
        }
    }
}

/// Small label bitset of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Labels(u8);

impl Labels {
    pub fn of(labels: &[Label]) -> Self {
        let mut set = Self::default();
        for label in labels {
            set.insert(*label);
        }
        set
    }

    pub fn contains(self, label: Label) -> bool {
        self.0 & label.bit() != 0
    }

    pub fn insert(&mut self, label: Label) {
        self.0 |= label.bit();
    }

    pub fn remove(&mut self, label: Label) {
        self.0 &= !label.bit();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelType {
    /// Usage -> Name.
    HasName,
    /// Taxon -> Taxon.
    ParentOf,
    /// Usage(synonym) -> Usage(taxon).
    SynonymOf,
    /// Name -> Name, from the later combination to its original name.
    HasBasionym,
    SpellingCorrectionOf,
    BasedOn,
    ReplacementName,
    Conserved,
    LaterHomonym,
    Superfluous,
}

impl RelType {
    pub const ALL: [RelType; 10] = [
        Self::HasName,
        Self::ParentOf,
        Self::SynonymOf,
        Self::HasBasionym,
        Self::SpellingCorrectionOf,
        Self::BasedOn,
        Self::ReplacementName,
        Self::Conserved,
        Self::LaterHomonym,
        Self::Superfluous,
    ];

    /// Nomenclatural relations between two name nodes.
    pub const NAME_RELATIONS: [RelType; 7] = [
        Self::HasBasionym,
        Self::SpellingCorrectionOf,
        Self::BasedOn,
        Self::ReplacementName,
        Self::Conserved,
        Self::LaterHomonym,
        Self::Superfluous,
    ];

    fn index(self) -> usize {
        match self {
            Self::HasName => 0,
            Self::ParentOf => 1,
            Self::SynonymOf => 2,
            Self::HasBasionym => 3,
            Self::SpellingCorrectionOf => 4,
            Self::BasedOn => 5,
            Self::ReplacementName => 6,
            Self::Conserved => 7,
            Self::LaterHomonym => 8,
            Self::Superfluous => 9,
        }
    }

    pub fn is_name_relation(self) -> bool {
        Self::NAME_RELATIONS.contains(&self)
    }
}

impl Display for RelType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            Self::HasName => "HAS_NAME",
            Self::ParentOf => "PARENT_OF",
            Self::SynonymOf => "SYNONYM_OF",
            Self::HasBasionym => "HAS_BASIONYM",
            Self::SpellingCorrectionOf => "SPELLING_CORRECTION_OF",
            Self::BasedOn => "BASED_ON",
            Self::ReplacementName => "REPLACEMENT_NAME",
            Self::Conserved => "CONSERVED",
            Self::LaterHomonym => "LATER_HOMONYM",
            Self::Superfluous => "SUPERFLUOUS",
        };
        f.write_str(value)
    }
}

/// One directed relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub rel: RelType,
    /// Only used by name relations.
    pub note: Option<String>,
    /// Only used by name relations.
    pub reference_id: Option<String>,
}

impl Edge {
    /// Whether the relation carries more than its two endpoints.
    pub fn is_rich(&self) -> bool {
        self.note.is_some() || self.reference_id.is_some()
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Graph store errors. All of them indicate a broken graph invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NodeNotFound(NodeId),
    /// Node exists but is not of the expected kind.
    WrongNodeKind {
        node: NodeId,
        expected: &'static str,
    },
    /// An id was inserted twice.
    NotUnique {
        entity: &'static str,
        id: String,
    },
    /// A taxon holds more than one differing parent.
    MultipleParents(NodeId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(node) => write!(f, "graph node not found: {node}"),
            Self::WrongNodeKind { node, expected } => {
                write!(f, "graph node {node} is not a {expected} node")
            }
            Self::NotUnique { entity, id } => write!(f, "{entity} id values not unique: {id}"),
            Self::MultipleParents(node) => write!(f, "{node} has multiple parents"),
        }
    }
}

impl Error for StoreError {}

#[derive(Debug, Clone)]
enum NodeData {
    Name(Name),
    Usage(Usage),
}

#[derive(Debug, Clone)]
struct NodeSlot {
    labels: Labels,
    data: NodeData,
}

#[derive(Debug, Clone, Default)]
struct Adjacency {
    outgoing: HashMap<NodeId, Vec<EdgeId>>,
    incoming: HashMap<NodeId, Vec<EdgeId>>,
}

/// In-memory graph of one dataset.
#[derive(Debug, Clone)]
pub struct GraphStore {
    nodes: Vec<Option<NodeSlot>>,
    edges: Vec<Option<Edge>>,
    adjacency: Vec<Adjacency>,
    name_ids: HashMap<String, NodeId>,
    usage_ids: HashMap<String, NodeId>,
    scientific_names: HashMap<String, Vec<NodeId>>,
    id_sequence: u64,
    live_nodes: usize,
    live_edges: usize,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            adjacency: RelType::ALL.iter().map(|_| Adjacency::default()).collect(),
            name_ids: HashMap::new(),
            usage_ids: HashMap::new(),
            scientific_names: HashMap::new(),
            id_sequence: 0,
            live_nodes: 0,
            live_edges: 0,
        }
    }

    pub fn node_count(&self) -> usize {
        self.live_nodes
    }

    pub fn edge_count(&self) -> usize {
        self.live_edges
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.slot(node).is_some()
    }

    // ---------------------------------------------------------------------
    // node creation
    // ---------------------------------------------------------------------

    /// Creates a name node plus a usage node linked by `HasName`.
    ///
    /// Returns `(name_node, usage_node)`.
    ///
    /// # Errors
    /// - `NotUnique` when the name or usage id already exists.
    pub fn create_name_and_usage(
        &mut self,
        name: Name,
        usage: Usage,
    ) -> StoreResult<(NodeId, NodeId)> {
        if let Some(id) = name.id.as_deref() {
            if self.name_ids.contains_key(id) {
                return Err(StoreError::NotUnique {
                    entity: "name",
                    id: id.to_string(),
                });
            }
        }
        self.ensure_usage_id_free(&usage)?;
        let name_node = self.push_name(name);
        let usage_node = self.push_usage(usage);
        self.relate(usage_node, name_node, RelType::HasName)?;
        Ok((name_node, usage_node))
    }

    /// Creates another usage for an existing name node.
    pub fn create_usage(&mut self, name_node: NodeId, usage: Usage) -> StoreResult<NodeId> {
        self.name(name_node).ok_or(StoreError::WrongNodeKind {
            node: name_node,
            expected: "name",
        })?;
        self.ensure_usage_id_free(&usage)?;
        let usage_node = self.push_usage(usage);
        self.relate(usage_node, name_node, RelType::HasName)?;
        Ok(usage_node)
    }

    /// Returns a fresh id for nodes created by the store's callers, e.g. `~3`.
    pub fn next_id(&mut self) -> String {
        loop {
            self.id_sequence += 1;
            let candidate = format!("~{}", self.id_sequence);
            if !self.name_ids.contains_key(&candidate) && !self.usage_ids.contains_key(&candidate)
            {
                return candidate;
            }
        }
    }

    fn ensure_usage_id_free(&self, usage: &Usage) -> StoreResult<()> {
        match usage.id.as_deref() {
            Some(id) if self.usage_ids.contains_key(id) => Err(StoreError::NotUnique {
                entity: "usage",
                id: id.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn push_name(&mut self, name: Name) -> NodeId {
        let node = self.next_node_id();
        if let Some(id) = name.id.clone() {
            self.name_ids.insert(id, node);
        }
        if let Some(scientific_name) = name.scientific_name.clone() {
            self.scientific_names
                .entry(scientific_name)
                .or_default()
                .push(node);
        }
        self.nodes.push(Some(NodeSlot {
            labels: Labels::of(&[Label::Name]),
            data: NodeData::Name(name),
        }));
        self.live_nodes += 1;
        node
    }

    fn push_usage(&mut self, usage: Usage) -> NodeId {
        let node = self.next_node_id();
        if let Some(id) = usage.id.clone() {
            self.usage_ids.insert(id, node);
        }
        let kind_label = match usage.kind {
            UsageKind::Taxon => Label::Taxon,
            UsageKind::Synonym => Label::Synonym,
        };
        self.nodes.push(Some(NodeSlot {
            labels: Labels::of(&[Label::Usage, kind_label]),
            data: NodeData::Usage(usage),
        }));
        self.live_nodes += 1;
        node
    }

    fn next_node_id(&self) -> NodeId {
        NodeId(self.nodes.len() as u32)
    }

    // ---------------------------------------------------------------------
    // labels
    // ---------------------------------------------------------------------

    pub fn labels(&self, node: NodeId) -> Labels {
        self.slot(node).map(|slot| slot.labels).unwrap_or_default()
    }

    pub fn has_label(&self, node: NodeId, label: Label) -> bool {
        self.labels(node).contains(label)
    }

    /// Snapshot of all live nodes carrying `label`, in slot order.
    pub fn nodes_with_label(&self, label: Label) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Some(slot) if slot.labels.contains(label) => Some(NodeId(index as u32)),
                _ => None,
            })
            .collect()
    }

    /// Next chunk of at most `limit` nodes with `label`, starting at slot
    /// `*cursor`. Advances the cursor past the last scanned slot.
    pub(crate) fn next_batch(&self, label: Label, cursor: &mut usize, limit: usize) -> Vec<NodeId> {
        let mut batch = Vec::with_capacity(limit.min(1024));
        while *cursor < self.nodes.len() && batch.len() < limit {
            if let Some(slot) = &self.nodes[*cursor] {
                if slot.labels.contains(label) {
                    batch.push(NodeId(*cursor as u32));
                }
            }
            *cursor += 1;
        }
        batch
    }

    /// Marks every taxon without a parent as `Root` and clears stale marks.
    ///
    /// Returns the number of roots.
    pub fn sync_roots(&mut self) -> usize {
        let mut roots = 0;
        for index in 0..self.nodes.len() {
            let node = NodeId(index as u32);
            let is_root = self.has_label(node, Label::Taxon)
                && self.in_degree(node, RelType::ParentOf) == 0;
            if let Some(slot) = self.nodes[index].as_mut() {
                if is_root {
                    slot.labels.insert(Label::Root);
                    roots += 1;
                } else {
                    slot.labels.remove(Label::Root);
                }
            }
        }
        roots
    }

    // ---------------------------------------------------------------------
    // typed access
    // ---------------------------------------------------------------------

    pub fn name(&self, node: NodeId) -> Option<&Name> {
        match self.slot(node).map(|slot| &slot.data) {
            Some(NodeData::Name(name)) => Some(name),
            _ => None,
        }
    }

    pub fn usage(&self, node: NodeId) -> Option<&Usage> {
        match self.slot(node).map(|slot| &slot.data) {
            Some(NodeData::Usage(usage)) => Some(usage),
            _ => None,
        }
    }

    /// Mutable usage access. Ids must not be changed through it.
    pub fn usage_mut(&mut self, node: NodeId) -> Option<&mut Usage> {
        match self.nodes.get_mut(node.index()).and_then(Option::as_mut) {
            Some(NodeSlot {
                data: NodeData::Usage(usage),
                ..
            }) => Some(usage),
            _ => None,
        }
    }

    /// Applies `update` to a name and keeps the scientific name index in sync.
    pub fn update_name(
        &mut self,
        node: NodeId,
        update: impl FnOnce(&mut Name),
    ) -> StoreResult<()> {
        let slot = self
            .nodes
            .get_mut(node.index())
            .and_then(Option::as_mut)
            .ok_or(StoreError::NodeNotFound(node))?;
        let NodeData::Name(name) = &mut slot.data else {
            return Err(StoreError::WrongNodeKind {
                node,
                expected: "name",
            });
        };
        let before = name.scientific_name.clone();
        update(name);
        let after = name.scientific_name.clone();
        if before != after {
            if let Some(before) = before {
                self.unindex_scientific_name(&before, node);
            }
            if let Some(after) = after {
                self.scientific_names.entry(after).or_default().push(node);
            }
        }
        Ok(())
    }

    pub fn name_node_by_id(&self, id: &str) -> Option<NodeId> {
        self.name_ids.get(id).copied()
    }

    pub fn usage_node_by_id(&self, id: &str) -> Option<NodeId> {
        self.usage_ids.get(id).copied()
    }

    pub fn usage_by_id(&self, id: &str) -> Option<&Usage> {
        self.usage_node_by_id(id).and_then(|node| self.usage(node))
    }

    pub fn name_by_id(&self, id: &str) -> Option<&Name> {
        self.name_node_by_id(id).and_then(|node| self.name(node))
    }

    /// Name node a usage points to.
    pub fn name_node_of(&self, usage: NodeId) -> Option<NodeId> {
        self.targets(usage, RelType::HasName).first().copied()
    }

    pub fn name_of_usage(&self, usage: NodeId) -> Option<&Name> {
        self.name_node_of(usage).and_then(|node| self.name(node))
    }

    /// Rank of the name a usage points to; missing ranks count as unranked.
    pub fn usage_rank(&self, usage: NodeId) -> Rank {
        self.name_of_usage(usage)
            .map_or(Rank::Unranked, Name::rank_or_unranked)
    }

    pub fn usages_of_name(&self, name_node: NodeId) -> Vec<NodeId> {
        self.sources(name_node, RelType::HasName)
    }

    /// Label used in log lines: scientific name with authorship, or the id.
    pub fn usage_label(&self, usage: NodeId) -> String {
        match self.name_of_usage(usage) {
            Some(name) => name.label(),
            None => self
                .usage(usage)
                .and_then(|usage| usage.id.clone())
                .unwrap_or_else(|| usage.to_string()),
        }
    }

    /// Usage nodes whose name matches `scientific_name` exactly.
    ///
    /// Also finds the named-hybrid form of a monomial. With `rank` given,
    /// keeps names of that rank, plus unranked names if `include_unranked`.
    /// Results are sorted by node id.
    pub fn usages_by_name(
        &self,
        scientific_name: &str,
        authorship: Option<&str>,
        rank: Option<Rank>,
        include_unranked: bool,
    ) -> Vec<NodeId> {
        let mut name_nodes: Vec<NodeId> = self
            .scientific_names
            .get(scientific_name)
            .cloned()
            .unwrap_or_default();
        if !scientific_name.starts_with(HYBRID_MARKER) {
            if let Some(hybrids) = self
                .scientific_names
                .get(&format!("{HYBRID_MARKER} {scientific_name}"))
            {
                name_nodes.extend(hybrids.iter().copied());
            }
        }

        let mut usages: Vec<NodeId> = name_nodes
            .into_iter()
            .filter(|node| {
                let Some(name) = self.name(*node) else {
                    return false;
                };
                if let Some(authorship) = authorship {
                    if name.authorship.as_deref() != Some(authorship) {
                        return false;
                    }
                }
                match rank {
                    None => true,
                    Some(rank) => {
                        let current = name.rank_or_unranked();
                        current == rank || (include_unranked && current == Rank::Unranked)
                    }
                }
            })
            .flat_map(|node| self.usages_of_name(node))
            .collect();
        usages.sort();
        usages.dedup();
        usages
    }

    // ---------------------------------------------------------------------
    // issues
    // ---------------------------------------------------------------------

    /// Adds an issue to a usage. Returns the raw record key to flag, if any.
    pub fn add_usage_issue(&mut self, node: NodeId, issue: Issue) -> Option<VerbatimKey> {
        let usage = self.usage_mut(node)?;
        usage.issues.insert(issue);
        usage.verbatim_key
    }

    /// Adds an issue to a name. Returns the raw record key to flag, if any.
    pub fn add_name_issue(&mut self, node: NodeId, issue: Issue) -> Option<VerbatimKey> {
        let slot = self.nodes.get_mut(node.index()).and_then(Option::as_mut)?;
        match &mut slot.data {
            NodeData::Name(name) => {
                name.issues.insert(issue);
                name.verbatim_key
            }
            NodeData::Usage(_) => None,
        }
    }

    // ---------------------------------------------------------------------
    // relations
    // ---------------------------------------------------------------------

    /// Creates a plain relation between two live nodes.
    pub fn relate(&mut self, from: NodeId, to: NodeId, rel: RelType) -> StoreResult<EdgeId> {
        self.push_edge(Edge {
            from,
            to,
            rel,
            note: None,
            reference_id: None,
        })
    }

    /// Creates a nomenclatural relation between two name nodes.
    pub fn create_name_rel(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel: RelType,
        note: Option<String>,
        reference_id: Option<String>,
    ) -> StoreResult<EdgeId> {
        for node in [from, to] {
            if self.name(node).is_none() || !rel.is_name_relation() {
                return Err(StoreError::WrongNodeKind {
                    node,
                    expected: "name",
                });
            }
        }
        self.push_edge(Edge {
            from,
            to,
            rel,
            note,
            reference_id,
        })
    }

    fn push_edge(&mut self, edge: Edge) -> StoreResult<EdgeId> {
        for node in [edge.from, edge.to] {
            if !self.contains(node) {
                return Err(StoreError::NodeNotFound(node));
            }
        }
        let id = EdgeId(self.edges.len() as u32);
        let adjacency = &mut self.adjacency[edge.rel.index()];
        adjacency.outgoing.entry(edge.from).or_default().push(id);
        adjacency.incoming.entry(edge.to).or_default().push(id);
        self.edges.push(Some(edge));
        self.live_edges += 1;
        Ok(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Deletes one edge. Returns the removed edge, if it was still live.
    pub fn delete_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let edge = self.edges.get_mut(id.0 as usize)?.take()?;
        let adjacency = &mut self.adjacency[edge.rel.index()];
        if let Some(list) = adjacency.outgoing.get_mut(&edge.from) {
            list.retain(|candidate| *candidate != id);
        }
        if let Some(list) = adjacency.incoming.get_mut(&edge.to) {
            list.retain(|candidate| *candidate != id);
        }
        self.live_edges -= 1;
        Some(edge)
    }

    pub fn outgoing(&self, node: NodeId, rel: RelType) -> Vec<EdgeId> {
        self.adjacency[rel.index()]
            .outgoing
            .get(&node)
            .cloned()
            .unwrap_or_default()
    }

    pub fn incoming(&self, node: NodeId, rel: RelType) -> Vec<EdgeId> {
        self.adjacency[rel.index()]
            .incoming
            .get(&node)
            .cloned()
            .unwrap_or_default()
    }

    /// End nodes of the outgoing `rel` edges, in insertion order.
    pub fn targets(&self, node: NodeId, rel: RelType) -> Vec<NodeId> {
        self.adjacency[rel.index()]
            .outgoing
            .get(&node)
            .map(|edges| {
                edges
                    .iter()
                    .filter_map(|edge| self.edge(*edge).map(|edge| edge.to))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Start nodes of the incoming `rel` edges, in insertion order.
    pub fn sources(&self, node: NodeId, rel: RelType) -> Vec<NodeId> {
        self.adjacency[rel.index()]
            .incoming
            .get(&node)
            .map(|edges| {
                edges
                    .iter()
                    .filter_map(|edge| self.edge(*edge).map(|edge| edge.from))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn out_degree(&self, node: NodeId, rel: RelType) -> usize {
        self.adjacency[rel.index()]
            .outgoing
            .get(&node)
            .map_or(0, Vec::len)
    }

    pub fn in_degree(&self, node: NodeId, rel: RelType) -> usize {
        self.adjacency[rel.index()]
            .incoming
            .get(&node)
            .map_or(0, Vec::len)
    }

    /// First live `rel` edge from `from` to `to`.
    pub fn find_edge(&self, from: NodeId, to: NodeId, rel: RelType) -> Option<EdgeId> {
        self.adjacency[rel.index()]
            .outgoing
            .get(&from)?
            .iter()
            .copied()
            .find(|edge| self.edge(*edge).is_some_and(|edge| edge.to == to))
    }

    /// Makes `parent` the single parent of `child`.
    ///
    /// A `None` parent and self-parenting are ignored. An existing different
    /// parent is replaced.
    ///
    /// # Errors
    /// - `MultipleParents` when `child` already holds more than one parent
    ///   other than `parent`.
    pub fn assign_parent(&mut self, parent: Option<NodeId>, child: NodeId) -> StoreResult<()> {
        let Some(parent) = parent else {
            return Ok(());
        };
        if parent == child {
            return Ok(());
        }

        let mut linked = false;
        let mut previous: Option<(EdgeId, NodeId)> = None;
        for edge_id in self.incoming(child, RelType::ParentOf) {
            let Some(edge) = self.edge(edge_id) else {
                continue;
            };
            if edge.from == parent {
                linked = true;
            } else if previous.is_some() {
                return Err(StoreError::MultipleParents(child));
            } else {
                previous = Some((edge_id, edge.from));
            }
        }

        if let Some((edge_id, old_parent)) = previous {
            self.delete_edge(edge_id);
            warn!(
                "event=assign_parent module=graph status=override child={} old_parent={} new_parent={}",
                self.usage_label(child),
                self.usage_label(old_parent),
                self.usage_label(parent)
            );
        }
        if !linked {
            self.relate(parent, child, RelType::ParentOf)?;
        }
        Ok(())
    }

    /// Links a synonym to an accepted usage.
    ///
    /// Returns `false` without linking when both usages share one name node.
    /// An existing identical relation is kept and not duplicated.
    pub fn create_synonym_rel(&mut self, synonym: NodeId, accepted: NodeId) -> StoreResult<bool> {
        let synonym_name = self.name_node_of(synonym);
        if synonym_name.is_some() && synonym_name == self.name_node_of(accepted) {
            debug!(
                "event=synonym_rel module=graph status=skipped reason=same_name synonym={synonym}"
            );
            return Ok(false);
        }
        if self.find_edge(synonym, accepted, RelType::SynonymOf).is_none() {
            self.relate(synonym, accepted, RelType::SynonymOf)?;
        }
        Ok(true)
    }

    /// Removes a node with all of its relations.
    ///
    /// Returns the number of relations deleted.
    pub fn remove(&mut self, node: NodeId) -> StoreResult<usize> {
        if !self.contains(node) {
            return Err(StoreError::NodeNotFound(node));
        }
        let mut deleted = 0;
        for rel in RelType::ALL {
            let mut edges = self.outgoing(node, rel);
            edges.extend(self.incoming(node, rel));
            for edge in edges {
                if self.delete_edge(edge).is_some() {
                    deleted += 1;
                }
            }
            let adjacency = &mut self.adjacency[rel.index()];
            adjacency.outgoing.remove(&node);
            adjacency.incoming.remove(&node);
        }

        if let Some(slot) = self.nodes[node.index()].take() {
            match slot.data {
                NodeData::Name(name) => {
                    if let Some(id) = name.id {
                        self.name_ids.remove(&id);
                    }
                    if let Some(scientific_name) = name.scientific_name {
                        self.unindex_scientific_name(&scientific_name, node);
                    }
                }
                NodeData::Usage(usage) => {
                    if let Some(id) = usage.id {
                        self.usage_ids.remove(&id);
                    }
                }
            }
            self.live_nodes -= 1;
        }
        Ok(deleted)
    }

    fn unindex_scientific_name(&mut self, scientific_name: &str, node: NodeId) {
        if let Some(nodes) = self.scientific_names.get_mut(scientific_name) {
            nodes.retain(|candidate| *candidate != node);
            if nodes.is_empty() {
                self.scientific_names.remove(scientific_name);
            }
        }
    }

    fn slot(&self, node: NodeId) -> Option<&NodeSlot> {
        self.nodes.get(node.index()).and_then(Option::as_ref)
    }
}
