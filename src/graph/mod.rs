//! Graph Builder: derives the entity graph, operation multigraph,
//! operation DAG, and hierarchy forest from the registry. Deterministic
//! and side-effect-free — building the graph never fails on semantic
//! problems (missing references, cycles); it produces the graph as-is and
//! defers judgment to the validator.

pub mod builder;
pub mod export;

use std::collections::BTreeMap;

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::model::Cardinality;

pub const EMPTY_NODE: &str = "\u{2205}";

#[derive(Debug, Clone)]
pub struct RelationEdge {
    pub field_name: String,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpGraphNode {
    Entity(String),
    Empty,
}

impl OpGraphNode {
    pub fn id(&self) -> &str {
        match self {
            OpGraphNode::Entity(name) => name,
            OpGraphNode::Empty => EMPTY_NODE,
        }
    }
}

pub enum HierarchyEntry {
    Flow(HierarchyNode),
    Leaf(String),
}

#[derive(Default)]
pub struct HierarchyNode {
    pub children: IndexMap<String, HierarchyEntry>,
}

#[derive(Default)]
pub struct HierarchyForest {
    pub roots: IndexMap<String, HierarchyEntry>,
}

impl HierarchyForest {
    pub fn insert(&mut self, operation_name: &str) {
        let segments: Vec<&str> = operation_name.split('.').collect();
        insert_path(&mut self.roots, &segments, operation_name);
    }

    /// Leaves whose full dotted name begins with `prefix` (prefix may or
    /// may not itself be a registered operation).
    pub fn operations_in_flow<'a>(&self, all_names: &'a [String], prefix: &str) -> Vec<&'a str> {
        all_names
            .iter()
            .filter(|name| name.as_str() == prefix || name.starts_with(&format!("{prefix}.")))
            .map(|s| s.as_str())
            .collect()
    }
}

fn insert_path(level: &mut IndexMap<String, HierarchyEntry>, segments: &[&str], full_name: &str) {
    match segments {
        [] => {}
        [leaf] => {
            level.insert(leaf.to_string(), HierarchyEntry::Leaf(full_name.to_string()));
        }
        [head, rest @ ..] => {
            let entry = level
                .entry(head.to_string())
                .or_insert_with(|| HierarchyEntry::Flow(HierarchyNode::default()));
            match entry {
                HierarchyEntry::Flow(node) => insert_path(&mut node.children, rest, full_name),
                HierarchyEntry::Leaf(_) => {
                    // An operation name collides with a flow prefix used
                    // elsewhere; promote it to a flow so descendants still
                    // attach. This can only happen with malformed input
                    // that the validator will separately flag.
                    let mut promoted = HierarchyNode::default();
                    insert_path(&mut promoted.children, rest, full_name);
                    *entry = HierarchyEntry::Flow(promoted);
                }
            }
        }
    }
}

pub struct Graph {
    pub entity_graph: DiGraph<String, RelationEdge>,
    entity_index: IndexMap<String, NodeIndex>,

    pub operation_multigraph: DiGraph<OpGraphNode, String>,
    multigraph_index: IndexMap<String, NodeIndex>,

    pub operation_dag: DiGraph<String, Vec<String>>,
    operation_index: IndexMap<String, NodeIndex>,

    pub hierarchy: HierarchyForest,

    /// Registration order of operations, used as the topological-sort
    /// tie-break.
    operation_order: IndexMap<String, usize>,
}

impl Graph {
    pub fn entity_node(&self, name: &str) -> Option<NodeIndex> {
        self.entity_index.get(name).copied()
    }

    pub fn operation_node(&self, name: &str) -> Option<NodeIndex> {
        self.operation_index.get(name).copied()
    }

    /// Returns a sequence respecting the OperationDAG's dependency order;
    /// ties are broken by operation registration order (stable).
    pub fn topological_order(&self) -> Vec<String> {
        let mut in_degree: BTreeMap<NodeIndex, usize> = BTreeMap::new();
        for idx in self.operation_dag.node_indices() {
            in_degree.insert(idx, 0);
        }
        for edge in self.operation_dag.edge_references() {
            *in_degree.entry(edge.target()).or_insert(0) += 1;
        }

        let mut ready: Vec<NodeIndex> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(idx, _)| *idx)
            .collect();
        sort_by_registration_order(&mut ready, &self.operation_dag, &self.operation_order);

        let mut order = Vec::new();
        while !ready.is_empty() {
            let mut next_ready = Vec::new();
            ready.sort_by_key(|idx| {
                registration_rank(&self.operation_dag, &self.operation_order, *idx)
            });
            for node in ready.drain(..) {
                order.push(self.operation_dag[node].clone());
                for edge in self.operation_dag.edges_directed(node, Direction::Outgoing) {
                    let target = edge.target();
                    let degree = in_degree.get_mut(&target).unwrap();
                    *degree -= 1;
                    if *degree == 0 {
                        next_ready.push(target);
                    }
                }
            }
            sort_by_registration_order(&mut next_ready, &self.operation_dag, &self.operation_order);
            ready = next_ready;
        }
        order
    }

    /// Each returned set contains operations whose dependencies all appear
    /// in earlier sets; drives workflow-synthesizer concurrency grouping.
    pub fn parallel_levels(&self) -> Vec<Vec<String>> {
        let mut in_degree: BTreeMap<NodeIndex, usize> = BTreeMap::new();
        for idx in self.operation_dag.node_indices() {
            in_degree.insert(idx, 0);
        }
        for edge in self.operation_dag.edge_references() {
            *in_degree.entry(edge.target()).or_insert(0) += 1;
        }

        let mut frontier: Vec<NodeIndex> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(idx, _)| *idx)
            .collect();
        sort_by_registration_order(&mut frontier, &self.operation_dag, &self.operation_order);

        let mut levels = Vec::new();
        while !frontier.is_empty() {
            let mut level: Vec<String> = frontier
                .iter()
                .map(|idx| self.operation_dag[*idx].clone())
                .collect();
            level.sort_by_key(|name| self.operation_order.get(name).copied().unwrap_or(usize::MAX));

            let mut next_frontier = Vec::new();
            for node in &frontier {
                for edge in self.operation_dag.edges_directed(*node, Direction::Outgoing) {
                    let target = edge.target();
                    let degree = in_degree.get_mut(&target).unwrap();
                    *degree -= 1;
                    if *degree == 0 {
                        next_frontier.push(target);
                    }
                }
            }
            sort_by_registration_order(&mut next_frontier, &self.operation_dag, &self.operation_order);
            levels.push(level);
            frontier = next_frontier;
        }
        levels
    }

    /// `parallel_levels`, restricted to the given operation names — edges
    /// leaving the subset are ignored, so an operation whose only
    /// dependency lives outside `names` is treated as already satisfied.
    /// Used by the workflow synthesizer to group a single flow's children.
    pub fn parallel_levels_within(&self, names: &[String]) -> Vec<Vec<String>> {
        let subset: std::collections::HashSet<&str> = names.iter().map(|s| s.as_str()).collect();
        let nodes: Vec<NodeIndex> = names
            .iter()
            .filter_map(|name| self.operation_index.get(name).copied())
            .collect();

        let mut in_degree: BTreeMap<NodeIndex, usize> =
            nodes.iter().map(|idx| (*idx, 0)).collect();
        for &idx in &nodes {
            for edge in self.operation_dag.edges_directed(idx, Direction::Incoming) {
                if subset.contains(self.operation_dag[edge.source()].as_str()) {
                    *in_degree.entry(idx).or_insert(0) += 1;
                }
            }
        }

        let mut frontier: Vec<NodeIndex> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(idx, _)| *idx)
            .collect();
        sort_by_registration_order(&mut frontier, &self.operation_dag, &self.operation_order);

        let mut levels = Vec::new();
        let mut remaining = in_degree;
        while !frontier.is_empty() {
            let mut level: Vec<String> = frontier
                .iter()
                .map(|idx| self.operation_dag[*idx].clone())
                .collect();
            level.sort_by_key(|name| self.operation_order.get(name).copied().unwrap_or(usize::MAX));

            let mut next_frontier = Vec::new();
            for &node in &frontier {
                for edge in self.operation_dag.edges_directed(node, Direction::Outgoing) {
                    let target = edge.target();
                    if !subset.contains(self.operation_dag[target].as_str()) {
                        continue;
                    }
                    let degree = remaining.get_mut(&target).unwrap();
                    *degree -= 1;
                    if *degree == 0 {
                        next_frontier.push(target);
                    }
                }
            }
            sort_by_registration_order(&mut next_frontier, &self.operation_dag, &self.operation_order);
            levels.push(level);
            frontier = next_frontier;
        }
        levels
    }

    /// Detects a cycle in the OperationDAG, if any, returning the node
    /// names participating in one cycle (not necessarily all cycles).
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        use petgraph::algo::kosaraju_scc;
        for component in kosaraju_scc(&self.operation_dag) {
            if component.len() > 1 {
                return Some(
                    component
                        .into_iter()
                        .map(|idx| self.operation_dag[idx].clone())
                        .collect(),
                );
            }
            // A single-node strongly connected component is still a cycle
            // if it has a self-loop.
            let idx = component[0];
            if self
                .operation_dag
                .edges_directed(idx, Direction::Outgoing)
                .any(|edge| edge.target() == idx)
            {
                return Some(vec![self.operation_dag[idx].clone()]);
            }
        }
        None
    }

    pub fn operations_in_flow(&self, all_names: &[String], prefix: &str) -> Vec<String> {
        self.hierarchy
            .operations_in_flow(all_names, prefix)
            .into_iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Entity names read by `op_name` per the operation multigraph (the
    /// synthetic `∅` node is excluded; an empty-reads operation yields an
    /// empty vector here).
    pub fn entities_read_by(&self, op_name: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .operation_multigraph
            .edge_references()
            .filter(|edge| edge.weight().as_str() == op_name)
            .filter_map(|edge| match &self.operation_multigraph[edge.source()] {
                OpGraphNode::Entity(name) => Some(name.clone()),
                OpGraphNode::Empty => None,
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Entity names written by `op_name`; see `entities_read_by`.
    pub fn entities_written_by(&self, op_name: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .operation_multigraph
            .edge_references()
            .filter(|edge| edge.weight().as_str() == op_name)
            .filter_map(|edge| match &self.operation_multigraph[edge.target()] {
                OpGraphNode::Entity(name) => Some(name.clone()),
                OpGraphNode::Empty => None,
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

fn registration_rank(
    dag: &DiGraph<String, Vec<String>>,
    order: &IndexMap<String, usize>,
    idx: NodeIndex,
) -> usize {
    order.get(&dag[idx]).copied().unwrap_or(usize::MAX)
}

fn sort_by_registration_order(
    nodes: &mut [NodeIndex],
    dag: &DiGraph<String, Vec<String>>,
    order: &IndexMap<String, usize>,
) {
    nodes.sort_by_key(|idx| registration_rank(dag, order, *idx));
}
