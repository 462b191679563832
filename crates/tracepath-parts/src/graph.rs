//! Arena holding the parts and nodes of path expressions

use crate::leaf::{Leaf, Placeholder};
use crate::mutate::ContentIndex;
use crate::part::{AppendPart, DecoratorPart, LeafPart, LoopId, LoopPart, OrPart, Part};
use crate::render::BranchCache;
use crate::{PartError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Index of a part in its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(pub u32);

impl PartId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Index of a node, the edge handle through which a parent holds one child
///
/// Two structurally equal children of one parent always sit behind different nodes, so
/// the node is what identifies a child occurrence for swapping or removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Arena of parts
///
/// Loops reference ancestors by index, so a graph may be cyclic. Serialization writes
/// the arena as two flat tables, which turns every cyclic reference into an explicit
/// index rather than an inline copy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "GraphRepr")]
pub struct PartGraph {
    pub(crate) parts: Vec<Part>,

    /// Part each node points at
    pub(crate) nodes: Vec<PartId>,

    /// Incremented on every mutation of an existing part
    #[serde(skip)]
    pub(crate) generation: u64,

    /// Derived content sets of alternation parts, rebuilt lazily
    #[serde(skip)]
    pub(crate) or_contents: HashMap<PartId, ContentIndex>,

    /// Branch renderings of the current generation
    #[serde(skip)]
    pub(crate) branch_renderings: BranchCache,
}

#[derive(Deserialize)]
struct GraphRepr {
    parts: Vec<Part>,
    nodes: Vec<PartId>,
}

impl TryFrom<GraphRepr> for PartGraph {
    type Error = PartError;

    fn try_from(repr: GraphRepr) -> Result<Self> {
        let graph = PartGraph {
            parts: repr.parts,
            nodes: repr.nodes,
            generation: 0,
            or_contents: HashMap::new(),
            branch_renderings: BranchCache::default(),
        };
        graph.validate()?;
        for part in &graph.parts {
            if let Some(id) = part.loop_id() {
                id.observe();
            }
        }
        Ok(graph)
    }
}

impl PartGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Construction =====

    pub fn leaf(&mut self, leaf: impl Into<Leaf>) -> PartId {
        self.push_part(Part::Leaf(LeafPart::new(leaf.into())))
    }

    /// Sequence of the given children, duplicates kept
    pub fn append(&mut self, children: impl IntoIterator<Item = PartId>) -> Result<PartId> {
        let nodes = self.nodes_for(children)?;
        Ok(self.push_part(Part::Append(AppendPart { children: nodes })))
    }

    /// Alternation of the given children, structurally equal children dropped
    pub fn or(&mut self, children: impl IntoIterator<Item = PartId>) -> Result<PartId> {
        let children: Vec<PartId> = children.into_iter().collect();
        for child in &children {
            self.check_part(*child)?;
        }
        let id = self.push_part(Part::Or(OrPart::default()));
        for child in children {
            self.add(id, child)?;
        }
        Ok(id)
    }

    /// Loop with a fresh id whose body starts at `start`
    pub fn loop_of(&mut self, start: Option<PartId>) -> Result<PartId> {
        let start = start.map(|p| self.node(p)).transpose()?;
        Ok(self.push_part(Part::Loop(LoopPart {
            id: LoopId::fresh(),
            start,
        })))
    }

    pub fn normalize(&mut self, child: Option<PartId>) -> Result<PartId> {
        let child = child.map(|p| self.node(p)).transpose()?;
        Ok(self.push_part(Part::Normalize(DecoratorPart { child })))
    }

    pub fn sys_var(&mut self, child: Option<PartId>) -> Result<PartId> {
        let child = child.map(|p| self.node(p)).transpose()?;
        Ok(self.push_part(Part::SysVar(DecoratorPart { child })))
    }

    /// Create a fresh node pointing at `part`
    pub fn node(&mut self, part: PartId) -> Result<NodeId> {
        self.check_part(part)?;
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(part);
        Ok(id)
    }

    pub(crate) fn push_part(&mut self, part: Part) -> PartId {
        let id = PartId(self.parts.len() as u32);
        self.parts.push(part);
        id
    }

    fn nodes_for(&mut self, children: impl IntoIterator<Item = PartId>) -> Result<Vec<NodeId>> {
        children.into_iter().map(|p| self.node(p)).collect()
    }

    // ===== Access =====

    pub fn get(&self, id: PartId) -> Option<&Part> {
        self.parts.get(id.index())
    }

    pub fn part(&self, id: PartId) -> Result<&Part> {
        self.get(id).ok_or(PartError::UnknownPart(id))
    }

    /// Part a node points at
    pub fn node_part(&self, node: NodeId) -> Result<PartId> {
        self.nodes
            .get(node.index())
            .copied()
            .ok_or(PartError::UnknownNode(node))
    }

    /// Child nodes of a part, in order
    pub fn children(&self, id: PartId) -> Result<&[NodeId]> {
        Ok(self.part(id)?.child_nodes())
    }

    /// Child parts of a part, in order
    pub fn child_parts(&self, id: PartId) -> Result<Vec<PartId>> {
        Ok(self
            .children(id)?
            .iter()
            .map(|n| self.nodes[n.index()])
            .collect())
    }

    pub fn leaf_of(&self, id: PartId) -> Option<&Leaf> {
        self.get(id).and_then(Part::as_leaf)
    }

    /// Placeholder leaf stored at `id`
    pub fn placeholder(&self, id: PartId) -> Result<&Placeholder> {
        self.part(id)?
            .as_leaf()
            .and_then(Leaf::as_placeholder)
            .ok_or(PartError::NotPlaceholder(id))
    }

    /// Get the number of parts in the graph
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Mutation counter, bumped whenever an existing part is rewired
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub(crate) fn check_part(&self, id: PartId) -> Result<()> {
        self.part(id).map(|_| ())
    }

    pub(crate) fn check_node(&self, node: NodeId) -> Result<()> {
        self.node_part(node).map(|_| ())
    }

    /// Verify that every index stored in the graph points inside it
    pub fn validate(&self) -> Result<()> {
        for (i, target) in self.nodes.iter().enumerate() {
            if target.index() >= self.parts.len() {
                return Err(PartError::InvalidGraph(format!(
                    "node n{i} points at missing part {target}"
                )));
            }
        }
        for (i, part) in self.parts.iter().enumerate() {
            for node in part.child_nodes() {
                if node.index() >= self.nodes.len() {
                    return Err(PartError::InvalidGraph(format!(
                        "part p{i} references missing node {node}"
                    )));
                }
            }
        }
        Ok(())
    }

    // ===== Extraction =====

    /// Copy the sub-graph reachable from `root` into a new graph
    ///
    /// Sharing is preserved: a part or node reachable along several paths is copied
    /// once. Loop ids are kept.
    pub fn extract(&self, root: PartId) -> Result<(PartGraph, PartId)> {
        self.check_part(root)?;
        let mut part_map: HashMap<PartId, PartId> = HashMap::new();
        let mut node_map: HashMap<NodeId, NodeId> = HashMap::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([root]);

        while let Some(old) = queue.pop_front() {
            if part_map.contains_key(&old) {
                continue;
            }
            part_map.insert(old, PartId(order.len() as u32));
            order.push(old);
            for node in self.parts[old.index()].child_nodes() {
                let next = NodeId(node_map.len() as u32);
                node_map.entry(*node).or_insert(next);
                queue.push_back(self.nodes[node.index()]);
            }
        }

        let mut nodes = vec![PartId(0); node_map.len()];
        for (old, new) in &node_map {
            nodes[new.index()] = part_map[&self.nodes[old.index()]];
        }

        let parts = order
            .iter()
            .map(|old| {
                let mut part = self.parts[old.index()].clone();
                remap_children(&mut part, &node_map);
                part
            })
            .collect();

        let graph = PartGraph {
            parts,
            nodes,
            generation: 0,
            or_contents: HashMap::new(),
            branch_renderings: BranchCache::default(),
        };
        Ok((graph, part_map[&root]))
    }
}

fn remap_children(part: &mut Part, node_map: &HashMap<NodeId, NodeId>) {
    if let Some(children) = part.child_nodes_mut() {
        for child in children.iter_mut() {
            *child = node_map[child];
        }
    }
    if let Some(Some(child)) = part.single_child_mut() {
        *child = node_map[child];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::Leaf;

    #[test]
    fn test_basic_construction() {
        let mut g = PartGraph::new();
        let a = g.leaf(Leaf::string("a"));
        let b = g.leaf(Leaf::string("b"));
        let app = g.append([a, b, a]).unwrap();

        assert_eq!(g.len(), 3);
        assert_eq!(g.child_parts(app).unwrap(), vec![a, b, a]);
        // each occurrence gets its own node
        let nodes = g.children(app).unwrap();
        assert_ne!(nodes[0], nodes[2]);
    }

    #[test]
    fn test_unknown_ids_rejected() {
        let mut g = PartGraph::new();
        assert!(matches!(g.append([PartId(7)]), Err(PartError::UnknownPart(PartId(7)))));
        assert!(matches!(g.node_part(NodeId(0)), Err(PartError::UnknownNode(_))));
    }

    #[test]
    fn test_or_constructor_dedupes() {
        let mut g = PartGraph::new();
        let a = g.leaf(Leaf::string("a"));
        let a2 = g.leaf(Leaf::string("a"));
        let or = g.or([a, a2]).unwrap();
        assert_eq!(g.children(or).unwrap().len(), 1);
    }

    #[test]
    fn test_extract_keeps_cycle_and_sharing() {
        let mut g = PartGraph::new();
        let unrelated = g.leaf(Leaf::string("zzz"));
        let a = g.leaf(Leaf::string("a"));
        let app = g.append([a, a]).unwrap();
        let lp = g.loop_of(Some(app)).unwrap();
        g.add(app, lp).unwrap();

        let (sub, root) = g.extract(app).unwrap();
        assert_eq!(sub.len(), 3);
        assert!(sub.get(PartId(unrelated.0 + 10)).is_none());
        let kids = sub.child_parts(root).unwrap();
        assert_eq!(kids[0], kids[1]);
        let inner_loop = kids[2];
        assert_eq!(sub.part(inner_loop).unwrap().loop_id(), g.part(lp).unwrap().loop_id());
        assert_eq!(sub.child_parts(inner_loop).unwrap(), vec![root]);
        sub.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_dangling_node() {
        let json = r#"{"parts":[{"type":"Append","children":[3]}],"nodes":[]}"#;
        let err = serde_json::from_str::<PartGraph>(json).unwrap_err();
        assert!(err.to_string().contains("missing node"));
    }
}
