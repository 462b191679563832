//! Structural equality, hashing and ordering of parts
//!
//! Parts in different graphs can be compared directly. Loops compare by id and are
//! never entered, which keeps every comparison finite over a graph whose only cycles
//! pass through loops. Alternations compare as sets.

use crate::part::Part;
use crate::{NodeId, PartGraph, PartId, Result};
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn target(graph: &PartGraph, node: NodeId) -> Option<PartId> {
    graph.nodes.get(node.index()).copied()
}

/// Whether `a` in `ga` and `b` in `gb` have the same structure
pub fn structural_eq(ga: &PartGraph, a: PartId, gb: &PartGraph, b: PartId) -> bool {
    let (Some(pa), Some(pb)) = (ga.get(a), gb.get(b)) else {
        return false;
    };
    match (pa, pb) {
        (Part::Leaf(x), Part::Leaf(y)) => x.leaf == y.leaf,
        (Part::Loop(x), Part::Loop(y)) => x.id == y.id,
        (Part::Append(x), Part::Append(y)) => {
            x.children.len() == y.children.len()
                && x.children
                    .iter()
                    .zip(&y.children)
                    .all(|(m, n)| nodes_eq(ga, *m, gb, *n))
        }
        (Part::Or(x), Part::Or(y)) => {
            x.children.len() == y.children.len()
                && covers(ga, &x.children, gb, &y.children)
                && covers(gb, &y.children, ga, &x.children)
        }
        (Part::Normalize(x), Part::Normalize(y)) | (Part::SysVar(x), Part::SysVar(y)) => {
            match (x.child, y.child) {
                (None, None) => true,
                (Some(m), Some(n)) => nodes_eq(ga, m, gb, n),
                _ => false,
            }
        }
        _ => false,
    }
}

fn nodes_eq(ga: &PartGraph, m: NodeId, gb: &PartGraph, n: NodeId) -> bool {
    match (target(ga, m), target(gb, n)) {
        (Some(a), Some(b)) => structural_eq(ga, a, gb, b),
        _ => false,
    }
}

/// Every child in `xs` has an equal counterpart in `ys`
fn covers(ga: &PartGraph, xs: &[NodeId], gb: &PartGraph, ys: &[NodeId]) -> bool {
    xs.iter()
        .all(|x| ys.iter().any(|y| nodes_eq(ga, *x, gb, *y)))
}

/// Hash consistent with [`structural_eq`]
pub fn structural_hash(graph: &PartGraph, id: PartId) -> u64 {
    let mut hasher = DefaultHasher::new();
    let Some(part) = graph.get(id) else {
        return hasher.finish();
    };
    part.kind_name().hash(&mut hasher);
    match part {
        Part::Leaf(l) => l.leaf.hash(&mut hasher),
        Part::Loop(l) => l.id.hash(&mut hasher),
        Part::Append(a) => {
            for node in &a.children {
                node_hash(graph, *node).hash(&mut hasher);
            }
        }
        Part::Or(o) => {
            // order independent
            let mut hashes: Vec<u64> = o.children.iter().map(|n| node_hash(graph, *n)).collect();
            hashes.sort_unstable();
            hashes.hash(&mut hasher);
        }
        Part::Normalize(d) | Part::SysVar(d) => {
            d.child.map(|n| node_hash(graph, n)).hash(&mut hasher);
        }
    }
    hasher.finish()
}

fn node_hash(graph: &PartGraph, node: NodeId) -> u64 {
    target(graph, node).map_or(0, |p| structural_hash(graph, p))
}

/// Total order over parts
///
/// Parts of different kinds order by type name. Parts of the same kind order by
/// content; alternation children are sorted before comparing.
pub fn structural_cmp(ga: &PartGraph, a: PartId, gb: &PartGraph, b: PartId) -> Ordering {
    let (pa, pb) = match (ga.get(a), gb.get(b)) {
        (Some(pa), Some(pb)) => (pa, pb),
        (x, y) => return x.is_some().cmp(&y.is_some()),
    };
    match (pa, pb) {
        (Part::Leaf(x), Part::Leaf(y)) => x.leaf.cmp(&y.leaf),
        (Part::Loop(x), Part::Loop(y)) => x.id.cmp(&y.id),
        (Part::Append(x), Part::Append(y)) => cmp_children(ga, &x.children, gb, &y.children),
        (Part::Or(x), Part::Or(y)) => {
            let xs = sorted_children(ga, &x.children);
            let ys = sorted_children(gb, &y.children);
            cmp_children(ga, &xs, gb, &ys)
        }
        (Part::Normalize(x), Part::Normalize(y)) | (Part::SysVar(x), Part::SysVar(y)) => {
            match (x.child, y.child) {
                (Some(m), Some(n)) => cmp_nodes(ga, m, gb, n),
                (m, n) => m.is_some().cmp(&n.is_some()),
            }
        }
        _ => pa
            .type_name()
            .cmp(pb.type_name())
            .then_with(|| pa.kind_name().cmp(pb.kind_name())),
    }
}

fn cmp_nodes(ga: &PartGraph, m: NodeId, gb: &PartGraph, n: NodeId) -> Ordering {
    match (target(ga, m), target(gb, n)) {
        (Some(a), Some(b)) => structural_cmp(ga, a, gb, b),
        (x, y) => x.is_some().cmp(&y.is_some()),
    }
}

fn cmp_children(ga: &PartGraph, xs: &[NodeId], gb: &PartGraph, ys: &[NodeId]) -> Ordering {
    for (x, y) in xs.iter().zip(ys) {
        let ord = cmp_nodes(ga, *x, gb, *y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    xs.len().cmp(&ys.len())
}

fn sorted_children(graph: &PartGraph, children: &[NodeId]) -> Vec<NodeId> {
    let mut sorted = children.to_vec();
    sorted.sort_by(|m, n| cmp_nodes(graph, *m, graph, *n));
    sorted
}

impl PartGraph {
    /// Structural equality of two parts of this graph
    pub fn part_eq(&self, a: PartId, b: PartId) -> Result<bool> {
        self.check_part(a)?;
        self.check_part(b)?;
        Ok(structural_eq(self, a, self, b))
    }

    pub fn part_hash(&self, id: PartId) -> Result<u64> {
        self.check_part(id)?;
        Ok(structural_hash(self, id))
    }

    pub fn part_cmp(&self, a: PartId, b: PartId) -> Result<Ordering> {
        self.check_part(a)?;
        self.check_part(b)?;
        Ok(structural_cmp(self, a, self, b))
    }
}
