//! Traversals over a part graph
//!
//! [`PartIter`] walks breadth-first or depth-first and yields every reached part
//! together with the parent and the node that led to it. Loop bodies are skipped
//! unless requested; descending into them turns on visit-once bookkeeping so the walk
//! ends.
//!
//! [`PostOrderIter`] yields children before parents and never enters loops. A branch
//! reached a second time through a cycle that bypasses every loop is yielded at that
//! point, before all of its descendants have been seen. This keeps the walk finite on
//! malformed graphs at the cost of a strict post-order there.

use crate::{NodeId, PartGraph, PartId};
use std::collections::{HashSet, VecDeque};

/// One step of a traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Visit {
    /// `None` for the root
    pub parent: Option<PartId>,
    /// Node through which the part was reached, `None` for the root
    pub node: Option<NodeId>,
    pub part: PartId,
}

impl Visit {
    fn root(part: PartId) -> Self {
        Self {
            parent: None,
            node: None,
            part,
        }
    }
}

/// Edge key: node of the parent and node of the child
type EdgeKey = (Option<NodeId>, Option<NodeId>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    BreadthFirst,
    DepthFirst,
}

pub struct PartIter<'g> {
    graph: &'g PartGraph,
    pending: VecDeque<Visit>,
    order: Order,
    include_loops: bool,
    visit_once: bool,
    seen: HashSet<EdgeKey>,
}

impl<'g> PartIter<'g> {
    fn new(graph: &'g PartGraph, root: PartId) -> Self {
        let mut pending = VecDeque::new();
        if graph.get(root).is_some() {
            pending.push_back(Visit::root(root));
        }
        Self {
            graph,
            pending,
            order: Order::BreadthFirst,
            include_loops: false,
            visit_once: false,
            seen: HashSet::new(),
        }
    }

    /// Switch to depth-first pre-order
    pub fn dfs(mut self) -> Self {
        self.order = Order::DepthFirst;
        self
    }

    /// Descend into loop bodies; implies visiting each edge once
    pub fn with_loops(mut self) -> Self {
        self.include_loops = true;
        self.visit_once = true;
        self
    }

    /// Visit each (parent node, child node) edge at most once
    pub fn visit_once(mut self, once: bool) -> Self {
        self.visit_once = once || self.include_loops;
        self
    }

    fn expand(&mut self, visit: Visit) {
        let Some(part) = self.graph.get(visit.part) else {
            return;
        };
        if part.is_loop() && !self.include_loops {
            return;
        }
        let mut children = Vec::new();
        for node in part.child_nodes() {
            if self.visit_once && !self.seen.insert((visit.node, Some(*node))) {
                continue;
            }
            let Some(target) = self.graph.nodes.get(node.index()) else {
                continue;
            };
            children.push(Visit {
                parent: Some(visit.part),
                node: Some(*node),
                part: *target,
            });
        }
        match self.order {
            Order::BreadthFirst => self.pending.extend(children),
            Order::DepthFirst => self.pending.extend(children.into_iter().rev()),
        }
    }
}

impl Iterator for PartIter<'_> {
    type Item = Visit;

    fn next(&mut self) -> Option<Visit> {
        let visit = match self.order {
            Order::BreadthFirst => self.pending.pop_front()?,
            Order::DepthFirst => self.pending.pop_back()?,
        };
        self.expand(visit);
        Some(visit)
    }
}

pub struct PostOrderIter<'g> {
    graph: &'g PartGraph,
    /// Pending visits with the node their parent was reached through
    stack: Vec<(Visit, Option<NodeId>)>,
    seen_branch: HashSet<EdgeKey>,
    emitted: HashSet<EdgeKey>,
}

impl<'g> PostOrderIter<'g> {
    fn new(graph: &'g PartGraph, root: PartId) -> Self {
        let mut stack = Vec::new();
        if graph.get(root).is_some() {
            stack.push((Visit::root(root), None));
        }
        Self {
            graph,
            stack,
            seen_branch: HashSet::new(),
            emitted: HashSet::new(),
        }
    }
}

impl Iterator for PostOrderIter<'_> {
    type Item = Visit;

    fn next(&mut self) -> Option<Visit> {
        while let Some((visit, parent_node)) = self.stack.pop() {
            let Some(part) = self.graph.get(visit.part) else {
                continue;
            };
            let key = (parent_node, visit.node);
            if part.is_leaf() || part.is_loop() || !self.seen_branch.insert(key) {
                if self.emitted.insert(key) {
                    return Some(visit);
                }
                continue;
            }
            // revisit after the children
            self.stack.push((visit, parent_node));
            for node in part.child_nodes().iter().rev() {
                if let Some(target) = self.graph.nodes.get(node.index()) {
                    let child = Visit {
                        parent: Some(visit.part),
                        node: Some(*node),
                        part: *target,
                    };
                    self.stack.push((child, visit.node));
                }
            }
        }
        None
    }
}

impl PartGraph {
    /// Breadth-first walk from `root` that skips loop bodies
    pub fn iter(&self, root: PartId) -> PartIter<'_> {
        PartIter::new(self, root)
    }

    pub fn post_order(&self, root: PartId) -> PostOrderIter<'_> {
        PostOrderIter::new(self, root)
    }
}
