//! In-place rewiring of branch parts
//!
//! Four operations exist: `add`, `swap_child`, `remove_child` and `merge_child`. Swap,
//! remove and merge report through their boolean result whether anything changed. Any
//! operation on a leaf, and `add` on a single-child branch, is a contract violation.

use crate::part::Part;
use crate::structural::{structural_eq, structural_hash};
use crate::{NodeId, PartError, PartGraph, PartId, Result};
use log::debug;
use std::collections::HashMap;

/// New child for [`PartGraph::swap_child`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacement {
    /// Wrap the part in a fresh node
    Part(PartId),
    /// Reuse an existing node
    Node(NodeId),
}

impl From<PartId> for Replacement {
    fn from(id: PartId) -> Self {
        Replacement::Part(id)
    }
}

impl From<NodeId> for Replacement {
    fn from(id: NodeId) -> Self {
        Replacement::Node(id)
    }
}

/// Content set of one alternation, keyed by structural hash
///
/// Never persisted. Valid only while `generation` matches the graph's.
#[derive(Debug, Clone, Default)]
pub(crate) struct ContentIndex {
    generation: u64,
    buckets: HashMap<u64, Vec<NodeId>>,
}

fn kind_label(part: &Part) -> &'static str {
    match part {
        Part::Leaf(_) => "leaf",
        Part::Append(_) => "append",
        Part::Or(_) => "or",
        Part::Loop(_) => "loop",
        Part::Normalize(_) => "normalize",
        Part::SysVar(_) => "sysvar",
    }
}

fn unsupported(operation: &'static str, part: &Part) -> PartError {
    PartError::Unsupported {
        operation,
        kind: kind_label(part),
    }
}

impl PartGraph {
    /// Add `part` as the last child of a sequence or alternation
    ///
    /// Returns false when an alternation already holds a structurally equal child.
    pub fn add(&mut self, parent: PartId, part: PartId) -> Result<bool> {
        self.check_part(part)?;
        let parent_part = self.part(parent)?;
        let is_or = match parent_part {
            Part::Append(_) => false,
            Part::Or(_) => true,
            other => return Err(unsupported("add", other)),
        };
        if is_or && self.find_equal_child(parent, part, None).is_some() {
            return Ok(false);
        }
        let node = self.node(part)?;
        self.children_mut(parent)?.push(node);
        let prev = self.bump_generation() - 1;
        if is_or {
            self.record_content(parent, node, prev);
        }
        Ok(true)
    }

    /// Replace the child behind `old` with `new`
    ///
    /// Returns false when `old` is not a child of `parent`. For an alternation, a
    /// replacement equal to one of the other children removes `old` instead and also
    /// returns false, keeping the children distinct.
    pub fn swap_child(
        &mut self,
        parent: PartId,
        old: NodeId,
        new: impl Into<Replacement>,
    ) -> Result<bool> {
        self.check_node(old)?;
        let new = new.into();
        let new_part = match new {
            Replacement::Part(p) => {
                self.check_part(p)?;
                p
            }
            Replacement::Node(n) => self.node_part(n)?,
        };

        let parent_part = self.part(parent)?;
        if parent_part.is_leaf() {
            return Err(unsupported("swap", parent_part));
        }
        let is_or = matches!(parent_part, Part::Or(_));
        let Some(pos) = parent_part.child_nodes().iter().position(|n| *n == old) else {
            return Ok(false);
        };

        if is_or && self.find_equal_child(parent, new_part, Some(old)).is_some() {
            debug!("swap into {parent} would duplicate a child, removing {old}");
            self.children_mut(parent)?.remove(pos);
            self.drop_content_index(parent);
            self.bump_generation();
            return Ok(false);
        }
        let node = self.replacement_node(new)?;
        let part = &mut self.parts[parent.index()];
        if let Some(children) = part.child_nodes_mut() {
            children[pos] = node;
        } else if let Some(slot) = part.single_child_mut() {
            *slot = Some(node);
        }
        if is_or {
            self.drop_content_index(parent);
        }
        self.bump_generation();
        Ok(true)
    }

    /// Detach the child behind `node`
    pub fn remove_child(&mut self, parent: PartId, node: NodeId) -> Result<bool> {
        self.check_node(node)?;
        self.check_part(parent)?;
        let part = &mut self.parts[parent.index()];
        if part.is_leaf() {
            return Err(unsupported("remove", part));
        }
        let removed = if let Some(children) = part.child_nodes_mut() {
            match children.iter().position(|n| *n == node) {
                Some(pos) => {
                    children.remove(pos);
                    true
                }
                None => false,
            }
        } else if let Some(slot) = part.single_child_mut() {
            if *slot == Some(node) {
                *slot = None;
                true
            } else {
                false
            }
        } else {
            false
        };
        if removed {
            self.drop_content_index(parent);
            self.bump_generation();
        }
        Ok(removed)
    }

    /// Flatten a nested branch of the same kind into `parent` at its position
    ///
    /// A nested sequence contributes all its children in order. A nested alternation
    /// contributes only the children not already present. Mismatched kinds are left
    /// alone and report false.
    pub fn merge_child(&mut self, parent: PartId, node: NodeId) -> Result<bool> {
        let child = self.node_part(node)?;
        let parent_part = self.part(parent)?;
        if parent_part.is_leaf() {
            return Err(unsupported("merge", parent_part));
        }
        if child == parent {
            return Ok(false);
        }
        let Some(pos) = parent_part.child_nodes().iter().position(|n| *n == node) else {
            return Ok(false);
        };

        let (is_or, grandchildren) = match (parent_part, self.part(child)?) {
            (Part::Append(_), Part::Append(inner)) => (false, inner.children.clone()),
            (Part::Or(_), Part::Or(inner)) => (true, inner.children.clone()),
            _ => return Ok(false),
        };

        if !is_or {
            self.children_mut(parent)?.splice(pos..=pos, grandchildren);
        } else {
            self.children_mut(parent)?.remove(pos);
            self.drop_content_index(parent);
            self.bump_generation();
            let mut at = pos;
            for grandchild in grandchildren {
                let target = self.node_part(grandchild)?;
                if self.find_equal_child(parent, target, None).is_some() {
                    continue;
                }
                self.children_mut(parent)?.insert(at, grandchild);
                self.drop_content_index(parent);
                at += 1;
            }
        }
        self.bump_generation();
        Ok(true)
    }

    // ===== Helpers =====

    fn replacement_node(&mut self, new: Replacement) -> Result<NodeId> {
        match new {
            Replacement::Part(p) => self.node(p),
            Replacement::Node(n) => Ok(n),
        }
    }

    /// Children of a sequence or alternation
    fn children_mut(&mut self, parent: PartId) -> Result<&mut Vec<NodeId>> {
        let part = &mut self.parts[parent.index()];
        let kind = kind_label(part);
        part.child_nodes_mut().ok_or(PartError::Unsupported {
            operation: "child list access",
            kind,
        })
    }

    /// Child of alternation `or` structurally equal to `part`, skipping `except`
    fn find_equal_child(&mut self, or: PartId, part: PartId, except: Option<NodeId>) -> Option<NodeId> {
        self.refresh_content_index(or);
        let hash = structural_hash(self, part);
        let bucket = self.or_contents.get(&or)?.buckets.get(&hash)?;
        bucket
            .iter()
            .filter(|n| Some(**n) != except)
            .find(|n| structural_eq(self, self.nodes[n.index()], self, part))
            .copied()
    }

    fn refresh_content_index(&mut self, or: PartId) {
        if self
            .or_contents
            .get(&or)
            .is_some_and(|idx| idx.generation == self.generation)
        {
            return;
        }
        let mut index = ContentIndex {
            generation: self.generation,
            buckets: HashMap::new(),
        };
        for node in self.parts[or.index()].child_nodes() {
            let hash = structural_hash(self, self.nodes[node.index()]);
            index.buckets.entry(hash).or_default().push(*node);
        }
        self.or_contents.insert(or, index);
    }

    /// Extend a fresh index with a just-added child instead of rebuilding it
    fn record_content(&mut self, or: PartId, node: NodeId, prev_generation: u64) {
        let hash = structural_hash(self, self.nodes[node.index()]);
        let generation = self.generation;
        if let Some(index) = self.or_contents.get_mut(&or) {
            if index.generation == prev_generation {
                index.buckets.entry(hash).or_default().push(node);
                index.generation = generation;
            }
        }
    }

    fn drop_content_index(&mut self, or: PartId) {
        self.or_contents.remove(&or);
    }
}
