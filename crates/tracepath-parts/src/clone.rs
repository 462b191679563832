//! Cycle-safe duplication of sub-graphs

use crate::{PartGraph, PartId, Result};
use std::collections::HashMap;

/// Original-to-copy map scoped to one clone request
///
/// Reusing a memo across calls makes every part shared between the calls map to one
/// copy.
#[derive(Debug, Default)]
pub struct CloneMemo {
    map: HashMap<PartId, PartId>,
}

impl CloneMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy made for `original`, if it was cloned under this memo
    pub fn get(&self, original: PartId) -> Option<PartId> {
        self.map.get(&original).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl PartGraph {
    /// Clone the sub-graph below `id` inside this graph
    ///
    /// Leaves are immutable and come back unchanged. Every branch gets a new part with
    /// new nodes; a branch reached twice, including through a loop back to an ancestor,
    /// is copied once. Loops keep their id.
    pub fn clone_part(&mut self, id: PartId, memo: &mut CloneMemo) -> Result<PartId> {
        let part = self.part(id)?;
        if part.is_leaf() {
            return Ok(id);
        }
        if let Some(copy) = memo.get(id) {
            return Ok(copy);
        }

        let hollow = part.hollow_copy();
        let children = part.child_nodes().to_vec();
        let copy = self.push_part(hollow);
        // recorded before descending so cycles resolve to this copy
        memo.map.insert(id, copy);

        let mut nodes = Vec::with_capacity(children.len());
        for child in children {
            let target = self.node_part(child)?;
            let cloned = self.clone_part(target, memo)?;
            nodes.push(self.node(cloned)?);
        }

        let part = &mut self.parts[copy.index()];
        if let Some(list) = part.child_nodes_mut() {
            *list = nodes;
        } else if let Some(slot) = part.single_child_mut() {
            *slot = nodes.first().copied();
        }
        Ok(copy)
    }

    /// Clone with a fresh memo
    pub fn deep_clone(&mut self, id: PartId) -> Result<PartId> {
        self.clone_part(id, &mut CloneMemo::new())
    }
}
