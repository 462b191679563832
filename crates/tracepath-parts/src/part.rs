//! The closed set of part variants

use crate::leaf::Leaf;
use crate::render::RenderCache;
use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Next loop id handed out; ids start at 1
static NEXT_LOOP_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a loop part
///
/// Loops compare, hash and order by this id alone. Cloning keeps the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoopId(u64);

impl LoopId {
    /// Allocate an id no other loop in this process has
    pub fn fresh() -> Self {
        LoopId(NEXT_LOOP_ID.fetch_add(1, Ordering::SeqCst))
    }

    /// Make sure later fresh ids never collide with one read from disk
    pub(crate) fn observe(self) {
        NEXT_LOOP_ID.fetch_max(self.0 + 1, Ordering::SeqCst);
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeafPart {
    pub leaf: Leaf,
    #[serde(skip)]
    pub(crate) cache: RenderCache,
}

impl LeafPart {
    pub fn new(leaf: Leaf) -> Self {
        Self {
            leaf,
            cache: RenderCache::default(),
        }
    }
}

/// Ordered concatenation; keeps duplicates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppendPart {
    pub(crate) children: Vec<NodeId>,
}

/// Alternation; children are distinct by structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrPart {
    pub(crate) children: Vec<NodeId>,
}

/// Marks that its body eventually leads back to an ancestor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopPart {
    pub(crate) id: LoopId,
    pub(crate) start: Option<NodeId>,
}

impl LoopPart {
    pub fn id(&self) -> LoopId {
        self.id
    }

    pub fn start(&self) -> Option<NodeId> {
        self.start
    }
}

/// Single optional child, used by normalize and system-variable parts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecoratorPart {
    pub(crate) child: Option<NodeId>,
}

impl DecoratorPart {
    pub fn child(&self) -> Option<NodeId> {
        self.child
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Part {
    Leaf(LeafPart),
    Append(AppendPart),
    Or(OrPart),
    Loop(LoopPart),
    /// Path normalization applied to the child
    Normalize(DecoratorPart),
    /// Child was read from a system variable
    SysVar(DecoratorPart),
}

impl Part {
    /// Variant name, also the cross-kind ordering key for branches
    pub fn kind_name(&self) -> &'static str {
        match self {
            Part::Leaf(_) => "Leaf",
            Part::Append(_) => "Append",
            Part::Or(_) => "Or",
            Part::Loop(_) => "Loop",
            Part::Normalize(_) => "Normalize",
            Part::SysVar(_) => "SysVar",
        }
    }

    /// Name used when ordering parts of different kinds
    pub fn type_name(&self) -> &'static str {
        match self {
            Part::Leaf(l) => l.leaf.type_name(),
            other => other.kind_name(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Part::Leaf(_))
    }

    pub fn is_branch(&self) -> bool {
        !self.is_leaf()
    }

    pub fn is_loop(&self) -> bool {
        matches!(self, Part::Loop(_))
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Part::Leaf(l) => Some(&l.leaf),
            _ => None,
        }
    }

    pub fn loop_id(&self) -> Option<LoopId> {
        match self {
            Part::Loop(l) => Some(l.id),
            _ => None,
        }
    }

    /// Child edges in order; empty for leaves
    pub fn child_nodes(&self) -> &[NodeId] {
        match self {
            Part::Leaf(_) => &[],
            Part::Append(a) => &a.children,
            Part::Or(o) => &o.children,
            Part::Loop(l) => single(&l.start),
            Part::Normalize(d) | Part::SysVar(d) => single(&d.child),
        }
    }

    pub(crate) fn child_nodes_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            Part::Append(a) => Some(&mut a.children),
            Part::Or(o) => Some(&mut o.children),
            _ => None,
        }
    }

    pub(crate) fn single_child_mut(&mut self) -> Option<&mut Option<NodeId>> {
        match self {
            Part::Loop(l) => Some(&mut l.start),
            Part::Normalize(d) | Part::SysVar(d) => Some(&mut d.child),
            _ => None,
        }
    }

    /// Same variant with no children; loops keep their id
    pub(crate) fn hollow_copy(&self) -> Part {
        match self {
            Part::Leaf(l) => Part::Leaf(l.clone()),
            Part::Append(_) => Part::Append(AppendPart::default()),
            Part::Or(_) => Part::Or(OrPart::default()),
            Part::Loop(l) => Part::Loop(LoopPart { id: l.id, start: None }),
            Part::Normalize(_) => Part::Normalize(DecoratorPart::default()),
            Part::SysVar(_) => Part::SysVar(DecoratorPart::default()),
        }
    }
}

fn single(child: &Option<NodeId>) -> &[NodeId] {
    match child {
        Some(node) => std::slice::from_ref(node),
        None => &[],
    }
}
