//! tracepath-parts: symbolic path expressions
//!
//! A path expression records how a file path observed at a file-system call was built.
//! Expressions live in a [`PartGraph`] arena and may be cyclic: a loop part points back
//! at an ancestor through its start node.
//!
//! ## Architecture
//!
//! - [`leaf`]: constant, wildcard, unknown and placeholder leaves
//! - `part`: the closed set of part variants
//! - `graph`: the arena, construction and extraction of sub-graphs
//! - `mutate`: add, swap, remove and merge on branch parts
//! - `structural`: equality, hashing and total order across graphs
//! - `clone`: memoized, cycle-safe cloning
//! - `render`: full, simple, super-simple and regex renderings
//! - `iter`: breadth-first, depth-first and post-order traversal

mod clone;
mod error;
mod graph;
mod iter;
pub mod leaf;
mod mutate;
mod part;
mod render;
mod structural;

pub use clone::CloneMemo;
pub use error::{PartError, Result};
pub use graph::{NodeId, PartGraph, PartId};
pub use iter::{PartIter, PostOrderIter, Visit};
pub use leaf::{AnyKind, AnyLeaf, Constant, Leaf, Placeholder, Unknown};
pub use mutate::Replacement;
pub use part::{AppendPart, DecoratorPart, LeafPart, LoopId, LoopPart, OrPart, Part};
pub use render::{Form, Render, SEP};
pub use structural::{structural_cmp, structural_eq, structural_hash};
