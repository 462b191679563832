//! Paths reconstructed per entry point

mod record;
mod store;

pub use record::{EntryPointRecord, PathRecord};
pub use store::{PathStore, ResolvedPaths};
