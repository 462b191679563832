//! Tracepath - symbolic file-path reconstruction facts and their stores
//!
//! This is the root workspace crate that provides integration tests.
//! The actual implementation is in the workspace member crates.

// Re-export main crates for convenience
pub use tracepath_ids as ids;
pub use tracepath_parts as parts;
pub use tracepath_storage as storage;
