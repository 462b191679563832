//! tracepath-storage: concurrent, persistent stores of analysis facts
//!
//! Stores are shared by the worker threads of an analysis phase, written out at the end
//! of the phase, and read back by later phases without a live analysis engine.
//!
//! ## Architecture
//!
//! The storage layer follows a three-layer design:
//! - Layer 1: the stores ([`PathStore`], [`FileMethodStore`], [`MessageHandlerStore`]),
//!   each guarded by one [`StoreLock`] with a read-upgrade path for stale caches
//! - Layer 2: resolved vs. output forms; output records hold signatures, resolved views
//!   are rebuilt against an attached [`tracepath_ids::AnalysisSession`]
//! - Layer 3: the phase boundary ([`PersistentStore`], [`load_or_compute`]) with
//!   dependency [`FileHashList`]s deciding whether a persisted store is still current

mod config;
mod error;
mod file_hash;
pub mod file_methods;
pub mod gather;
mod handlers;
mod lock;
pub mod paths;
mod provider;

pub use config::{StoreConfig, StoreKind};
pub use error::{Result, StorageError};
pub use file_hash::{FileHash, FileHashList};
pub use file_methods::{Actions, ApiOrigin, FileMethod, FileMethodStore, View};
pub use gather::{run_all, WorkerError, WorkerFailures};
pub use handlers::MessageHandlerStore;
pub use lock::StoreLock;
pub use paths::{EntryPointRecord, PathRecord, PathStore, ResolvedPaths};
pub use provider::{load_or_compute, PersistentStore};
