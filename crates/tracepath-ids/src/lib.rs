//! tracepath-ids: identifier containers for analysis facts
//!
//! Stores never hold live analysis-engine objects in their persisted form. Instead they
//! hold signature containers that can be written out, read back without an engine, and
//! later re-resolved against an [`AnalysisSession`]:
//! - [`MethodSig`], [`ClassSig`] and [`StmtSig`] are the serialization-safe tokens
//! - [`MethodRef`], [`ClassRef`] and [`StmtRef`] are the resolved handles a session hands out
//! - [`EntryPoint`] pairs a resolved entry method with its optional stub class

mod error;
mod session;
mod sig;

pub use error::{Result, SignatureError};
pub use session::{
    AnalysisSession, ClassRef, EntryPoint, MemorySession, MethodRef, OfflineSession, StmtRef,
};
pub use sig::{ClassSig, MethodSig, StmtSig};
