//! Error types for store operations

use crate::gather::WorkerFailures;
use std::io;
use thiserror::Error;
use tracepath_ids::SignatureError;
use tracepath_parts::PartError;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Part error: {0}")]
    Part(#[from] PartError),

    #[error("Signature error: {0}")]
    Signature(SignatureError),

    /// The attached session no longer knows an element the store refers to
    #[error("cannot resolve {kind} '{signature}' against the attached session")]
    Unresolvable { kind: &'static str, signature: String },

    #[error("no analysis session is attached to the store")]
    Detached,

    /// Every problem found while reading a text file, one `Exception i: msg` per line
    #[error("failed to parse:\n{0}")]
    Parse(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("{0}")]
    Workers(#[from] WorkerFailures),
}

impl From<SignatureError> for StorageError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::Unresolvable { kind, signature } => {
                StorageError::Unresolvable { kind, signature }
            }
            other => StorageError::Signature(other),
        }
    }
}

impl StorageError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        StorageError::InvalidRecord(msg.into())
    }
}
