//! Error types for part graph operations

use crate::{NodeId, PartId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PartError>;

#[derive(Debug, Error)]
pub enum PartError {
    #[error("{operation} is not supported on {kind} parts")]
    Unsupported {
        operation: &'static str,
        kind: &'static str,
    },

    #[error("part {0} does not exist in this graph")]
    UnknownPart(PartId),

    #[error("node {0} does not exist in this graph")]
    UnknownNode(NodeId),

    #[error("part {0} is not a placeholder")]
    NotPlaceholder(PartId),

    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    #[error("regex error: {0}")]
    Regex(#[from] regex_lite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PartError {
    /// Whether the error reports a misuse of the part API rather than bad data
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, PartError::Unsupported { .. })
    }
}
