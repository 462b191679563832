//! Error types for signature handling

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SignatureError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("malformed method signature: {0}")]
    MalformedMethod(String),

    #[error("malformed class signature: {0}")]
    MalformedClass(String),

    #[error("{kind} signature cannot be resolved: {signature}")]
    Unresolvable {
        kind: &'static str,
        signature: String,
    },
}

impl SignatureError {
    /// The offending signature text
    pub fn signature(&self) -> &str {
        match self {
            SignatureError::MalformedMethod(sig) => sig,
            SignatureError::MalformedClass(sig) => sig,
            SignatureError::Unresolvable { signature, .. } => signature,
        }
    }
}
