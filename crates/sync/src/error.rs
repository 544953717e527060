//! Error type for sync, detection, and resolution.

use agentsync_prompt::PromptError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while comparing or reconciling configurations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    /// Prompt composition failed (missing fragment, invalid variables).
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// A remote document lacks a structurally required field, or a field has
    /// a shape the local configuration cannot hold.
    #[error("Malformed remote {document} document: field '{field}' {reason}")]
    MalformedRemoteDocument {
        /// Which remote document (`agent` or `llm`).
        document: String,
        field: String,
        reason: String,
    },

    /// The local configuration violates its schema.
    #[error("Invalid agent configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid fingerprint: '{0}'")]
    InvalidFingerprint(String),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    pub(crate) fn malformed(
        document: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedRemoteDocument {
            document: document.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}
