//! Errors raised while composing or validating prompts.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during prompt composition and validation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PromptError {
    /// A specification references a fragment the store cannot resolve.
    #[error("Prompt fragment not found: '{identifier}' (looked in {directory})")]
    FragmentNotFound {
        /// The identifier as written in the specification.
        identifier: String,
        /// Where the store looked for it.
        directory: String,
    },

    /// One or more placeholders are neither declared nor recognized system names.
    #[error("Variable validation failed for {}: {}", .names.join(", "), .messages.join("; "))]
    VariableValidationFailed {
        /// Every offending variable name, in first-seen order.
        names: Vec<String>,
        /// One message per problem found.
        messages: Vec<String>,
    },

    /// The identifier cannot name a fragment (absolute path, `..`, empty).
    #[error("Invalid fragment identifier: '{0}'")]
    InvalidFragmentId(String),

    #[error("Failed to read fragment {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
