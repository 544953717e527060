//! Conflict resolution strategies.

use crate::config::{AgentConfig, PromptSource};
use crate::error::SyncError;
use crate::fields::SYNC_FIELDS;
use crate::remote::{FieldValue, RemoteAgent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

/// How an operator chose to settle an out-of-sync agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    /// Keep local; the caller force-pushes it.
    UseLocal,
    /// Pull remote values into the local file.
    UseRemote,
    /// Leave everything as is for a human to edit.
    Manual,
}

impl ResolutionStrategy {
    pub const ALL: [ResolutionStrategy; 3] = [Self::UseLocal, Self::UseRemote, Self::Manual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UseLocal => "use-local",
            Self::UseRemote => "use-remote",
            Self::Manual => "manual",
        }
    }

    /// One-line description for interactive pickers.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::UseLocal => "keep the local file and force-push it",
            Self::UseRemote => "overwrite the local file with remote values",
            Self::Manual => "edit by hand and re-run detection",
        }
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| {
                format!("unknown strategy '{s}' (expected use-local, use-remote, or manual)")
            })
    }
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub strategy: ResolutionStrategy,
    /// The configuration the local side should now hold. `None` for
    /// [`ResolutionStrategy::Manual`].
    pub config: Option<AgentConfig>,
    pub message: String,
}

/// Destination for a resolved configuration.
#[cfg_attr(test, automock)]
pub trait ConfigWriter: Send + Sync {
    fn write_config(&self, config: &AgentConfig) -> Result<(), SyncError>;

    /// Human-readable destination, used in messages.
    fn target(&self) -> String;
}

/// Writes pretty JSON to a file, replacing it atomically.
#[derive(Debug, Clone)]
pub struct FileConfigWriter {
    path: PathBuf,
}

impl FileConfigWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SyncError {
        SyncError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ConfigWriter for FileConfigWriter {
    fn write_config(&self, config: &AgentConfig) -> Result<(), SyncError> {
        let text = config.to_json_pretty()?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        // Same directory so the rename stays on one filesystem.
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(text.as_bytes())
            .map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;

        debug!(path = %self.path.display(), "wrote agent configuration");
        Ok(())
    }

    fn target(&self) -> String {
        self.path.display().to_string()
    }
}

/// Applies remote values on top of `local`.
///
/// Fields the remote defines win; fields it leaves absent keep the local
/// value. A composed local prompt is kept; a literal one is replaced by the
/// remote prompt text. Keys outside the synchronized set are untouched.
pub fn merge_remote(local: &AgentConfig, remote: &RemoteAgent) -> Result<AgentConfig, SyncError> {
    let mut merged = serde_json::to_value(local)?;

    for field in SYNC_FIELDS {
        if let FieldValue::Present(value) = field.remote_value(remote) {
            field.set_local(&mut merged, value)?;
        }
    }

    let mut config: AgentConfig = serde_json::from_value(merged)?;
    if let PromptSource::Literal(_) = config.llm.prompt {
        config.llm.prompt = PromptSource::Literal(remote.prompt().to_string());
    }
    Ok(config)
}

/// Resolves a conflict with the chosen strategy.
///
/// Only [`ResolutionStrategy::UseRemote`] writes through `writer`.
pub fn resolve<W: ConfigWriter + ?Sized>(
    local: &AgentConfig,
    remote: &RemoteAgent,
    strategy: ResolutionStrategy,
    writer: &W,
) -> Result<Resolution, SyncError> {
    let resolution = match strategy {
        ResolutionStrategy::UseLocal => Resolution {
            strategy,
            config: Some(local.clone()),
            message: format!(
                "Keeping local configuration for '{}'. \
                 Push it with --force to overwrite the remote agent.",
                local.name
            ),
        },
        ResolutionStrategy::UseRemote => {
            let merged = merge_remote(local, remote)?;
            writer.write_config(&merged)?;
            let prompt_note = if merged.uses_composed_prompt() {
                " The composed prompt specification was kept; \
                 reconcile fragments by hand if the remote prompt changed."
            } else {
                ""
            };
            Resolution {
                strategy,
                message: format!(
                    "Updated {} with remote values for '{}'.{prompt_note}",
                    writer.target(),
                    merged.name
                ),
                config: Some(merged),
            }
        }
        ResolutionStrategy::Manual => Resolution {
            strategy,
            config: None,
            message: format!(
                "Edit the local configuration for '{}' by hand, then re-run detection.",
                local.name
            ),
        },
    };
    info!(agent = %local.name, strategy = %strategy, "resolved conflict");
    Ok(resolution)
}
