//! Conflict detection between a local configuration and the remote state.

use crate::canonical::{fingerprint, fingerprint_text, fingerprints_equal, Fingerprint};
use crate::config::AgentConfig;
use crate::error::SyncError;
use crate::fields::{local_field_values, remote_field_values, sync_shape};
use crate::remote::{FieldValue, RemoteAgent};
use agentsync_prompt::FragmentStore;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

/// A synchronized field whose local and remote values differ.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldConflict {
    /// Dotted path, e.g. `agent.voice_speed`.
    pub path: String,
    pub local: FieldValue,
    pub remote: FieldValue,
}

/// Local and remote prompts differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptConflict {
    pub local_prompt: String,
    pub remote_prompt: String,
    pub local_fingerprint: Fingerprint,
    pub remote_fingerprint: Fingerprint,
}

/// Details of an out-of-sync comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictReport {
    pub local_fingerprint: Fingerprint,
    pub remote_fingerprint: Fingerprint,
    pub field_conflicts: Vec<FieldConflict>,
    pub prompt_conflict: Option<PromptConflict>,
}

impl ConflictReport {
    /// Number of differences found (fields plus prompt).
    pub fn conflict_count(&self) -> usize {
        self.field_conflicts.len() + usize::from(self.prompt_conflict.is_some())
    }

    pub fn field(&self, path: &str) -> Option<&FieldConflict> {
        self.field_conflicts.iter().find(|c| c.path == path)
    }
}

/// Outcome of one detection pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConflictDetection {
    InSync,
    OutOfSync(ConflictReport),
}

impl ConflictDetection {
    pub fn is_in_sync(&self) -> bool {
        matches!(self, Self::InSync)
    }

    pub fn report(&self) -> Option<&ConflictReport> {
        match self {
            Self::InSync => None,
            Self::OutOfSync(report) => Some(report),
        }
    }
}

/// Fingerprint of the remote state.
pub fn remote_fingerprint(remote: &RemoteAgent) -> Fingerprint {
    fingerprint(&sync_shape(&remote_field_values(remote), remote.prompt()))
}

/// Compares local configurations against remote documents.
///
/// Holds only the fragment store; every call is independent.
pub struct ConflictDetector<S: FragmentStore> {
    store: S,
}

impl<S: FragmentStore> ConflictDetector<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The prompt text the local configuration would push.
    pub fn local_prompt(&self, local: &AgentConfig) -> Result<String, SyncError> {
        Ok(local.prompt_text(&self.store)?)
    }

    /// The sync shape the local configuration would push.
    pub fn local_shape(&self, local: &AgentConfig) -> Result<Value, SyncError> {
        let prompt = self.local_prompt(local)?;
        Ok(sync_shape(&local_field_values(local)?, &prompt))
    }

    /// Fingerprint of the local configuration as it would be pushed.
    pub fn local_fingerprint(&self, local: &AgentConfig) -> Result<Fingerprint, SyncError> {
        Ok(fingerprint(&self.local_shape(local)?))
    }

    /// Decides whether `local` and `remote` are in sync.
    ///
    /// When `stored` (the fingerprint recorded at the last sync) matches the
    /// remote fingerprint, the remote has not drifted and the result is
    /// [`ConflictDetection::InSync`] even if the local file was edited since.
    pub fn detect(
        &self,
        local: &AgentConfig,
        remote: &RemoteAgent,
        stored: Option<&Fingerprint>,
    ) -> Result<ConflictDetection, SyncError> {
        let remote_fp = remote_fingerprint(remote);

        let local_prompt = self.local_prompt(local)?;
        let local_values = local_field_values(local)?;
        let local_fp = fingerprint(&sync_shape(&local_values, &local_prompt));

        debug!(
            agent = %local.name,
            local = %local_fp,
            remote = %remote_fp,
            stored = stored.map(Fingerprint::as_str).unwrap_or("none"),
            "computed fingerprints"
        );

        if stored.is_some() && fingerprints_equal(stored, Some(&remote_fp)) {
            info!(agent = %local.name, "remote unchanged since last sync");
            return Ok(ConflictDetection::InSync);
        }
        if local_fp == remote_fp {
            info!(agent = %local.name, "local and remote are identical");
            return Ok(ConflictDetection::InSync);
        }

        let field_conflicts: Vec<FieldConflict> = local_values
            .into_iter()
            .zip(remote_field_values(remote))
            .filter(|((_, local_value), (_, remote_value))| !local_value.same_as(remote_value))
            .map(|((field, local_value), (_, remote_value))| FieldConflict {
                path: field.path(),
                local: local_value,
                remote: remote_value,
            })
            .collect();

        let prompt_conflict = detect_prompt_conflict(local_prompt, remote.prompt());

        info!(
            agent = %local.name,
            fields = field_conflicts.len(),
            prompt = prompt_conflict.is_some(),
            "agent is out of sync"
        );

        Ok(ConflictDetection::OutOfSync(ConflictReport {
            local_fingerprint: local_fp,
            remote_fingerprint: remote_fp,
            field_conflicts,
            prompt_conflict,
        }))
    }
}

fn detect_prompt_conflict(local_prompt: String, remote_prompt: &str) -> Option<PromptConflict> {
    let local_fingerprint = fingerprint_text(&local_prompt);
    let remote_fingerprint = fingerprint_text(remote_prompt);
    if local_fingerprint == remote_fingerprint {
        return None;
    }
    Some(PromptConflict {
        local_prompt,
        remote_prompt: remote_prompt.to_string(),
        local_fingerprint,
        remote_fingerprint,
    })
}

/// One-shot detection over raw remote documents.
pub fn detect_conflicts<S: FragmentStore>(
    local: &AgentConfig,
    remote_agent: Value,
    remote_llm: Value,
    stored: Option<&Fingerprint>,
    store: S,
) -> Result<ConflictDetection, SyncError> {
    let remote = RemoteAgent::from_documents(remote_agent, remote_llm)?;
    ConflictDetector::new(store).detect(local, &remote, stored)
}
