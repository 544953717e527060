use crate::env::Environment;
use agentsync_sync::Fingerprint;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::debug;

/// Where a sync came from when it ran inside a CI workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitOpsProvenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

impl GitOpsProvenance {
    /// Reads the standard GitHub Actions variables; `None` outside a workflow.
    pub fn from_ci_env() -> Option<Self> {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        let provenance = Self {
            commit: var("GITHUB_SHA"),
            branch: var("GITHUB_REF_NAME"),
            repository: var("GITHUB_REPOSITORY"),
            workflow: var("GITHUB_WORKFLOW"),
            actor: var("GITHUB_ACTOR"),
        };
        (!provenance.is_empty()).then_some(provenance)
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Last successful sync of one agent in one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncRecord {
    /// Identifier of the agent on the remote service.
    pub agent_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_synced_at: OffsetDateTime,
    /// Remote fingerprint right after the sync.
    pub fingerprint: Option<Fingerprint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitops: Option<GitOpsProvenance>,
}

impl SyncRecord {
    /// A record stamped with the current time.
    pub fn new(agent_id: impl Into<String>, fingerprint: Option<Fingerprint>) -> Self {
        Self {
            agent_id: agent_id.into(),
            last_synced_at: OffsetDateTime::now_utc(),
            fingerprint,
            gitops: None,
        }
    }

    pub fn with_gitops(mut self, gitops: Option<GitOpsProvenance>) -> Self {
        self.gitops = gitops.filter(|g| !g.is_empty());
        self
    }
}

/// Returns `<state_dir>/<environment>/<agent>.json`.
pub fn record_path(state_dir: &Path, environment: &Environment, agent: &str) -> Result<PathBuf> {
    let valid = !agent.is_empty()
        && agent != "."
        && agent != ".."
        && !agent.contains(['/', '\\']);
    if !valid {
        bail!("invalid agent name '{agent}' for a sync record");
    }
    Ok(state_dir
        .join(environment.as_str())
        .join(format!("{agent}.json")))
}

/// Loads the sync record for `agent`, or `None` if it was never synced.
pub fn load_record(
    state_dir: &Path,
    environment: &Environment,
    agent: &str,
) -> Result<Option<SyncRecord>> {
    let path = record_path(state_dir, environment, agent)?;
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no sync record");
            return Ok(None);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("reading sync record {}", path.display()))
        }
    };
    let record = serde_json::from_str(&text)
        .with_context(|| format!("parsing sync record {}", path.display()))?;
    Ok(Some(record))
}

/// Writes the sync record for `agent`, replacing any previous one atomically.
pub fn save_record(
    state_dir: &Path,
    environment: &Environment,
    agent: &str,
    record: &SyncRecord,
) -> Result<PathBuf> {
    let path = record_path(state_dir, environment, agent)?;
    let dir = path
        .parent()
        .context("sync record path has no parent directory")?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating state directory {}", dir.display()))?;

    let mut text = serde_json::to_string_pretty(record)?;
    text.push('\n');
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.persist(&path)
        .with_context(|| format!("writing sync record {}", path.display()))?;

    debug!(path = %path.display(), agent, "saved sync record");
    Ok(path)
}

/// Agent names with a sync record in `environment`, sorted.
pub fn recorded_agents(state_dir: &Path, environment: &Environment) -> Result<Vec<String>> {
    let dir = state_dir.join(environment.as_str());
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("listing {}", dir.display())),
    };
    let mut agents = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                agents.push(stem.to_string());
            }
        }
    }
    agents.sort();
    Ok(agents)
}
