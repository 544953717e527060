//! CLI handler for the status command.

use super::{discover_agents, environment_or_default, fragment_store, load_agent};
use agentsync_prompt::DirFragmentStore;
use agentsync_state::{load_record, recorded_agents, Environment, ProjectSettings};
use agentsync_sync::ConflictDetector;
use anyhow::{bail, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Where one agent stands relative to its last recorded sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum AgentState {
    UpToDate,
    LocalChangesNotPushed,
    NeverSynced,
    NoFingerprint,
    MissingLocal,
    Error,
}

impl AgentState {
    fn label(&self) -> &'static str {
        match self {
            Self::UpToDate => "up to date",
            Self::LocalChangesNotPushed => "local changes not pushed",
            Self::NeverSynced => "never synced",
            Self::NoFingerprint => "no fingerprint recorded",
            Self::MissingLocal => "recorded but no local configuration",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Serialize)]
struct AgentStatus {
    agent: String,
    state: AgentState,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

fn agent_status(
    settings: &ProjectSettings,
    environment: &Environment,
    detector: &ConflictDetector<DirFragmentStore>,
    agent: &str,
) -> Result<(AgentState, Option<String>)> {
    let record = load_record(&settings.state_dir, environment, agent)?;
    if !settings.agent_path(agent).exists() {
        return Ok((AgentState::MissingLocal, None));
    }
    let local = detector.local_fingerprint(&load_agent(settings, agent)?)?;
    let Some(record) = record else {
        return Ok((AgentState::NeverSynced, None));
    };
    let Some(stored) = record.fingerprint else {
        return Ok((AgentState::NoFingerprint, None));
    };

    if local == stored {
        Ok((AgentState::UpToDate, None))
    } else {
        Ok((
            AgentState::LocalChangesNotPushed,
            Some(format!("local {} vs recorded {}", local.short(12), stored.short(12))),
        ))
    }
}

/// Handle the `status` command.
///
/// Covers every agent that exists locally or has a record; one failing agent
/// does not stop the others.
pub(crate) fn handle_status_command(
    settings: &ProjectSettings,
    environment: Option<Environment>,
    json: bool,
) -> Result<()> {
    let environment = environment_or_default(settings, environment);
    let agents: BTreeSet<String> = discover_agents(&settings.agents_dir)?
        .into_iter()
        .chain(recorded_agents(&settings.state_dir, &environment)?)
        .collect();

    let detector = ConflictDetector::new(fragment_store(settings));
    let mut rows = Vec::with_capacity(agents.len());
    for agent in agents {
        let (state, detail) = match agent_status(settings, &environment, &detector, &agent) {
            Ok(status) => status,
            Err(e) => {
                warn!(agent = %agent, error = %e, "status check failed");
                (AgentState::Error, Some(format!("{e:#}")))
            }
        };
        rows.push(AgentStatus {
            agent,
            state,
            detail,
        });
    }
    let errors = rows.iter().filter(|r| r.state == AgentState::Error).count();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "environment": environment.as_str(),
                "agents": rows,
            }))?
        );
    } else if rows.is_empty() {
        println!("No agents found.");
    } else {
        println!("Environment: {environment}");
        let width = rows.iter().map(|r| r.agent.len()).max().unwrap_or(0);
        for row in &rows {
            match &row.detail {
                Some(detail) => println!(
                    "  {:<width$}  {} ({detail})",
                    row.agent,
                    row.state.label()
                ),
                None => println!("  {:<width$}  {}", row.agent, row.state.label()),
            }
        }
    }

    if errors > 0 {
        bail!("{errors} agent(s) could not be checked");
    }
    Ok(())
}
