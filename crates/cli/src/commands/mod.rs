//! CLI command handlers for the agentsync application.

mod compose;
mod detect;
mod record;
mod resolve;
mod status;

pub(crate) use compose::{handle_compose_command, handle_hash_command, handle_validate_command};
pub(crate) use detect::handle_detect_command;
pub(crate) use record::handle_record_command;
pub(crate) use resolve::handle_resolve_command;
pub(crate) use status::handle_status_command;

use crate::cli::RemoteArgs;
use agentsync_prompt::{DirFragmentStore, SystemNames};
use agentsync_state::{Environment, ProjectSettings};
use agentsync_sync::{AgentConfig, RemoteAgent};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use walkdir::WalkDir;

pub(crate) fn fragment_store(settings: &ProjectSettings) -> DirFragmentStore {
    DirFragmentStore::new(&settings.fragments_dir)
}

pub(crate) fn system_names(settings: &ProjectSettings) -> SystemNames {
    SystemNames::with_extra(settings.system_variables.iter().cloned())
}

pub(crate) fn environment_or_default(
    settings: &ProjectSettings,
    environment: Option<Environment>,
) -> Environment {
    environment.unwrap_or_else(|| settings.environment.clone())
}

pub(crate) fn load_agent(settings: &ProjectSettings, agent: &str) -> Result<AgentConfig> {
    let path = settings.agent_path(agent);
    AgentConfig::load(&path).with_context(|| format!("loading agent '{agent}'"))
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

pub(crate) fn load_remote(remote: &RemoteArgs) -> Result<RemoteAgent> {
    let agent = read_json(&remote.remote_agent)?;
    let llm = read_json(&remote.remote_llm)?;
    Ok(RemoteAgent::from_documents(agent, llm)?)
}

/// Names of every `<agent>.json` directly under the agents directory, sorted.
pub(crate) fn discover_agents(agents_dir: &Path) -> Result<Vec<String>> {
    if !agents_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut agents = Vec::new();
    for entry in WalkDir::new(agents_dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("listing {}", agents_dir.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            agents.push(stem.to_string());
        }
    }
    agents.sort();
    Ok(agents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentsync_test_utils::TestFixture;

    #[test]
    fn discover_agents_lists_json_files_only() {
        let fixture = TestFixture::new().unwrap();
        fixture.write_agent("support", "{}").unwrap();
        fixture.write_agent("billing", "{}").unwrap();
        fixture.write_file("agents/README.md", "docs").unwrap();
        fixture.write_file("agents/nested/inner.json", "{}").unwrap();

        let agents = discover_agents(&fixture.agents_dir).unwrap();
        assert_eq!(agents, ["billing", "support"]);
    }

    #[test]
    fn discover_agents_tolerates_missing_directory() {
        let fixture = TestFixture::new().unwrap();
        let missing = fixture.project_path().join("nope");
        assert!(discover_agents(&missing).unwrap().is_empty());
    }
}
