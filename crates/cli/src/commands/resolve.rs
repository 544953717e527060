//! CLI handler for the resolve command.

use super::{environment_or_default, fragment_store, load_agent, load_remote};
use crate::cli::RemoteArgs;
use agentsync_state::{load_record, Environment, ProjectSettings};
use agentsync_sync::{resolve, ConflictDetector, FileConfigWriter, ResolutionStrategy};
use anyhow::{bail, Result};
use inquire::Select;
use std::fmt;
use std::io::IsTerminal;

/// Menu entry for the interactive strategy picker.
struct StrategyChoice(ResolutionStrategy);

impl fmt::Display for StrategyChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<11} {}", self.0.as_str(), self.0.describe())
    }
}

fn prompt_for_strategy(agent: &str) -> Result<ResolutionStrategy> {
    if !std::io::stdin().is_terminal() {
        bail!("--strategy is required when not running interactively");
    }
    let options: Vec<StrategyChoice> = ResolutionStrategy::ALL
        .into_iter()
        .map(StrategyChoice)
        .collect();
    let choice = Select::new(&format!("How should '{agent}' be resolved?"), options).prompt()?;
    Ok(choice.0)
}

/// Handle the `resolve` command.
pub(crate) fn handle_resolve_command(
    settings: &ProjectSettings,
    agent: &str,
    remote: &RemoteArgs,
    environment: Option<Environment>,
    strategy: Option<ResolutionStrategy>,
) -> Result<()> {
    let environment = environment_or_default(settings, environment);
    let local = load_agent(settings, agent)?;
    let remote = load_remote(remote)?;
    let record = load_record(&settings.state_dir, &environment, agent)?;
    let stored = record.as_ref().and_then(|r| r.fingerprint.as_ref());

    let detection =
        ConflictDetector::new(fragment_store(settings)).detect(&local, &remote, stored)?;
    let Some(report) = detection.report() else {
        println!("Agent '{agent}' is in sync with remote ({environment}); nothing to resolve.");
        return Ok(());
    };
    print!("{}", report.format_summary(agent, environment.as_str()));
    println!();

    let strategy = match strategy {
        Some(strategy) => strategy,
        None => prompt_for_strategy(agent)?,
    };
    let writer = FileConfigWriter::new(settings.agent_path(agent));
    let resolution = resolve(&local, &remote, strategy, &writer)?;
    println!("{}", resolution.message);
    Ok(())
}
