//! Handlers that only look at the local side: compose, validate, hash.

use super::{discover_agents, fragment_store, load_agent, system_names};
use agentsync_prompt::{assemble, compose_validated, validate};
use agentsync_state::ProjectSettings;
use agentsync_sync::{ConflictDetector, PromptSource};
use anyhow::{bail, Result};
use tracing::warn;

/// Handle the `compose` command.
pub(crate) fn handle_compose_command(
    settings: &ProjectSettings,
    agent: &str,
    check: bool,
) -> Result<()> {
    let config = load_agent(settings, agent)?;
    let store = fragment_store(settings);
    let prompt = match (&config.llm.prompt, check) {
        (PromptSource::Composed(spec), true) => {
            compose_validated(&store, spec, &system_names(settings))?
        }
        _ => config.prompt_text(&store)?,
    };
    println!("{prompt}");
    Ok(())
}

/// Handle the `validate` command.
///
/// Every agent is checked even after a failure; the command fails at the
/// end if any agent did.
pub(crate) fn handle_validate_command(
    settings: &ProjectSettings,
    agents: Vec<String>,
) -> Result<()> {
    let agents = if agents.is_empty() {
        discover_agents(&settings.agents_dir)?
    } else {
        agents
    };
    if agents.is_empty() {
        println!("No agents found in {}.", settings.agents_dir.display());
        return Ok(());
    }

    let store = fragment_store(settings);
    let system = system_names(settings);
    let mut failed = 0usize;

    for agent in &agents {
        let problems = match load_agent(settings, agent) {
            Ok(config) => match &config.llm.prompt {
                PromptSource::Literal(_) => {
                    println!("{agent}: ok (literal prompt)");
                    continue;
                }
                PromptSource::Composed(spec) => match assemble(&store, spec) {
                    Ok(text) => validate(&text, spec, &system),
                    Err(e) => vec![e.to_string()],
                },
            },
            Err(e) => vec![format!("{e:#}")],
        };

        if problems.is_empty() {
            println!("{agent}: ok");
        } else {
            failed += 1;
            warn!(agent = %agent, problems = problems.len(), "validation failed");
            println!("{agent}: {} problem(s)", problems.len());
            for problem in &problems {
                println!("  - {problem}");
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} agent(s) failed validation", agents.len());
    }
    Ok(())
}

/// Handle the `hash` command.
pub(crate) fn handle_hash_command(settings: &ProjectSettings, agent: &str) -> Result<()> {
    let config = load_agent(settings, agent)?;
    let fingerprint = ConflictDetector::new(fragment_store(settings)).local_fingerprint(&config)?;
    println!("{fingerprint}");
    Ok(())
}
