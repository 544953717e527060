//! CLI handler for the detect command.

use super::{environment_or_default, fragment_store, load_agent, load_remote};
use crate::cli::RemoteArgs;
use agentsync_state::{load_record, Environment, ProjectSettings};
use agentsync_sync::{
    format_prompt_diff, unified_prompt_diff, ConflictDetection, ConflictDetector,
};
use anyhow::Result;
use serde_json::json;
use std::process::ExitCode;

const OUT_OF_SYNC_EXIT: u8 = 2;
const UNIFIED_CONTEXT_LINES: usize = 3;

/// Handle the `detect` command. Returns exit code 2 when out of sync.
pub(crate) fn handle_detect_command(
    settings: &ProjectSettings,
    agent: &str,
    remote: &RemoteArgs,
    environment: Option<Environment>,
    json: bool,
    full_diff: bool,
    unified: bool,
) -> Result<ExitCode> {
    let environment = environment_or_default(settings, environment);
    let local = load_agent(settings, agent)?;
    let remote = load_remote(remote)?;
    let record = load_record(&settings.state_dir, &environment, agent)?;
    let stored = record.as_ref().and_then(|r| r.fingerprint.as_ref());

    let detection =
        ConflictDetector::new(fragment_store(settings)).detect(&local, &remote, stored)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "agent": agent,
                "environment": environment.as_str(),
                "detection": detection,
            }))?
        );
    } else {
        match &detection {
            ConflictDetection::InSync => {
                println!("Agent '{agent}' is in sync with remote ({environment}).");
            }
            ConflictDetection::OutOfSync(report) => {
                print!("{}", report.format_summary(agent, environment.as_str()));
                if let Some(prompt) = &report.prompt_conflict {
                    if unified {
                        println!();
                        print!("{}", unified_prompt_diff(prompt, UNIFIED_CONTEXT_LINES));
                    } else if full_diff {
                        println!();
                        print!("{}", format_prompt_diff(prompt));
                    }
                }
            }
        }
    }

    Ok(if detection.is_in_sync() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(OUT_OF_SYNC_EXIT)
    })
}
