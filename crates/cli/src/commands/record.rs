//! CLI handler for the record command.

use super::{environment_or_default, load_remote};
use crate::cli::RemoteArgs;
use agentsync_state::{save_record, Environment, GitOpsProvenance, ProjectSettings, SyncRecord};
use agentsync_sync::remote_fingerprint;
use anyhow::Result;
use tracing::info;

/// Handle the `record` command.
pub(crate) fn handle_record_command(
    settings: &ProjectSettings,
    agent: &str,
    agent_id: &str,
    remote: &RemoteArgs,
    environment: Option<Environment>,
    commit: Option<String>,
    branch: Option<String>,
) -> Result<()> {
    let environment = environment_or_default(settings, environment);
    let remote = load_remote(remote)?;
    let fingerprint = remote_fingerprint(&remote);

    let mut gitops = GitOpsProvenance::from_ci_env().unwrap_or_default();
    if commit.is_some() {
        gitops.commit = commit;
    }
    if branch.is_some() {
        gitops.branch = branch;
    }

    let record = SyncRecord::new(agent_id, Some(fingerprint.clone())).with_gitops(Some(gitops));
    let path = save_record(&settings.state_dir, &environment, agent, &record)?;
    info!(agent, environment = %environment, "recorded sync");
    println!("Recorded {agent} ({environment}) at {fingerprint}");
    println!("  {}", path.display());
    Ok(())
}
