use crate::cli::{Cli, Commands, PathArgs};
use crate::commands::{
    handle_compose_command, handle_detect_command, handle_hash_command, handle_record_command,
    handle_resolve_command, handle_status_command, handle_validate_command,
};
use agentsync_state::{project_dir, ProjectSettings};
use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

/// Applies command-line path overrides on top of the environment settings.
fn resolve_settings(paths: PathArgs) -> Result<ProjectSettings> {
    let root = match paths.project_dir {
        Some(dir) => dir,
        None => project_dir()?,
    };
    let mut settings = ProjectSettings::for_project(root)?;
    if let Some(dir) = paths.agents_dir {
        settings.agents_dir = dir;
    }
    if let Some(dir) = paths.fragments_dir {
        settings.fragments_dir = dir;
    }
    if let Some(dir) = paths.state_dir {
        settings.state_dir = dir;
    }
    Ok(settings)
}

/// Parses arguments, initializes logging, and dispatches one command.
pub fn run() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(cli.paths)?;
    tracing::debug!(project = %settings.project_dir.display(), "resolved settings");

    match cli.command {
        Commands::Compose { agent, check } => handle_compose_command(&settings, &agent, check)?,
        Commands::Validate { agents } => handle_validate_command(&settings, agents)?,
        Commands::Hash { agent } => handle_hash_command(&settings, &agent)?,
        Commands::Detect {
            agent,
            remote,
            environment,
            json,
            full_diff,
            unified,
        } => {
            return handle_detect_command(
                &settings,
                &agent,
                &remote,
                environment,
                json,
                full_diff,
                unified,
            )
        }
        Commands::Resolve {
            agent,
            remote,
            environment,
            strategy,
        } => handle_resolve_command(&settings, &agent, &remote, environment, strategy)?,
        Commands::Record {
            agent,
            agent_id,
            remote,
            environment,
            commit,
            branch,
        } => handle_record_command(
            &settings,
            &agent,
            &agent_id,
            &remote,
            environment,
            commit,
            branch,
        )?,
        Commands::Status { environment, json } => {
            handle_status_command(&settings, environment, json)?
        }
    }
    Ok(ExitCode::SUCCESS)
}
