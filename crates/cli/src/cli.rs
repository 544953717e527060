use agentsync_state::Environment;
use agentsync_sync::ResolutionStrategy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface for the `agentsync` application.
#[derive(Debug, Parser)]
#[command(
    name = "agentsync",
    version,
    about = "Compose voice-agent prompts and keep agents in sync with the remote service"
)]
pub struct Cli {
    #[command(flatten)]
    pub paths: PathArgs,
    #[command(subcommand)]
    pub command: Commands,
}

/// Project locations; flags take precedence over `AGENTSYNC_*` variables.
#[derive(Debug, Clone, Default, Args)]
pub struct PathArgs {
    /// Project root (default: current directory).
    #[arg(long, global = true, env = "AGENTSYNC_PROJECT_DIR", value_name = "DIR")]
    pub project_dir: Option<PathBuf>,
    /// Directory holding `<agent>.json` configurations.
    #[arg(long, global = true, env = "AGENTSYNC_AGENTS_DIR", value_name = "DIR")]
    pub agents_dir: Option<PathBuf>,
    /// Root of the prompt fragment store.
    #[arg(long, global = true, env = "AGENTSYNC_FRAGMENTS_DIR", value_name = "DIR")]
    pub fragments_dir: Option<PathBuf>,
    /// Root of the per-environment sync records.
    #[arg(long, global = true, env = "AGENTSYNC_STATE_DIR", value_name = "DIR")]
    pub state_dir: Option<PathBuf>,
}

/// Remote documents captured from the service as JSON files.
#[derive(Debug, Clone, Args)]
pub struct RemoteArgs {
    /// Remote agent-settings document.
    #[arg(long, value_name = "FILE")]
    pub remote_agent: PathBuf,
    /// Remote LLM-settings document.
    #[arg(long, value_name = "FILE")]
    pub remote_llm: PathBuf,
}

/// Available `agentsync` commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Prints the composed prompt of an agent.
    Compose {
        agent: String,
        /// Validate variables before printing.
        #[arg(long, default_value_t = false)]
        check: bool,
    },
    /// Validates prompt variables (all agents when none are named).
    Validate { agents: Vec<String> },
    /// Prints the fingerprint of an agent as it would be pushed.
    Hash { agent: String },
    /// Compares an agent with the remote documents; exits 2 when out of sync.
    Detect {
        agent: String,
        #[command(flatten)]
        remote: RemoteArgs,
        /// Environment whose sync record is consulted (default: `AGENTSYNC_ENV`).
        #[arg(long = "env", value_name = "ENV")]
        environment: Option<Environment>,
        /// Emit JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Show a side-by-side prompt diff.
        #[arg(long, default_value_t = false)]
        full_diff: bool,
        /// Show a unified prompt diff.
        #[arg(long, default_value_t = false, conflicts_with = "full_diff")]
        unified: bool,
    },
    /// Settles an out-of-sync agent with a resolution strategy.
    Resolve {
        agent: String,
        #[command(flatten)]
        remote: RemoteArgs,
        #[arg(long = "env", value_name = "ENV")]
        environment: Option<Environment>,
        /// use-local, use-remote, or manual (prompts when omitted).
        #[arg(long, value_name = "STRATEGY")]
        strategy: Option<ResolutionStrategy>,
    },
    /// Records a completed push: stores the remote fingerprint for the environment.
    Record {
        agent: String,
        /// Identifier of the agent on the remote service.
        #[arg(long, value_name = "ID")]
        agent_id: String,
        #[command(flatten)]
        remote: RemoteArgs,
        #[arg(long = "env", value_name = "ENV")]
        environment: Option<Environment>,
        /// Commit the pushed configuration came from (default: `GITHUB_SHA`).
        #[arg(long, value_name = "SHA")]
        commit: Option<String>,
        /// Branch the pushed configuration came from (default: `GITHUB_REF_NAME`).
        #[arg(long, value_name = "BRANCH")]
        branch: Option<String>,
    },
    /// Reports which agents changed locally since their last recorded sync.
    Status {
        #[arg(long = "env", value_name = "ENV")]
        environment: Option<Environment>,
        /// Emit JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
