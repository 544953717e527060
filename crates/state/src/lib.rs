//! Environment settings and sync-record persistence for agentsync.
//!
//! - Reads `AGENTSYNC_*` environment variables into [`ProjectSettings`].
//! - Stores one [`SyncRecord`] per agent and environment under the state
//!   directory, holding the remote fingerprint from the last sync.

pub mod env;
pub mod persistence;

pub use env::{
    agents_dir, env_environment, extra_system_variables, fragments_dir, project_dir, state_dir,
    Environment, ProjectSettings,
};
pub use persistence::{
    load_record, record_path, recorded_agents, save_record, GitOpsProvenance, SyncRecord,
};
