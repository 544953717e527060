use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_ENVIRONMENT: &str = "production";
const DEFAULT_AGENTS_DIR: &str = "agents";
const DEFAULT_FRAGMENTS_DIR: &str = "prompts";
const DEFAULT_STATE_DIR: &str = ".agentsync";

/// Deployment environment name, e.g. `production` or `staging`.
///
/// Used as a directory name under the state root, so it is restricted to
/// ASCII letters, digits, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Environment(String);

impl Environment {
    pub fn parse(name: &str) -> Result<Self> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            bail!("invalid environment name '{name}': use letters, digits, '_' or '-'");
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self(DEFAULT_ENVIRONMENT.to_string())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Returns the environment named by `AGENTSYNC_ENV` (default: `production`).
pub fn env_environment() -> Result<Environment> {
    match non_empty_var("AGENTSYNC_ENV") {
        Some(name) => Environment::parse(name.trim()).context("reading AGENTSYNC_ENV"),
        None => Ok(Environment::default()),
    }
}

/// Returns the project root from `AGENTSYNC_PROJECT_DIR`, or the current directory.
pub fn project_dir() -> Result<PathBuf> {
    if let Some(dir) = non_empty_var("AGENTSYNC_PROJECT_DIR") {
        return Ok(PathBuf::from(dir));
    }
    std::env::current_dir().context("resolving current directory")
}

/// Returns the agent configuration directory (`AGENTSYNC_AGENTS_DIR`, default `<project>/agents`).
pub fn agents_dir(project: &Path) -> PathBuf {
    non_empty_var("AGENTSYNC_AGENTS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| project.join(DEFAULT_AGENTS_DIR))
}

/// Returns the fragment store root (`AGENTSYNC_FRAGMENTS_DIR`, default `<project>/prompts`).
pub fn fragments_dir(project: &Path) -> PathBuf {
    non_empty_var("AGENTSYNC_FRAGMENTS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| project.join(DEFAULT_FRAGMENTS_DIR))
}

/// Returns the sync record root (`AGENTSYNC_STATE_DIR`, default `<project>/.agentsync`).
pub fn state_dir(project: &Path) -> PathBuf {
    non_empty_var("AGENTSYNC_STATE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| project.join(DEFAULT_STATE_DIR))
}

/// Extra system variable names from `AGENTSYNC_SYSTEM_VARIABLES` (comma-separated).
pub fn extra_system_variables() -> Vec<String> {
    std::env::var("AGENTSYNC_SYSTEM_VARIABLES")
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Resolved locations and defaults for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSettings {
    pub project_dir: PathBuf,
    pub agents_dir: PathBuf,
    pub fragments_dir: PathBuf,
    pub state_dir: PathBuf,
    pub environment: Environment,
    pub system_variables: Vec<String>,
}

impl ProjectSettings {
    /// Reads every `AGENTSYNC_*` variable.
    pub fn from_env() -> Result<Self> {
        Self::for_project(project_dir()?)
    }

    /// Settings rooted at `project_dir`; directory variables still apply.
    pub fn for_project(project_dir: impl Into<PathBuf>) -> Result<Self> {
        let project_dir = project_dir.into();
        Ok(Self {
            agents_dir: agents_dir(&project_dir),
            fragments_dir: fragments_dir(&project_dir),
            state_dir: state_dir(&project_dir),
            environment: env_environment()?,
            system_variables: extra_system_variables(),
            project_dir,
        })
    }

    /// Path of the local configuration for `agent`.
    pub fn agent_path(&self, agent: &str) -> PathBuf {
        self.agents_dir.join(format!("{agent}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentsync_test_utils::{env_guard, set_env_var};

    #[test]
    fn environment_names_are_restricted() {
        assert_eq!(Environment::parse("staging-eu_2").unwrap().as_str(), "staging-eu_2");
        assert!(Environment::parse("").is_err());
        assert!(Environment::parse("../prod").is_err());
        assert!(Environment::parse("prod env").is_err());
        assert_eq!(Environment::default().as_str(), "production");
        assert_eq!("dev".parse::<Environment>().unwrap().to_string(), "dev");
    }

    #[test]
    fn directories_default_under_project() {
        let _lock = env_guard();
        let _agents = set_env_var("AGENTSYNC_AGENTS_DIR", None);
        let _fragments = set_env_var("AGENTSYNC_FRAGMENTS_DIR", None);
        let _state = set_env_var("AGENTSYNC_STATE_DIR", None);
        let _env = set_env_var("AGENTSYNC_ENV", None);
        let _system = set_env_var("AGENTSYNC_SYSTEM_VARIABLES", None);

        let settings = ProjectSettings::for_project("/work").unwrap();
        assert_eq!(settings.agents_dir, PathBuf::from("/work/agents"));
        assert_eq!(settings.fragments_dir, PathBuf::from("/work/prompts"));
        assert_eq!(settings.state_dir, PathBuf::from("/work/.agentsync"));
        assert_eq!(settings.environment, Environment::default());
        assert!(settings.system_variables.is_empty());
        assert_eq!(settings.agent_path("support"), PathBuf::from("/work/agents/support.json"));
    }

    #[test]
    fn variables_override_defaults() {
        let _lock = env_guard();
        let _agents = set_env_var("AGENTSYNC_AGENTS_DIR", Some("/cfg/agents"));
        let _fragments = set_env_var("AGENTSYNC_FRAGMENTS_DIR", None);
        let _state = set_env_var("AGENTSYNC_STATE_DIR", Some("/var/agentsync"));
        let _env = set_env_var("AGENTSYNC_ENV", Some("staging"));
        let _system = set_env_var(
            "AGENTSYNC_SYSTEM_VARIABLES",
            Some("system__region, system__plan ,"),
        );

        let settings = ProjectSettings::for_project("/work").unwrap();
        assert_eq!(settings.agents_dir, PathBuf::from("/cfg/agents"));
        assert_eq!(settings.fragments_dir, PathBuf::from("/work/prompts"));
        assert_eq!(settings.state_dir, PathBuf::from("/var/agentsync"));
        assert_eq!(settings.environment.as_str(), "staging");
        assert_eq!(settings.system_variables, ["system__region", "system__plan"]);
    }

    #[test]
    fn invalid_environment_variable_is_an_error() {
        let _lock = env_guard();
        let _env = set_env_var("AGENTSYNC_ENV", Some("prod/eu"));
        let err = env_environment().unwrap_err();
        assert!(format!("{err:#}").contains("AGENTSYNC_ENV"), "{err:#}");
    }
}
