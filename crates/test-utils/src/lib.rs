//! Shared test utilities for agentsync crates.
//!
//! Provides a temporary project tree (agents, prompt fragments, sync state)
//! and guards for tests that touch process-global environment variables.

use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

/// Serialize tests that mutate process-global state (env vars, cwd, etc).
///
/// Acquire this guard at the start of any test that modifies environment
/// variables to prevent race conditions between parallel tests.
pub fn env_guard() -> MutexGuard<'static, ()> {
    static TEST_SERIAL: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    TEST_SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// RAII guard for environment variables - restores original value on drop.
pub struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.previous {
            std::env::set_var(self.key, v);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

/// Set an environment variable and return a guard that restores the original on drop.
///
/// # Example
/// ```
/// let _guard = agentsync_test_utils::set_env_var("MY_VAR", Some("value"));
/// // MY_VAR is set to "value" until _guard drops
/// ```
pub fn set_env_var(key: &'static str, value: Option<&str>) -> EnvVarGuard {
    let previous = std::env::var(key).ok();
    if let Some(val) = value {
        std::env::set_var(key, val);
    } else {
        std::env::remove_var(key);
    }
    EnvVarGuard { key, previous }
}

/// Temporary agentsync project with the standard directory layout.
///
/// The tempdir is removed when the fixture is dropped.
pub struct TestFixture {
    pub tempdir: tempfile::TempDir,
    /// `<project>/agents`
    pub agents_dir: PathBuf,
    /// `<project>/prompts`
    pub fragments_dir: PathBuf,
    /// `<project>/.agentsync`
    pub state_dir: PathBuf,
}

impl TestFixture {
    /// Creates `agents/`, `prompts/` and `.agentsync/` under a fresh tempdir.
    pub fn new() -> std::io::Result<Self> {
        let tempdir = tempfile::tempdir()?;
        let agents_dir = tempdir.path().join("agents");
        let fragments_dir = tempdir.path().join("prompts");
        let state_dir = tempdir.path().join(".agentsync");

        std::fs::create_dir_all(&agents_dir)?;
        std::fs::create_dir_all(&fragments_dir)?;
        std::fs::create_dir_all(&state_dir)?;

        Ok(Self {
            tempdir,
            agents_dir,
            fragments_dir,
            state_dir,
        })
    }

    /// Project root.
    pub fn project_path(&self) -> &Path {
        self.tempdir.path()
    }

    /// Writes `prompts/<identifier>.md`, creating parent directories.
    pub fn write_fragment(&self, identifier: &str, body: &str) -> std::io::Result<PathBuf> {
        let path = self.fragments_dir.join(format!("{identifier}.md"));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, body)?;
        Ok(path)
    }

    /// Writes `agents/<name>.json` with the given JSON text.
    pub fn write_agent(&self, name: &str, json: &str) -> std::io::Result<PathBuf> {
        let path = self.agent_path(name);
        std::fs::write(&path, json)?;
        Ok(path)
    }

    pub fn agent_path(&self, name: &str) -> PathBuf {
        self.agents_dir.join(format!("{name}.json"))
    }

    /// Writes an arbitrary file relative to the project root.
    pub fn write_file(&self, relative: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.tempdir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}
