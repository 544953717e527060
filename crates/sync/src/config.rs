//! Local agent configuration schema.

use crate::error::SyncError;
use agentsync_prompt::{compose, FragmentStore, PromptError, PromptSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One agent as described in the local file tree.
///
/// ```
/// use agentsync_sync::{AgentConfig, PromptSource};
///
/// let config = AgentConfig::from_json(r#"{
///     "name": "support",
///     "voice_speed": 1.0,
///     "llm": { "model": "gpt-4o", "prompt": "You are helpful." }
/// }"#).unwrap();
///
/// assert_eq!(config.voice_speed, Some(1.0));
/// assert!(matches!(config.llm.prompt, PromptSource::Literal(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_stability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_similarity_boost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_interruptions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_voice: Option<bool>,
    pub llm: LlmConfig,
    /// Keys this schema does not know; kept verbatim, never synced.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Where the agent's prompt comes from. Exactly one source is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    /// Prompt text written out in full.
    Literal(String),
    /// Prompt composed from fragments.
    Composed(PromptSpec),
}

/// Language-model settings of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLlmConfig", into = "RawLlmConfig")]
pub struct LlmConfig {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u64>,
    pub tools: Option<Vec<Value>>,
    pub prompt: PromptSource,
}

impl LlmConfig {
    /// Settings with only a literal prompt.
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            model: None,
            temperature: None,
            max_tokens: None,
            tools: None,
            prompt: PromptSource::Literal(prompt.into()),
        }
    }

    /// Settings with only a composed prompt.
    pub fn with_spec(spec: PromptSpec) -> Self {
        Self {
            prompt: PromptSource::Composed(spec),
            ..Self::with_prompt(String::new())
        }
    }
}

/// On-disk form of [`LlmConfig`]: `prompt` and `prompt_config` side by side.
#[derive(Serialize, Deserialize)]
struct RawLlmConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prompt_config: Option<PromptSpec>,
}

impl TryFrom<RawLlmConfig> for LlmConfig {
    type Error = String;

    fn try_from(raw: RawLlmConfig) -> Result<Self, Self::Error> {
        let prompt = match (raw.prompt, raw.prompt_config) {
            (Some(text), None) => PromptSource::Literal(text),
            (None, Some(spec)) => PromptSource::Composed(spec),
            (Some(_), Some(_)) => {
                return Err("llm must set either 'prompt' or 'prompt_config', not both".into())
            }
            (None, None) => {
                return Err("llm must set one of 'prompt' or 'prompt_config'".into());
            }
        };
        Ok(Self {
            model: raw.model,
            temperature: raw.temperature,
            max_tokens: raw.max_tokens,
            tools: raw.tools,
            prompt,
        })
    }
}

impl From<LlmConfig> for RawLlmConfig {
    fn from(llm: LlmConfig) -> Self {
        let (prompt, prompt_config) = match llm.prompt {
            PromptSource::Literal(text) => (Some(text), None),
            PromptSource::Composed(spec) => (None, Some(spec)),
        };
        Self {
            model: llm.model,
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            tools: llm.tools,
            prompt,
            prompt_config,
        }
    }
}

impl AgentConfig {
    /// Minimal configuration with a literal prompt.
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::with_llm(name, LlmConfig::with_prompt(prompt))
    }

    pub fn with_llm(name: impl Into<String>, llm: LlmConfig) -> Self {
        Self {
            name: name.into(),
            voice_id: None,
            language: None,
            first_message: None,
            voice_speed: None,
            voice_stability: None,
            voice_similarity_boost: None,
            max_duration_seconds: None,
            enable_interruptions: None,
            record_voice: None,
            llm,
            extra: BTreeMap::new(),
        }
    }

    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SyncError> {
        serde_json::from_str(text).map_err(|e| SyncError::InvalidConfig(e.to_string()))
    }

    /// Loads a configuration file.
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let text = fs::read_to_string(path).map_err(|source| SyncError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|e| match e {
            SyncError::InvalidConfig(msg) => {
                SyncError::InvalidConfig(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Pretty JSON with a trailing newline, as written to disk.
    pub fn to_json_pretty(&self) -> Result<String, SyncError> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    pub fn uses_composed_prompt(&self) -> bool {
        matches!(self.llm.prompt, PromptSource::Composed(_))
    }

    /// The prompt text that would be pushed to the remote service.
    pub fn prompt_text<S: FragmentStore + ?Sized>(&self, store: &S) -> Result<String, PromptError> {
        match &self.llm.prompt {
            PromptSource::Literal(text) => Ok(text.clone()),
            PromptSource::Composed(spec) => compose(store, spec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentsync_prompt::MemoryFragmentStore;
    use serde_json::json;

    #[test]
    fn literal_prompt_round_trips() {
        let text = r#"{"name":"a","llm":{"model":"gpt-4o","prompt":"hi"}}"#;
        let config = AgentConfig::from_json(text).unwrap();
        assert_eq!(config.llm.prompt, PromptSource::Literal("hi".into()));

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value, json!({"name": "a", "llm": {"model": "gpt-4o", "prompt": "hi"}}));
    }

    #[test]
    fn composed_prompt_round_trips() {
        let text = r#"{"name":"a","llm":{"prompt_config":{"fragments":["x"]}}}"#;
        let config = AgentConfig::from_json(text).unwrap();
        assert!(config.uses_composed_prompt());

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["llm"]["prompt_config"]["fragments"], json!(["x"]));
        assert!(value["llm"].get("prompt").is_none());
    }

    #[test]
    fn both_prompt_sources_are_rejected() {
        let err = AgentConfig::from_json(
            r#"{"name":"a","llm":{"prompt":"p","prompt_config":{"fragments":[]}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not both"), "{err}");
    }

    #[test]
    fn missing_prompt_source_is_rejected() {
        let err = AgentConfig::from_json(r#"{"name":"a","llm":{"model":"m"}}"#).unwrap_err();
        assert!(matches!(err, SyncError::InvalidConfig(_)));
        assert!(err.to_string().contains("one of"), "{err}");
    }

    #[test]
    fn unknown_keys_are_preserved() {
        let text =
            r#"{"name":"a","llm":{"prompt":"p"},"platform_settings":{"widget":{"color":"red"}}}"#;
        let config = AgentConfig::from_json(text).unwrap();
        assert_eq!(config.extra["platform_settings"]["widget"]["color"], "red");

        let out = config.to_json_pretty().unwrap();
        assert!(out.contains("platform_settings"));
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn prompt_text_composes_specs() {
        let store = MemoryFragmentStore::new().with("hello", "Hello {{x}}");
        let spec = PromptSpec::new(["hello"]).with_literal("x", "Acme");
        let config = AgentConfig::with_llm("a", LlmConfig::with_spec(spec));
        assert_eq!(config.prompt_text(&store).unwrap(), "Hello Acme");

        let literal = AgentConfig::new("b", "Plain");
        assert_eq!(literal.prompt_text(&store).unwrap(), "Plain");
    }

    #[test]
    fn load_reports_path_on_schema_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, r#"{"llm":{"prompt":"p"}}"#).unwrap();
        let err = AgentConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"), "{err}");
        assert!(err.to_string().contains("name"), "{err}");
    }
}
