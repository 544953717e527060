//! The fixed table of synchronized fields and the shared sync shape.
//!
//! Both sides of a comparison are reduced to the same document before
//! hashing:
//!
//! ```json
//! { "agent": { "name": "...", "voice_speed": 1.0 },
//!   "llm":   { "model": "...", "prompt": "..." } }
//! ```
//!
//! Absent fields are omitted, so "missing" and "null" hash the same.

use crate::canonical::MAX_EXACT_FLOAT_INT;
use crate::config::AgentConfig;
use crate::error::SyncError;
use crate::remote::{json_type, FieldValue, RemoteAgent, RemoteDocument};
use serde_json::{Map, Value};
use std::fmt;

/// Top-level section of the sync shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Agent,
    Llm,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Llm => "llm",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted JSON type of a synchronized field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Integer,
    Bool,
    List,
}

impl FieldKind {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => {
                value.is_u64()
                    || value.as_f64().is_some_and(|f| {
                        f >= 0.0 && f.fract() == 0.0 && f < MAX_EXACT_FLOAT_INT
                    })
            }
            Self::Bool => value.is_boolean(),
            Self::List => value.is_array(),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::Text => "a string",
            Self::Number => "a number",
            Self::Integer => "a non-negative integer",
            Self::Bool => "a boolean",
            Self::List => "an array",
        }
    }
}

/// One comparable field: where it lives locally and remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncField {
    pub section: Section,
    /// Key in the local configuration (under `llm` for [`Section::Llm`])
    /// and in the sync shape.
    pub key: &'static str,
    /// Keys tried in the remote document, first present wins.
    pub remote_keys: &'static [&'static str],
    pub kind: FieldKind,
}

impl SyncField {
    const fn new(
        section: Section,
        key: &'static str,
        remote_keys: &'static [&'static str],
        kind: FieldKind,
    ) -> Self {
        Self {
            section,
            key,
            remote_keys,
            kind,
        }
    }

    /// Dotted path, e.g. `agent.voice_speed`.
    pub fn path(&self) -> String {
        format!("{}.{}", self.section, self.key)
    }

    /// Reads this field from the remote documents.
    pub fn remote_value(&self, remote: &RemoteAgent) -> FieldValue {
        let doc: &RemoteDocument = match self.section {
            Section::Agent => &remote.agent,
            Section::Llm => &remote.llm,
        };
        doc.first_present(self.remote_keys)
    }

    /// Reads this field from a serialized local configuration.
    pub fn local_value(&self, config: &Value) -> FieldValue {
        let container = match self.section {
            Section::Agent => Some(config),
            Section::Llm => config.get("llm"),
        };
        FieldValue::from_option(container.and_then(|c| c.get(self.key)))
    }

    /// Writes `value` at this field's local location.
    pub(crate) fn set_local(&self, config: &mut Value, value: Value) -> Result<(), SyncError> {
        if !self.kind.accepts(&value) {
            return Err(SyncError::malformed(
                self.section.as_str(),
                self.remote_keys.first().copied().unwrap_or(self.key),
                format!(
                    "must be {}, found {}",
                    self.kind.describe(),
                    json_type(&value)
                ),
            ));
        }
        // u64 fields do not deserialize from `300.0`
        let value = match (self.kind, value.as_f64()) {
            (FieldKind::Integer, Some(f)) if !value.is_u64() => Value::from(f as u64),
            _ => value,
        };
        let container = match self.section {
            Section::Agent => Some(config),
            Section::Llm => config.get_mut("llm"),
        };
        match container.and_then(Value::as_object_mut) {
            Some(map) => {
                map.insert(self.key.to_string(), value);
                Ok(())
            }
            None => Err(SyncError::InvalidConfig(format!(
                "cannot set '{}': section is not an object",
                self.path()
            ))),
        }
    }
}

/// Every scalar and array field compared between local and remote, in
/// report order. The prompt is handled separately.
pub const SYNC_FIELDS: &[SyncField] = &[
    SyncField::new(Section::Agent, "name", &["name"], FieldKind::Text),
    SyncField::new(Section::Agent, "voice_id", &["voice_id"], FieldKind::Text),
    SyncField::new(Section::Agent, "language", &["language"], FieldKind::Text),
    SyncField::new(Section::Agent, "first_message", &["first_message"], FieldKind::Text),
    SyncField::new(Section::Agent, "voice_speed", &["voice_speed", "speed"], FieldKind::Number),
    SyncField::new(
        Section::Agent,
        "voice_stability",
        &["voice_stability", "stability"],
        FieldKind::Number,
    ),
    SyncField::new(
        Section::Agent,
        "voice_similarity_boost",
        &["voice_similarity_boost", "similarity_boost"],
        FieldKind::Number,
    ),
    SyncField::new(
        Section::Agent,
        "max_duration_seconds",
        &["max_duration_seconds"],
        FieldKind::Integer,
    ),
    SyncField::new(
        Section::Agent,
        "enable_interruptions",
        &["enable_interruptions"],
        FieldKind::Bool,
    ),
    SyncField::new(Section::Agent, "record_voice", &["record_voice"], FieldKind::Bool),
    SyncField::new(Section::Llm, "model", &["model", "llm"], FieldKind::Text),
    SyncField::new(Section::Llm, "temperature", &["temperature"], FieldKind::Number),
    SyncField::new(Section::Llm, "max_tokens", &["max_tokens"], FieldKind::Integer),
    SyncField::new(Section::Llm, "tools", &["tools"], FieldKind::List),
];

/// Key of the prompt text inside the `llm` section of the sync shape.
pub const PROMPT_KEY: &str = "prompt";

/// Field values of one side, aligned with [`SYNC_FIELDS`].
pub type FieldValues = Vec<(&'static SyncField, FieldValue)>;

/// Reads every synchronized field from a local configuration.
pub fn local_field_values(config: &AgentConfig) -> Result<FieldValues, SyncError> {
    let value = serde_json::to_value(config)?;
    Ok(SYNC_FIELDS
        .iter()
        .map(|field| (field, field.local_value(&value)))
        .collect())
}

/// Reads every synchronized field from the remote documents.
pub fn remote_field_values(remote: &RemoteAgent) -> FieldValues {
    SYNC_FIELDS
        .iter()
        .map(|field| (field, field.remote_value(remote)))
        .collect()
}

/// Builds the `{agent, llm}` document hashed for sync comparison.
pub fn sync_shape(values: &FieldValues, prompt: &str) -> Value {
    let mut agent = Map::new();
    let mut llm = Map::new();
    for (field, value) in values {
        if let FieldValue::Present(v) = value {
            let section = match field.section {
                Section::Agent => &mut agent,
                Section::Llm => &mut llm,
            };
            section.insert(field.key.to_string(), v.clone());
        }
    }
    llm.insert(PROMPT_KEY.to_string(), Value::String(prompt.to_string()));

    let mut shape = Map::new();
    shape.insert(Section::Agent.as_str().to_string(), Value::Object(agent));
    shape.insert(Section::Llm.as_str().to_string(), Value::Object(llm));
    Value::Object(shape)
}
