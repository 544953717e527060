//! Loosely-typed remote documents and explicit field presence.

use crate::canonical::canonical_json;
use crate::error::SyncError;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Name of the remote agent-settings document.
pub const AGENT_DOCUMENT: &str = "agent";
/// Name of the remote LLM-settings document.
pub const LLM_DOCUMENT: &str = "llm";

/// A field value after normalization: missing and `null` are both `Absent`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Absent,
    Present(Value),
}

impl FieldValue {
    pub fn from_option(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Absent,
            Some(v) => Self::Present(v.clone()),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Absent => None,
            Self::Present(v) => Some(v),
        }
    }

    /// JSON equality: key order and `1` vs `1.0` do not matter.
    pub fn same_as(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (Self::Absent, Self::Absent) => true,
            (Self::Present(a), Self::Present(b)) => canonical_json(a) == canonical_json(b),
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("(absent)"),
            Self::Present(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent => serializer.serialize_none(),
            Self::Present(v) => v.serialize(serializer),
        }
    }
}

/// One remote document, read defensively field by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteDocument {
    fields: Map<String, Value>,
}

impl RemoteDocument {
    /// Wraps a JSON object; anything else is malformed.
    pub fn from_value(document: &str, value: Value) -> Result<Self, SyncError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(SyncError::malformed(
                document,
                "<root>",
                format!("must be a JSON object, found {}", json_type(&other)),
            )),
        }
    }

    pub fn field(&self, key: &str) -> FieldValue {
        FieldValue::from_option(self.fields.get(key))
    }

    /// Value of the first key that is present.
    pub fn first_present(&self, keys: &[&str]) -> FieldValue {
        keys.iter()
            .map(|key| self.field(key))
            .find(FieldValue::is_present)
            .unwrap_or(FieldValue::Absent)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.field(key).is_present()
    }
}

/// The two remote documents describing one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteAgent {
    pub agent: RemoteDocument,
    pub llm: RemoteDocument,
    prompt: String,
}

/// Keys under which the remote LLM document may carry the prompt text.
pub const REMOTE_PROMPT_KEYS: &[&str] = &["prompt", "system_prompt"];

impl RemoteAgent {
    /// Validates and wraps the remote agent and LLM documents.
    ///
    /// Both must be JSON objects and the LLM document must carry the prompt
    /// as a string; every other field is optional.
    pub fn from_documents(agent: Value, llm: Value) -> Result<Self, SyncError> {
        let agent = RemoteDocument::from_value(AGENT_DOCUMENT, agent)?;
        let llm = RemoteDocument::from_value(LLM_DOCUMENT, llm)?;
        let prompt = match llm.first_present(REMOTE_PROMPT_KEYS) {
            FieldValue::Present(Value::String(text)) => text,
            FieldValue::Present(other) => {
                return Err(SyncError::malformed(
                    LLM_DOCUMENT,
                    "prompt",
                    format!("must be a string, found {}", json_type(&other)),
                ))
            }
            FieldValue::Absent => {
                return Err(SyncError::malformed(LLM_DOCUMENT, "prompt", "is missing"))
            }
        };
        Ok(Self { agent, llm, prompt })
    }

    /// Remote prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_and_missing_are_both_absent() {
        let doc = RemoteDocument::from_value("agent", json!({"a": null, "b": 0})).unwrap();
        assert_eq!(doc.field("a"), FieldValue::Absent);
        assert_eq!(doc.field("missing"), FieldValue::Absent);
        assert_eq!(doc.field("b"), FieldValue::Present(json!(0)));
        assert!(FieldValue::Absent.same_as(&doc.field("a")));
    }

    #[test]
    fn numbers_compare_by_value() {
        let a = FieldValue::Present(json!(1.0));
        let b = FieldValue::Present(json!(1));
        assert!(a.same_as(&b));
        assert!(!a.same_as(&FieldValue::Present(json!(1.2))));
        assert!(!a.same_as(&FieldValue::Absent));
    }

    #[test]
    fn first_present_skips_null_aliases() {
        let doc = RemoteDocument::from_value("agent", json!({"voice_speed": null, "speed": 1.1}))
            .unwrap();
        assert_eq!(
            doc.first_present(&["voice_speed", "speed"]),
            FieldValue::Present(json!(1.1))
        );
    }

    #[test]
    fn non_object_documents_are_malformed() {
        let err = RemoteAgent::from_documents(json!([]), json!({"prompt": "p"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed remote agent document: field '<root>' must be a JSON object, found an array"
        );
    }

    #[test]
    fn prompt_is_required_and_must_be_text() {
        let missing = RemoteAgent::from_documents(json!({}), json!({"model": "m"})).unwrap_err();
        assert!(matches!(
            missing,
            SyncError::MalformedRemoteDocument { ref field, .. } if field == "prompt"
        ));

        let wrong = RemoteAgent::from_documents(json!({}), json!({"prompt": 3})).unwrap_err();
        assert!(wrong.to_string().contains("must be a string"));

        let aliased =
            RemoteAgent::from_documents(json!({}), json!({"system_prompt": "hi"})).unwrap();
        assert_eq!(aliased.prompt(), "hi");
    }

    #[test]
    fn field_value_serializes_absent_as_null() {
        assert_eq!(serde_json::to_value(FieldValue::Absent).unwrap(), json!(null));
        assert_eq!(
            serde_json::to_value(FieldValue::Present(json!([1]))).unwrap(),
            json!([1])
        );
        assert_eq!(FieldValue::Absent.to_string(), "(absent)");
        assert_eq!(FieldValue::Present(json!("x")).to_string(), "\"x\"");
    }
}
