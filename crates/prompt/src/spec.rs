//! Prompt specification types.
//!
//! A [`PromptSpec`] describes how a final prompt is assembled from named
//! fragments, optional inline overrides, and declared variables.
//!
//! ```
//! use agentsync_prompt::{PromptSpec, VariableValue};
//!
//! let spec: PromptSpec = serde_json::from_str(r#"{
//!     "fragments": ["persona/base", "policies/refunds"],
//!     "variables": { "company": "Acme", "customer_name": "OVERRIDE" }
//! }"#).unwrap();
//!
//! assert_eq!(spec.fragments.len(), 2);
//! assert_eq!(spec.variables["customer_name"], VariableValue::Override);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// On-disk marker for a variable the remote service substitutes per call.
pub const OVERRIDE_SENTINEL: &str = "OVERRIDE";

/// Value of a declared variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawVariableValue", into = "String")]
pub enum VariableValue {
    /// Substituted into the prompt at composition time.
    Literal(String),
    /// Left verbatim; the remote service fills it per call.
    Override,
}

impl VariableValue {
    /// Returns the literal text, if this is a literal.
    pub fn literal(&self) -> Option<&str> {
        match self {
            Self::Literal(text) => Some(text),
            Self::Override => None,
        }
    }
}

impl From<VariableValue> for String {
    fn from(value: VariableValue) -> Self {
        match value {
            VariableValue::Literal(text) => text,
            VariableValue::Override => OVERRIDE_SENTINEL.to_string(),
        }
    }
}

impl From<&str> for VariableValue {
    fn from(text: &str) -> Self {
        if text == OVERRIDE_SENTINEL {
            Self::Override
        } else {
            Self::Literal(text.to_string())
        }
    }
}

/// Accepted JSON forms for a declared variable value.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawVariableValue {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl From<RawVariableValue> for VariableValue {
    fn from(raw: RawVariableValue) -> Self {
        match raw {
            RawVariableValue::Text(text) => VariableValue::from(text.as_str()),
            RawVariableValue::Number(n) => VariableValue::Literal(n.to_string()),
            RawVariableValue::Bool(b) => VariableValue::Literal(b.to_string()),
        }
    }
}

/// Declared type of a dynamic variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DynamicVariableType {
    String,
    Number,
    Integer,
    Boolean,
}

impl fmt::Display for DynamicVariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        };
        f.write_str(s)
    }
}

/// A variable whose value the remote service extracts at run time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicVariable {
    #[serde(rename = "type")]
    pub kind: DynamicVariableType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Structured description of a composed prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromptSpec {
    /// Fragment identifiers in presentation order.
    pub fragments: Vec<String>,
    /// Inline text used instead of loading the named fragment.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, VariableValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dynamic_variables: BTreeMap<String, DynamicVariable>,
}

impl PromptSpec {
    /// Creates a specification over the given fragments with no variables.
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Declares a literal variable.
    pub fn with_literal(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables
            .insert(name.into(), VariableValue::Literal(value.into()));
        self
    }

    /// Declares an override variable.
    pub fn with_override(mut self, name: impl Into<String>) -> Self {
        self.variables.insert(name.into(), VariableValue::Override);
        self
    }

    /// Declares a dynamic variable.
    pub fn with_dynamic(mut self, name: impl Into<String>, kind: DynamicVariableType) -> Self {
        self.dynamic_variables.insert(
            name.into(),
            DynamicVariable {
                kind,
                description: None,
            },
        );
        self
    }

    /// Replaces the content of one fragment with inline text.
    pub fn with_fragment_override(
        mut self,
        identifier: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.overrides.insert(identifier.into(), text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_sentinel_round_trips_as_variant() {
        let spec: PromptSpec = serde_json::from_str(
            r#"{"fragments": ["a"], "variables": {"x": "OVERRIDE", "y": "Acme"}}"#,
        )
        .unwrap();
        assert_eq!(spec.variables["x"], VariableValue::Override);
        assert_eq!(spec.variables["y"], VariableValue::Literal("Acme".into()));

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["variables"]["x"], "OVERRIDE");
        assert_eq!(json["variables"]["y"], "Acme");
    }

    #[test]
    fn non_string_literals_become_text() {
        let spec: PromptSpec = serde_json::from_str(
            r#"{"fragments": [], "variables": {"limit": 3, "strict": true, "ratio": 0.5}}"#,
        )
        .unwrap();
        assert_eq!(spec.variables["limit"].literal(), Some("3"));
        assert_eq!(spec.variables["strict"].literal(), Some("true"));
        assert_eq!(spec.variables["ratio"].literal(), Some("0.5"));
    }

    #[test]
    fn dynamic_variables_parse_type_and_description() {
        let spec: PromptSpec = serde_json::from_str(
            r#"{"fragments": ["a"], "dynamic_variables": {
                "order_id": {"type": "string", "description": "Order being discussed"}
            }}"#,
        )
        .unwrap();
        let var = &spec.dynamic_variables["order_id"];
        assert_eq!(var.kind, DynamicVariableType::String);
        assert_eq!(var.description.as_deref(), Some("Order being discussed"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = serde_json::from_str::<PromptSpec>(r#"{"fragments": [], "fragmnets": []}"#)
            .unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn builder_declares_each_kind() {
        let spec = PromptSpec::new(["a", "b"])
            .with_literal("x", "1")
            .with_override("y")
            .with_dynamic("z", DynamicVariableType::Number)
            .with_fragment_override("b", "inline");
        assert_eq!(spec.fragments, vec!["a", "b"]);
        assert_eq!(spec.variables.len(), 2);
        assert_eq!(spec.dynamic_variables.len(), 1);
        assert_eq!(spec.overrides["b"], "inline");
    }
}
