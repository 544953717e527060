//! Placeholder extraction, classification, and validation.
//!
//! A placeholder is a name enclosed in double braces (`{{customer_name}}`).
//! There is no nesting and no escaping; names may contain `/` for
//! timezone-qualified system variables such as `{{system__time/Europe/Paris}}`.
//!
//! Every placeholder falls into exactly one class:
//!
//! | class      | declared as                     | substituted by        |
//! |------------|---------------------------------|-----------------------|
//! | `dynamic`  | `dynamic_variables` entry       | remote, per call      |
//! | `override` | `variables` entry = `OVERRIDE`  | remote, per call      |
//! | `static`   | `variables` entry = literal     | composition, locally  |
//! | `system`   | not declared                    | remote built-in       |

use crate::error::PromptError;
use crate::spec::{DynamicVariable, PromptSpec, VariableValue};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("valid regex"));

// system__time/<Area>[/<Location>...], e.g. system__time/America/Argentina/Salta
static TIMEZONE_SYSTEM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^system__time/[A-Za-z][A-Za-z0-9_+\-]*(?:/[A-Za-z0-9_+\-]+)*$")
        .expect("valid regex")
});

/// Built-in names the remote service fills in.
pub const BUILTIN_SYSTEM_VARIABLES: &[&str] = &[
    "system__agent_id",
    "system__conversation_id",
    "system__caller_id",
    "system__called_number",
    "system__call_duration_secs",
    "system__call_sid",
    "system__time",
    "system__time_utc",
    "system__timezone",
];

/// Substitution class of a single placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Static,
    Override,
    Dynamic,
    System,
}

/// Placeholders of a text bucketed by class, each in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariableClassification {
    #[serde(rename = "static")]
    pub static_vars: Vec<String>,
    #[serde(rename = "override")]
    pub override_vars: Vec<String>,
    #[serde(rename = "dynamic")]
    pub dynamic_vars: Vec<String>,
    #[serde(rename = "system")]
    pub system_vars: Vec<String>,
}

impl VariableClassification {
    /// Returns the bucket for one class.
    pub fn names(&self, kind: VariableKind) -> &[String] {
        match kind {
            VariableKind::Static => &self.static_vars,
            VariableKind::Override => &self.override_vars,
            VariableKind::Dynamic => &self.dynamic_vars,
            VariableKind::System => &self.system_vars,
        }
    }

    /// Total number of distinct placeholders.
    pub fn len(&self) -> usize {
        self.static_vars.len()
            + self.override_vars.len()
            + self.dynamic_vars.len()
            + self.system_vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Class of `name`, if it occurred in the classified text.
    pub fn kind_of(&self, name: &str) -> Option<VariableKind> {
        [
            VariableKind::Static,
            VariableKind::Override,
            VariableKind::Dynamic,
            VariableKind::System,
        ]
        .into_iter()
        .find(|kind| self.names(*kind).iter().any(|n| n == name))
    }

    fn push(&mut self, kind: VariableKind, name: String) {
        match kind {
            VariableKind::Static => self.static_vars.push(name),
            VariableKind::Override => self.override_vars.push(name),
            VariableKind::Dynamic => self.dynamic_vars.push(name),
            VariableKind::System => self.system_vars.push(name),
        }
    }
}

/// Returns every placeholder name in `text`, deduplicated, in first-seen order.
pub fn extract_placeholders(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PLACEHOLDER_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Rewrites every placeholder occurrence of `text` in a single pass.
///
/// `replacement` receives the placeholder name; `None` keeps the occurrence
/// verbatim. Replacement text is never rescanned.
pub(crate) fn replace_placeholders<'a, F>(text: &str, mut replacement: F) -> String
where
    F: FnMut(&str) -> Option<&'a str>,
{
    PLACEHOLDER_REGEX
        .replace_all(text, |caps: &regex::Captures<'_>| {
            replacement(&caps[1]).map_or_else(|| caps[0].to_string(), str::to_string)
        })
        .into_owned()
}

/// Determines the class of one name against the declarations.
pub fn classify_name(
    name: &str,
    variables: &BTreeMap<String, VariableValue>,
    dynamic_variables: &BTreeMap<String, DynamicVariable>,
) -> VariableKind {
    if dynamic_variables.contains_key(name) {
        return VariableKind::Dynamic;
    }
    match variables.get(name) {
        Some(VariableValue::Override) => VariableKind::Override,
        Some(VariableValue::Literal(_)) => VariableKind::Static,
        None => VariableKind::System,
    }
}

/// Buckets every placeholder occurring in `text`.
///
/// Declared names that never occur in `text` are not reported.
pub fn classify(
    text: &str,
    variables: &BTreeMap<String, VariableValue>,
    dynamic_variables: &BTreeMap<String, DynamicVariable>,
) -> VariableClassification {
    let mut out = VariableClassification::default();
    for name in extract_placeholders(text) {
        let kind = classify_name(&name, variables, dynamic_variables);
        out.push(kind, name);
    }
    out
}

/// Recognizes names the remote service provides without a declaration.
#[derive(Debug, Clone, Default)]
pub struct SystemNames {
    extra: HashSet<String>,
}

impl SystemNames {
    /// Built-in names only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in names plus the given additional names.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extra: extra.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_system(&self, name: &str) -> bool {
        BUILTIN_SYSTEM_VARIABLES.contains(&name)
            || TIMEZONE_SYSTEM_REGEX.is_match(name)
            || self.extra.contains(name)
    }
}

/// Checks the variable contract of an assembled prompt text.
///
/// Returns one message per problem; an empty list means the text is valid.
pub fn validate(text: &str, spec: &PromptSpec, system: &SystemNames) -> Vec<String> {
    validation_problems(text, spec, system)
        .into_iter()
        .map(|(_, message)| message)
        .collect()
}

/// Like [`validate`], but fails with every offending name at once.
pub fn ensure_valid(
    text: &str,
    spec: &PromptSpec,
    system: &SystemNames,
) -> Result<(), PromptError> {
    let problems = validation_problems(text, spec, system);
    if problems.is_empty() {
        return Ok(());
    }
    let mut names: Vec<String> = Vec::new();
    let mut messages = Vec::with_capacity(problems.len());
    for (name, message) in problems {
        if !names.contains(&name) {
            names.push(name);
        }
        messages.push(message);
    }
    Err(PromptError::VariableValidationFailed { names, messages })
}

fn validation_problems(
    text: &str,
    spec: &PromptSpec,
    system: &SystemNames,
) -> Vec<(String, String)> {
    let mut problems = Vec::new();

    for name in spec.variables.keys() {
        if spec.dynamic_variables.contains_key(name) {
            problems.push((
                name.clone(),
                format!("'{name}' is declared both as a variable and as a dynamic variable"),
            ));
        }
    }

    let placeholders = extract_placeholders(text);
    for name in &placeholders {
        let kind = classify_name(name, &spec.variables, &spec.dynamic_variables);
        if kind == VariableKind::System && !system.is_system(name) {
            problems.push((
                name.clone(),
                format!("'{{{{{name}}}}}' is not declared and is not a known system variable"),
            ));
        }
    }

    let used: HashSet<&str> = placeholders.iter().map(String::as_str).collect();
    for name in spec.variables.keys() {
        if !used.contains(name.as_str()) {
            problems.push((
                name.clone(),
                format!("variable '{name}' is declared but never used"),
            ));
        }
    }
    for name in spec.dynamic_variables.keys() {
        if !used.contains(name.as_str()) {
            problems.push((
                name.clone(),
                format!("dynamic variable '{name}' is declared but never used"),
            ));
        }
    }

    problems
}
