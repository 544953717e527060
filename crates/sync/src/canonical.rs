//! Canonical serialization and content fingerprints.
//!
//! Object keys are sorted at every depth, arrays keep their order, and
//! integral floats are written as integers, so two documents that are deep
//! equal always hash the same regardless of how they were built.

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};
use std::fmt::{self, Write};

/// Tag of the digest algorithm currently in use.
pub const FINGERPRINT_ALGORITHM: &str = "sha256";

// Largest magnitude at which every integer is exactly representable as f64.
pub(crate) const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Tagged content digest, e.g. `sha256:9f86d0…`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Parses a stored fingerprint, checking the `algorithm:hex` form.
    pub fn parse(s: &str) -> Result<Self, SyncError> {
        let Some((algorithm, hex)) = s.split_once(':') else {
            return Err(SyncError::InvalidFingerprint(s.to_string()));
        };
        let valid = algorithm == FINGERPRINT_ALGORITHM
            && hex.len() == 64
            && hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if !valid {
            return Err(SyncError::InvalidFingerprint(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn algorithm(&self) -> &str {
        self.0.split_once(':').map(|(a, _)| a).unwrap_or_default()
    }

    pub fn hex(&self) -> &str {
        self.0.split_once(':').map(|(_, h)| h).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `len` hex digits, for compact display.
    pub fn short(&self, len: usize) -> &str {
        let hex = self.hex();
        &hex[..len.min(hex.len())]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = SyncError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}

/// Computes the fingerprint of a structured document.
pub fn fingerprint(document: &Value) -> Fingerprint {
    let canonical = canonical_json(document);
    Fingerprint(format!(
        "{FINGERPRINT_ALGORITHM}:{}",
        hash_content(canonical.as_bytes())
    ))
}

/// Fingerprint of a plain text, hashed as a JSON string document.
pub fn fingerprint_text(text: &str) -> Fingerprint {
    fingerprint(&Value::String(text.to_string()))
}

/// Compares two possibly-missing fingerprints.
///
/// Two missing fingerprints are equal; one missing is never equal.
pub fn fingerprints_equal(a: Option<&Fingerprint>, b: Option<&Fingerprint>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Computes a SHA-256 hash of the given content, returning a lowercase hex string.
pub fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Serializes `value` in canonical form: sorted keys, no insignificant whitespace.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(n, out),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
    }
}

fn write_number(n: &Number, out: &mut String) {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < MAX_EXACT_FLOAT_INT {
                let _ = write!(out, "{}", f as i64);
                return;
            }
        }
    }
    let _ = write!(out, "{n}");
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
