//! Fragment stores: keyed lookup of named prompt text blocks.

use crate::error::PromptError;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Default file extension for fragments on disk.
pub const DEFAULT_FRAGMENT_EXTENSION: &str = "md";

/// Source of fragment bodies for prompt composition.
#[cfg_attr(test, automock)]
pub trait FragmentStore: Send + Sync {
    /// Returns the fragment body, or `None` if the store has no such fragment.
    fn load(&self, identifier: &str) -> Result<Option<String>, PromptError>;

    /// Human-readable description of where fragments are looked up.
    fn location(&self) -> String;
}

impl<T: FragmentStore + ?Sized> FragmentStore for &T {
    fn load(&self, identifier: &str) -> Result<Option<String>, PromptError> {
        (**self).load(identifier)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

/// Fragments stored as files under a root directory.
///
/// The identifier `policies/refunds` maps to `<root>/policies/refunds.md`.
#[derive(Debug, Clone)]
pub struct DirFragmentStore {
    root: PathBuf,
    extension: String,
}

impl DirFragmentStore {
    /// Creates a store rooted at `root` using the `.md` extension.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_FRAGMENT_EXTENSION.to_string(),
        }
    }

    /// Uses a different implicit extension (without the leading dot).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves an identifier to its file path.
    ///
    /// The extension is always appended, so `persona.md` names
    /// `persona.md.md`.
    pub fn path_for(&self, identifier: &str) -> Result<PathBuf, PromptError> {
        validate_identifier(identifier)?;
        Ok(self.root.join(format!("{identifier}.{}", self.extension)))
    }
}

fn validate_identifier(identifier: &str) -> Result<(), PromptError> {
    let invalid = identifier.is_empty()
        || identifier.starts_with('/')
        || identifier.contains('\\')
        || identifier
            .split('/')
            .any(|part| part.is_empty() || part == "." || part == "..");
    if invalid {
        return Err(PromptError::InvalidFragmentId(identifier.to_string()));
    }
    Ok(())
}

impl FragmentStore for DirFragmentStore {
    fn load(&self, identifier: &str) -> Result<Option<String>, PromptError> {
        let path = self.path_for(identifier)?;
        match fs::read_to_string(&path) {
            Ok(body) => {
                debug!(fragment = identifier, path = %path.display(), "loaded fragment");
                Ok(Some(body))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PromptError::Io { path, source }),
        }
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

/// Fragments held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFragmentStore {
    fragments: BTreeMap<String, String>,
}

impl MemoryFragmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identifier: impl Into<String>, body: impl Into<String>) {
        self.fragments.insert(identifier.into(), body.into());
    }

    pub fn with(mut self, identifier: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(identifier, body);
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryFragmentStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fragments: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl FragmentStore for MemoryFragmentStore {
    fn load(&self, identifier: &str) -> Result<Option<String>, PromptError> {
        Ok(self.fragments.get(identifier).cloned())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}
