//! Prompt composition for agentsync.
//!
//! Builds a final prompt from an ordered list of named fragments and applies
//! exactly one of four variable-substitution rules: only `static` variables
//! are substituted locally, while `override`, `dynamic`, and `system`
//! placeholders are left for the remote service.
//!
//! # Examples
//!
//! ```
//! use agentsync_prompt::{compose, MemoryFragmentStore, PromptSpec};
//!
//! let store = MemoryFragmentStore::new()
//!     .with("persona", "You are the {{company}} assistant.")
//!     .with("caller", "The caller is {{customer_name}}.");
//!
//! let spec = PromptSpec::new(["persona", "caller"])
//!     .with_literal("company", "Acme")
//!     .with_override("customer_name");
//!
//! let prompt = compose(&store, &spec).unwrap();
//! assert_eq!(
//!     prompt,
//!     "You are the Acme assistant.\n\nThe caller is {{customer_name}}."
//! );
//! ```

#![deny(unsafe_code)]

pub mod compose;
pub mod error;
pub mod spec;
pub mod store;
pub mod variables;

pub use compose::{assemble, compose, compose_validated, substitute_static, FRAGMENT_SEPARATOR};
pub use error::PromptError;
pub use spec::{DynamicVariable, DynamicVariableType, PromptSpec, VariableValue, OVERRIDE_SENTINEL};
pub use store::{DirFragmentStore, FragmentStore, MemoryFragmentStore};
pub use variables::{
    classify, ensure_valid, extract_placeholders, validate, SystemNames, VariableClassification,
    VariableKind, BUILTIN_SYSTEM_VARIABLES,
};
