//! Prompt composition: fragments in order, then static substitution.

use crate::error::PromptError;
use crate::spec::{PromptSpec, VariableValue};
use crate::store::FragmentStore;
use crate::variables::{
    classify_name, ensure_valid, replace_placeholders, SystemNames, VariableKind,
};
use tracing::debug;

/// Separator placed between consecutive fragments.
pub const FRAGMENT_SEPARATOR: &str = "\n\n";

/// Joins the fragments of `spec` in order without substituting anything.
///
/// An inline override takes the place of the stored fragment of the same
/// identifier. The first fragment the store cannot resolve aborts assembly.
pub fn assemble<S: FragmentStore + ?Sized>(
    store: &S,
    spec: &PromptSpec,
) -> Result<String, PromptError> {
    let mut parts = Vec::with_capacity(spec.fragments.len());
    for identifier in &spec.fragments {
        if let Some(text) = spec.overrides.get(identifier) {
            parts.push(text.clone());
            continue;
        }
        match store.load(identifier)? {
            Some(body) => parts.push(body),
            None => {
                return Err(PromptError::FragmentNotFound {
                    identifier: identifier.clone(),
                    directory: store.location(),
                })
            }
        }
    }
    Ok(parts.join(FRAGMENT_SEPARATOR))
}

/// Replaces every `static` placeholder of `text` with its literal value.
///
/// Override, dynamic, and system placeholders are left verbatim. Each
/// occurrence is replaced in place, so a literal containing `{{name}}` is
/// inserted as is.
pub fn substitute_static(text: &str, spec: &PromptSpec) -> String {
    replace_placeholders(text, |name| {
        if classify_name(name, &spec.variables, &spec.dynamic_variables) != VariableKind::Static {
            return None;
        }
        match spec.variables.get(name) {
            Some(VariableValue::Literal(value)) => Some(value.as_str()),
            _ => None,
        }
    })
}

/// Assembles the fragments and substitutes static variables.
pub fn compose<S: FragmentStore + ?Sized>(
    store: &S,
    spec: &PromptSpec,
) -> Result<String, PromptError> {
    let assembled = assemble(store, spec)?;
    let composed = substitute_static(&assembled, spec);
    debug!(
        fragments = spec.fragments.len(),
        bytes = composed.len(),
        "composed prompt"
    );
    Ok(composed)
}

/// Like [`compose`], but first checks the variable contract of the assembled text.
pub fn compose_validated<S: FragmentStore + ?Sized>(
    store: &S,
    spec: &PromptSpec,
    system: &SystemNames,
) -> Result<String, PromptError> {
    let assembled = assemble(store, spec)?;
    ensure_valid(&assembled, spec, system)?;
    Ok(substitute_static(&assembled, spec))
}
