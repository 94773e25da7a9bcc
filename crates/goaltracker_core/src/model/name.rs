//! Name normalization shared by goals and habits.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Validation errors for user-entered names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Name is empty or whitespace-only.
    BlankName(&'static str),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName(kind) => write!(f, "the {kind} name must not be blank"),
        }
    }
}

impl Error for ModelValidationError {}

/// Trims a name and collapses inner whitespace runs to a single space.
///
/// `kind` is only used to label the error (`goal` / `habit`).
pub fn normalize_name(raw: &str, kind: &'static str) -> Result<String, ModelValidationError> {
    let collapsed = WHITESPACE_RUN_RE.replace_all(raw.trim(), " ");
    if collapsed.is_empty() {
        return Err(ModelValidationError::BlankName(kind));
    }
    Ok(collapsed.into_owned())
}

/// Returns whether a raw input would survive normalization.
pub fn is_blank(raw: &str) -> bool {
    raw.trim().is_empty()
}
