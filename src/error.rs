//! Engine errors.
//!
//! Every failure is synchronous and terminates the current invocation (or, for
//! declaration errors, the setup of a registry). The hosting layer decides how
//! to surface them; [`ScopeError::is_input_error`] separates bad request input
//! from configuration mistakes.

use crate::ValueType;

#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    // Input errors
    #[error("scope `{scope}` expects {expected} but received {found}")]
    TypeMismatch { scope: String, expected: ValueType, found: &'static str },

    // Declaration errors
    #[error("scope `{0}` is already declared")]
    DuplicateDeclaration(String),

    #[error("invalid scope name `{0}`")]
    InvalidName(String),

    #[error("scope `{0}` declares `using` keys but is not hash-typed")]
    UsingWithoutHash(String),

    #[error("scope `{0}` is boolean-typed and cannot allow blank values")]
    BlankBoolean(String),

    // Context lookups
    #[error("scope `{scope}` references unknown predicate `{name}`")]
    UnknownPredicate { scope: String, name: String },

    #[error("scope `{scope}` references unknown default computation `{name}`")]
    UnknownDefault { scope: String, name: String },

    // Collection errors
    #[error("collection has no scope method `{0}`")]
    UnknownMethod(String),

    #[error("scope `{scope}` failed: {message}")]
    Transform { scope: String, message: String },

    #[error("invalid scope manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl ScopeError {
    /// Stable identifier for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::DuplicateDeclaration(_) => "DUPLICATE_DECLARATION",
            Self::InvalidName(_) => "INVALID_NAME",
            Self::UsingWithoutHash(_) => "USING_WITHOUT_HASH",
            Self::BlankBoolean(_) => "BLANK_BOOLEAN",
            Self::UnknownPredicate { .. } => "UNKNOWN_PREDICATE",
            Self::UnknownDefault { .. } => "UNKNOWN_DEFAULT",
            Self::UnknownMethod(_) => "UNKNOWN_METHOD",
            Self::Transform { .. } => "TRANSFORM_FAILED",
            Self::Manifest(_) => "INVALID_MANIFEST",
        }
    }

    /// True when the error was caused by request input rather than by the
    /// declarations or the collection.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }

    /// Failure raised from inside a custom transform.
    pub fn transform(scope: &str, message: impl Into<String>) -> Self {
        Self::Transform { scope: scope.to_string(), message: message.into() }
    }
}
