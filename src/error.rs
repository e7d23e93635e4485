//! Error types for registration and chain execution.
//!
//! Handler and operation failures travel as [`anyhow::Error`] so that the
//! caller sees the same error currency whether it came from a handler or
//! from the original operation. Handler failures are wrapped in
//! [`HandlerError`]; the handler's own error stays reachable through
//! [`std::error::Error::source`], `anyhow::Error::root_cause` or
//! `anyhow::Error::downcast_ref`.

use std::fmt;
use thiserror::Error;

/// Why a path template could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternErrorKind {
    #[error("template is empty")]
    Empty,
    #[error("missing parameter name at offset {0}")]
    MissingName(usize),
    #[error("duplicate parameter name `{0}`")]
    DuplicateName(String),
    #[error("unbalanced group starting at offset {0}")]
    UnbalancedGroup(usize),
    #[error("empty group at offset {0}")]
    EmptyGroup(usize),
    #[error("group at offset {0} cannot start with `?`")]
    GroupModifier(usize),
    #[error("capturing group at offset {0}, use `(?:...)` inside a parameter pattern")]
    CapturingGroup(usize),
    #[error("unterminated `{{` at offset {0}")]
    UnterminatedBrace(usize),
    #[error("regex rejected: {0}")]
    Regex(String),
}

/// A path template the pattern matcher cannot compile.
///
/// Raised synchronously by registration, never deferred to invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid path pattern `{template}`: {kind}")]
pub struct InvalidPatternError {
    /// The template as given to the matcher
    pub template: String,
    /// What was wrong with it
    pub kind: PatternErrorKind,
}

impl InvalidPatternError {
    #[must_use]
    pub fn new(template: impl Into<String>, kind: PatternErrorKind) -> Self {
        Self {
            template: template.into(),
            kind,
        }
    }
}

/// A registered handler failed, either by returning `Err` or because its
/// pending future resolved to `Err`.
///
/// The chain for that invocation is aborted: no later binding runs and the
/// original operation is not called.
#[derive(Debug, Error)]
#[error("`{operation}` handler bound to `{template}` failed")]
pub struct HandlerError {
    /// Operation whose chain was running
    pub operation: String,
    /// Template of the binding whose handler failed
    pub template: String,
    /// The handler's own error
    #[source]
    pub source: anyhow::Error,
}

impl HandlerError {
    #[must_use]
    pub fn new(operation: &str, template: &str, source: anyhow::Error) -> Self {
        Self {
            operation: operation.to_string(),
            template: template.to_string(),
            source,
        }
    }
}

/// Call convention of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationMode {
    /// Returns its result directly
    Blocking,
    /// Delivers its result through a completion callback
    Deferred,
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationMode::Blocking => write!(f, "blocking"),
            OperationMode::Deferred => write!(f, "deferred"),
        }
    }
}

/// Errors raised by the router itself, as opposed to handlers or operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    InvalidPattern(#[from] InvalidPatternError),

    #[error("operation `{0}` is not present in the operation table")]
    UnknownOperation(String),

    #[error("operation `{operation}` is {actual} and cannot be called in {requested} mode")]
    ModeMismatch {
        operation: String,
        actual: OperationMode,
        requested: OperationMode,
    },

    #[error("no async runtime available to run the `{0}` handler chain")]
    NoRuntime(String),

    #[error("operation `{0}` dropped its completion callback without calling it")]
    Abandoned(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_message() {
        let err = InvalidPatternError::new("/:", PatternErrorKind::MissingName(1));
        assert_eq!(
            err.to_string(),
            "invalid path pattern `/:`: missing parameter name at offset 1"
        );
    }

    #[test]
    fn test_handler_error_keeps_source() {
        let err = HandlerError::new("stat", "/:file", anyhow::anyhow!("some error"));
        let err = anyhow::Error::from(err);
        assert_eq!(err.root_cause().to_string(), "some error");
        assert!(err.downcast_ref::<HandlerError>().is_some());
        assert_eq!(err.to_string(), "`stat` handler bound to `/:file` failed");
    }

    #[test]
    fn test_mode_mismatch_message() {
        let err = DispatchError::ModeMismatch {
            operation: "stat".to_string(),
            actual: OperationMode::Deferred,
            requested: OperationMode::Blocking,
        };
        assert_eq!(
            err.to_string(),
            "operation `stat` is deferred and cannot be called in blocking mode"
        );
    }
}
