//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, arity, uniqueness). Storage mechanics belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested record was not found (domain-level).
    #[error("not found: {0}")]
    NotFound(String),

    /// An operation that needs an exact number of records got a different count.
    #[error("{operation} expects {expected} record(s), got {found}")]
    Arity {
        operation: &'static str,
        expected: usize,
        found: usize,
    },

    /// A record would duplicate an existing unique key.
    #[error("uniqueness violation: {0}")]
    UniquenessViolation(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn uniqueness(msg: impl Into<String>) -> Self {
        Self::UniquenessViolation(msg.into())
    }

    /// Fails unless exactly one record was supplied to `operation`.
    pub fn ensure_one(operation: &'static str, found: usize) -> DomainResult<()> {
        if found == 1 {
            Ok(())
        } else {
            Err(Self::Arity {
                operation,
                expected: 1,
                found,
            })
        }
    }
}
