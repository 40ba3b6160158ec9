//! Engine error model.

use thiserror::Error;

use storefront_core::DomainError;

/// Result type returned by storage implementations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type returned by every binding operation.
pub type BindingResult<T> = Result<T, BindingError>;

/// Failure raised by the storage layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An insert or update would duplicate a unique key.
    #[error("unique constraint {constraint} violated: {detail}")]
    UniqueConstraint {
        constraint: &'static str,
        detail: String,
    },

    /// An update targeted a row that does not exist.
    #[error("missing record: {0}")]
    MissingRecord(String),

    /// Internal lock poisoning; the store can no longer be trusted.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Failure of a binding lifecycle operation.
///
/// Any error aborts the enclosing transaction; nothing written before the
/// failure is kept.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store failure: {0}")]
    Store(StoreError),

    /// Publication failed after a successful commit (state is already written).
    #[error("event publication failed: {0}")]
    Publish(String),
}

impl From<StoreError> for BindingError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UniqueConstraint { constraint, detail } => BindingError::Domain(
                DomainError::uniqueness(format!("{constraint}: {detail}")),
            ),
            other => BindingError::Store(other),
        }
    }
}

impl BindingError {
    pub fn is_uniqueness_violation(&self) -> bool {
        matches!(self, BindingError::Domain(DomainError::UniquenessViolation(_)))
    }

    pub fn is_arity(&self) -> bool {
        matches!(self, BindingError::Domain(DomainError::Arity { .. }))
    }
}
