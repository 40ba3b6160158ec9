//! Storage boundary for binding records.
//!
//! The engine reads and writes through [`BindingRepository`]; a
//! [`TransactionalStore`] hands out a repository for the duration of one
//! lifecycle operation and commits it only if the operation succeeds.

pub mod memory;
pub mod repository;

use std::sync::Arc;

pub use memory::{InMemoryStore, StoreState};
pub use repository::BindingRepository;

use crate::error::StoreError;

/// All-or-nothing unit of work over a [`BindingRepository`].
pub trait TransactionalStore: Send + Sync {
    type Repository: BindingRepository;

    /// Run `f`; keep its writes only when it returns `Ok`.
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self::Repository) -> Result<T, E>,
        E: From<StoreError>;

    /// Read-only access to committed state.
    fn read<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Self::Repository) -> T;
}

impl<S> TransactionalStore for Arc<S>
where
    S: TransactionalStore,
{
    type Repository = S::Repository;

    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self::Repository) -> Result<T, E>,
        E: From<StoreError>,
    {
        (**self).transaction(f)
    }

    fn read<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Self::Repository) -> T,
    {
        (**self).read(f)
    }
}
