//! `storefront-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no storage or IO concerns)
//! shared by the catalog and the storefront binding engine.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, ChannelId};
pub use value_object::ValueObject;
