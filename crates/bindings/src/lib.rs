//! Storefront binding engine.
//!
//! Keeps storefront projections of catalog products in sync: variant bindings,
//! language-scoped slugs, category membership, display name and SEO title,
//! active-state cascade, and URL redirects when a binding goes away.
//! [`BindingService`] is the entry point; the other modules are the engine steps
//! it composes, usable on their own against any [`BindingRepository`].

pub mod cascade;
pub mod categories;
pub mod error;
pub mod events;
pub mod model;
pub mod naming;
pub mod recompute;
pub mod redirect;
pub mod service;
pub mod settings;
pub mod slug;
pub mod store;
pub mod urls;
pub mod variants;

pub use cascade::{Acknowledgement, ActivationReport, CascadeReport};
pub use categories::{CategoryResolver, CategoryRoots, DirectCategory, WithExtraCategories};
pub use error::{BindingError, BindingResult, StoreError, StoreResult};
pub use events::BindingEvent;
pub use model::{
    BindingContent, CategoryBinding, CategoryBindingId, ProductBinding, ProductBindingId, Slug,
    UrlId, UrlRecord, UrlTarget, VariantBinding, VariantBindingId,
};
pub use service::{
    BindingChange, BindingDefaults, BindingField, BindingService, NewProductBinding, UnlinkReport,
};
pub use settings::{SlugSettings, StorefrontSettings};
pub use store::{BindingRepository, InMemoryStore, StoreState, TransactionalStore};
