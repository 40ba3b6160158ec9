//! Catalog domain module (source of truth).
//!
//! Products, variants, categories and sales channels as authored upstream. The
//! storefront binding engine only reads from here; it never writes back.

pub mod catalog;
pub mod category;
pub mod channel;
pub mod language;
pub mod product;

pub use catalog::{Catalog, InMemoryCatalog};
pub use category::{Category, CategoryId};
pub use channel::Channel;
pub use language::LanguageCode;
pub use product::{CatalogProduct, ProductId, ProductVariant, TranslatedText, VariantId};
