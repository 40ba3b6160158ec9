//! Storefront binding records.
//!
//! A [`ProductBinding`] is the storefront projection of one catalog product for
//! one (channel, language) pair. Its derived fields (display name, slug, SEO
//! title, category set) are only ever written by the engine; callers change the
//! inputs and trigger a recompute.

use serde::{Deserialize, Serialize};

use storefront_catalog::{CategoryId, LanguageCode, ProductId, VariantId};
use storefront_core::{ChannelId, Entity, ValueObject, aggregate_newtype};

aggregate_newtype!(
    /// Identifier of a product binding.
    ProductBindingId
);

aggregate_newtype!(
    /// Identifier of a variant binding.
    VariantBindingId
);

aggregate_newtype!(
    /// Identifier of a category binding.
    CategoryBindingId
);

aggregate_newtype!(
    /// Identifier of an inbound URL record.
    UrlId
);

/// URL key of a binding, unique within its language.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Callers must pass an already slugified, non-empty key.
    pub(crate) fn from_key(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Slug {}

impl core::fmt::Display for Slug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pass-through presentation content. Stored verbatim, never derived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingContent {
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
}

/// Storefront projection of a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductBinding {
    pub(crate) id: ProductBindingId,
    pub(crate) channel: ChannelId,
    pub(crate) product: ProductId,
    pub(crate) language: LanguageCode,
    pub(crate) active: bool,
    pub(crate) override_name: Option<String>,
    pub(crate) seo_title_override: Option<String>,
    pub(crate) content: BindingContent,

    pub(crate) display_name: String,
    pub(crate) slug: Option<Slug>,
    pub(crate) seo_title: String,
    pub(crate) category_bindings: Vec<CategoryBindingId>,
}

impl ProductBinding {
    pub(crate) fn new(
        id: ProductBindingId,
        channel: ChannelId,
        product: ProductId,
        language: LanguageCode,
    ) -> Self {
        Self {
            id,
            channel,
            product,
            language,
            active: true,
            override_name: None,
            seo_title_override: None,
            content: BindingContent::default(),
            display_name: String::new(),
            slug: None,
            seo_title: String::new(),
            category_bindings: Vec::new(),
        }
    }

    pub fn id_typed(&self) -> ProductBindingId {
        self.id
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn product(&self) -> ProductId {
        self.product
    }

    pub fn language(&self) -> &LanguageCode {
        &self.language
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn override_name(&self) -> Option<&str> {
        self.override_name.as_deref()
    }

    pub fn seo_title_override(&self) -> Option<&str> {
        self.seo_title_override.as_deref()
    }

    pub fn content(&self) -> &BindingContent {
        &self.content
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn slug(&self) -> Option<&Slug> {
        self.slug.as_ref()
    }

    /// Manual SEO title when set, the built one otherwise.
    pub fn seo_title(&self) -> &str {
        self.seo_title_override
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(self.seo_title.as_str())
    }

    /// Category bindings of the product's categories and their ancestors, most specific first.
    pub fn category_bindings(&self) -> &[CategoryBindingId] {
        &self.category_bindings
    }

    /// Key the storage layer keeps unique.
    pub fn unique_key(&self) -> (ChannelId, ProductId, &LanguageCode) {
        (self.channel, self.product, &self.language)
    }
}

impl Entity for ProductBinding {
    type Id = ProductBindingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Projection of one product variant, owned by one product binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantBinding {
    pub(crate) id: VariantBindingId,
    pub(crate) variant: VariantId,
    pub(crate) product_binding: ProductBindingId,
    pub(crate) active: bool,
}

impl VariantBinding {
    pub fn id_typed(&self) -> VariantBindingId {
        self.id
    }

    pub fn variant(&self) -> VariantId {
        self.variant
    }

    pub fn product_binding(&self) -> ProductBindingId {
        self.product_binding
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Entity for VariantBinding {
    type Id = VariantBindingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Projection of a catalog category for a (channel, language) scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBinding {
    pub(crate) id: CategoryBindingId,
    pub(crate) category: CategoryId,
    pub(crate) channel: ChannelId,
    pub(crate) language: LanguageCode,
    pub(crate) active: bool,
}

impl CategoryBinding {
    pub fn new(category: CategoryId, channel: ChannelId, language: LanguageCode) -> Self {
        Self {
            id: CategoryBindingId::generate(),
            category,
            channel,
            language,
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn id_typed(&self) -> CategoryBindingId {
        self.id
    }

    pub fn category(&self) -> CategoryId {
        self.category
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn language(&self) -> &LanguageCode {
        &self.language
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Entity for CategoryBinding {
    type Id = CategoryBindingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// What an inbound URL resolves to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum UrlTarget {
    Product(ProductBindingId),
    Category(CategoryBindingId),
}

/// Inbound URL. A redirect URL answers with a redirect to its target instead of
/// rendering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub(crate) id: UrlId,
    pub(crate) key: String,
    pub(crate) channel: ChannelId,
    pub(crate) language: LanguageCode,
    pub(crate) target: UrlTarget,
    pub(crate) redirect: bool,
}

impl UrlRecord {
    pub(crate) fn canonical(
        key: impl Into<String>,
        channel: ChannelId,
        language: LanguageCode,
        target: UrlTarget,
    ) -> Self {
        Self {
            id: UrlId::generate(),
            key: key.into(),
            channel,
            language,
            target,
            redirect: false,
        }
    }

    pub fn id_typed(&self) -> UrlId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn language(&self) -> &LanguageCode {
        &self.language
    }

    pub fn target(&self) -> UrlTarget {
        self.target
    }

    pub fn is_redirect(&self) -> bool {
        self.redirect
    }
}

impl Entity for UrlRecord {
    type Id = UrlId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
