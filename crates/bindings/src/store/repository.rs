use storefront_catalog::{CategoryId, LanguageCode, ProductId, VariantId};
use storefront_core::ChannelId;

use crate::error::StoreResult;
use crate::model::{
    CategoryBinding, CategoryBindingId, ProductBinding, ProductBindingId, UrlId, UrlRecord,
    UrlTarget, VariantBinding, VariantBindingId,
};

/// Persistence contract for binding records.
///
/// Implementations must:
/// - enforce `(channel, product, language)` uniqueness for product bindings and
///   `(variant, product binding)` uniqueness for variant bindings as hard
///   constraints, failing with `StoreError::UniqueConstraint`;
/// - list rows in a stable order (the in-memory store uses insertion order);
/// - apply the `set_*` and `retarget_urls` writes as single set-oriented updates.
pub trait BindingRepository {
    // Product bindings

    fn product_binding(&self, id: ProductBindingId) -> Option<ProductBinding>;

    fn find_product_binding(
        &self,
        channel: ChannelId,
        product: ProductId,
        language: &LanguageCode,
    ) -> Option<ProductBinding>;

    fn product_bindings(&self) -> Vec<ProductBinding>;

    fn insert_product_binding(&mut self, binding: ProductBinding) -> StoreResult<()>;

    /// Replace a stored binding; the unique key is checked again.
    fn update_product_binding(&mut self, binding: ProductBinding) -> StoreResult<()>;

    /// Returns the number of rows whose flag actually changed.
    fn set_product_bindings_active(&mut self, ids: &[ProductBindingId], active: bool) -> usize;

    fn remove_product_bindings(&mut self, ids: &[ProductBindingId]) -> usize;

    // Variant bindings

    fn variant_binding_exists(&self, variant: VariantId, owner: ProductBindingId) -> bool;

    fn insert_variant_binding(&mut self, binding: VariantBinding) -> StoreResult<()>;

    fn variant_bindings_of(&self, owners: &[ProductBindingId]) -> Vec<VariantBinding>;

    /// Set the flag on every variant binding owned by `owners`.
    fn set_variants_active(&mut self, owners: &[ProductBindingId], active: bool) -> usize;

    fn remove_variant_bindings(&mut self, ids: &[VariantBindingId]) -> usize;

    // Category bindings

    fn category_binding(&self, id: CategoryBindingId) -> Option<CategoryBinding>;

    fn insert_category_binding(&mut self, binding: CategoryBinding) -> StoreResult<()>;

    fn set_category_binding_active(&mut self, id: CategoryBindingId, active: bool) -> StoreResult<()>;

    /// Bindings of `categories` in the given scope, in the order of `categories`.
    fn category_bindings_in_scope(
        &self,
        categories: &[CategoryId],
        channel: ChannelId,
        language: &LanguageCode,
    ) -> Vec<CategoryBinding>;

    // URLs

    fn urls_targeting(&self, target: UrlTarget) -> Vec<UrlRecord>;

    fn urls_with_key(&self, channel: ChannelId, language: &LanguageCode, key: &str) -> Vec<UrlRecord>;

    fn insert_url(&mut self, url: UrlRecord) -> StoreResult<()>;

    /// Point `ids` at `target` and set their redirect flag.
    fn retarget_urls(&mut self, ids: &[UrlId], target: UrlTarget, redirect: bool) -> usize;

    fn remove_urls(&mut self, ids: &[UrlId]) -> usize;
}
