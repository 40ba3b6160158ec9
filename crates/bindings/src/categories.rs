//! Category hierarchy resolution.
//!
//! A binding belongs to the category bindings of its product's categories and
//! of all their ancestors, restricted to the binding's own channel and language.

use std::collections::HashSet;

use storefront_catalog::{CatalogProduct, Catalog, CategoryId, LanguageCode};
use storefront_core::{ChannelId, DomainError, DomainResult};

use crate::error::BindingResult;
use crate::model::{CategoryBinding, ProductBinding};
use crate::store::BindingRepository;

/// Which catalog categories a product exposes as roots of its hierarchy.
///
/// The default is the product's single category. Product types grouping several
/// categories (kits, packs) plug in their own implementation.
pub trait CategoryRoots: Send + Sync {
    fn category_roots(&self, product: &CatalogProduct) -> Vec<CategoryId> {
        product.category().into_iter().collect()
    }
}

/// The product's own category only.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectCategory;

impl CategoryRoots for DirectCategory {}

/// The product's category followed by its extra categories.
#[derive(Debug, Clone, Copy, Default)]
pub struct WithExtraCategories;

impl CategoryRoots for WithExtraCategories {
    fn category_roots(&self, product: &CatalogProduct) -> Vec<CategoryId> {
        let mut seen = HashSet::new();
        product
            .category()
            .into_iter()
            .chain(product.extra_categories().iter().copied())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// Search scope for the ancestors of one category, seen from one binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryScope {
    /// The category and its ancestors, nearest first.
    pub categories: Vec<CategoryId>,
    pub channel: ChannelId,
    pub language: LanguageCode,
}

/// Scope of `category`'s ancestors for exactly one binding.
pub fn parent_category_scope(
    records: &[ProductBinding],
    category: CategoryId,
    catalog: &dyn Catalog,
) -> DomainResult<CategoryScope> {
    DomainError::ensure_one("parent_category_scope", records.len())?;
    let record = &records[0];
    Ok(CategoryScope {
        categories: catalog.ancestors_or_self(category),
        channel: record.channel(),
        language: record.language().clone(),
    })
}

/// Resolves the category set of product bindings.
pub struct CategoryResolver<'a> {
    catalog: &'a dyn Catalog,
    roots: &'a dyn CategoryRoots,
}

impl<'a> CategoryResolver<'a> {
    pub fn new(catalog: &'a dyn Catalog, roots: &'a dyn CategoryRoots) -> Self {
        Self { catalog, roots }
    }

    /// Category bindings of every root and its ancestors, most specific first,
    /// without duplicates. Inactive category bindings are included.
    pub fn resolve(
        &self,
        repo: &dyn BindingRepository,
        binding: &ProductBinding,
    ) -> BindingResult<Vec<CategoryBinding>> {
        let product = self
            .catalog
            .product(binding.product())
            .ok_or_else(|| DomainError::not_found(format!("catalog product {}", binding.product())))?;

        let mut seen = HashSet::new();
        let mut resolved = Vec::new();
        for root in self.roots.category_roots(&product) {
            let scope = parent_category_scope(std::slice::from_ref(binding), root, self.catalog)?;
            for found in repo.category_bindings_in_scope(&scope.categories, scope.channel, &scope.language) {
                if seen.insert(found.id_typed()) {
                    resolved.push(found);
                }
            }
        }
        Ok(resolved)
    }
}

/// A category binding is a leaf when no active binding of a child category
/// exists in its scope.
pub fn is_leaf(repo: &dyn BindingRepository, catalog: &dyn Catalog, binding: &CategoryBinding) -> bool {
    let children = catalog.child_categories(binding.category());
    if children.is_empty() {
        return true;
    }
    !repo
        .category_bindings_in_scope(&children, binding.channel(), binding.language())
        .iter()
        .any(CategoryBinding::is_active)
}
