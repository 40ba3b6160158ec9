//! Read access to the catalog.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use storefront_core::ChannelId;

use crate::category::{Category, CategoryId};
use crate::channel::Channel;
use crate::product::{CatalogProduct, ProductId, ProductVariant, VariantId};

/// Read-only view of the catalog the binding engine derives from.
///
/// Listing methods return records in a stable order (insertion order for the
/// in-memory implementation) so derived choices stay deterministic.
pub trait Catalog: Send + Sync {
    fn product(&self, id: ProductId) -> Option<CatalogProduct>;

    /// All variants of `product`, inactive ones included.
    fn variants(&self, product: ProductId) -> Vec<ProductVariant>;

    fn category(&self, id: CategoryId) -> Option<Category>;

    /// Direct children of `id`.
    fn child_categories(&self, id: CategoryId) -> Vec<CategoryId>;

    fn channel(&self, id: ChannelId) -> Option<Channel>;

    fn channels(&self) -> Vec<Channel>;

    fn first_channel(&self) -> Option<Channel> {
        self.channels().into_iter().next()
    }

    /// `id` followed by its ancestors, nearest first ("parent_of" semantics).
    ///
    /// Unknown ids yield an empty list. A cycle in the parent chain stops the walk
    /// at the first repeated node.
    fn ancestors_or_self(&self, id: CategoryId) -> Vec<CategoryId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = self.category(id);
        while let Some(category) = cursor {
            if !seen.insert(category.id_typed()) {
                tracing::warn!(category = %category.id_typed(), "category parent chain loops");
                break;
            }
            chain.push(category.id_typed());
            cursor = category.parent().and_then(|parent| self.category(parent));
        }
        chain
    }
}

#[derive(Debug, Default)]
struct CatalogTables {
    products: HashMap<ProductId, CatalogProduct>,
    variants: Vec<ProductVariant>,
    categories: Vec<Category>,
    channels: Vec<Channel>,
}

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<CatalogTables>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_product(&self, product: CatalogProduct) {
        if let Ok(mut tables) = self.inner.write() {
            tables.products.insert(product.id_typed(), product);
        }
    }

    pub fn upsert_variant(&self, variant: ProductVariant) {
        if let Ok(mut tables) = self.inner.write() {
            match tables.variants.iter_mut().find(|v| v.id_typed() == variant.id_typed()) {
                Some(existing) => *existing = variant,
                None => tables.variants.push(variant),
            }
        }
    }

    pub fn upsert_category(&self, category: Category) {
        if let Ok(mut tables) = self.inner.write() {
            match tables.categories.iter_mut().find(|c| c.id_typed() == category.id_typed()) {
                Some(existing) => *existing = category,
                None => tables.categories.push(category),
            }
        }
    }

    pub fn upsert_channel(&self, channel: Channel) {
        if let Ok(mut tables) = self.inner.write() {
            match tables.channels.iter_mut().find(|c| c.id_typed() == channel.id_typed()) {
                Some(existing) => *existing = channel,
                None => tables.channels.push(channel),
            }
        }
    }

    pub fn variant(&self, id: VariantId) -> Option<ProductVariant> {
        let tables = self.inner.read().ok()?;
        tables.variants.iter().find(|v| v.id_typed() == id).cloned()
    }
}

impl Catalog for InMemoryCatalog {
    fn product(&self, id: ProductId) -> Option<CatalogProduct> {
        let tables = self.inner.read().ok()?;
        tables.products.get(&id).cloned()
    }

    fn variants(&self, product: ProductId) -> Vec<ProductVariant> {
        match self.inner.read() {
            Ok(tables) => tables
                .variants
                .iter()
                .filter(|v| v.product() == product)
                .cloned()
                .collect(),
            Err(_) => vec![],
        }
    }

    fn category(&self, id: CategoryId) -> Option<Category> {
        let tables = self.inner.read().ok()?;
        tables.categories.iter().find(|c| c.id_typed() == id).cloned()
    }

    fn child_categories(&self, id: CategoryId) -> Vec<CategoryId> {
        match self.inner.read() {
            Ok(tables) => tables
                .categories
                .iter()
                .filter(|c| c.parent() == Some(id))
                .map(Category::id_typed)
                .collect(),
            Err(_) => vec![],
        }
    }

    fn channel(&self, id: ChannelId) -> Option<Channel> {
        let tables = self.inner.read().ok()?;
        tables.channels.iter().find(|c| c.id_typed() == id).cloned()
    }

    fn channels(&self) -> Vec<Channel> {
        match self.inner.read() {
            Ok(tables) => tables.channels.clone(),
            Err(_) => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (InMemoryCatalog, CategoryId, CategoryId, CategoryId) {
        let catalog = InMemoryCatalog::new();
        let root = CategoryId::generate();
        let apparel = CategoryId::generate();
        let shirts = CategoryId::generate();
        catalog.upsert_category(Category::root(root, "All"));
        catalog.upsert_category(Category::child_of(apparel, "Apparel", root));
        catalog.upsert_category(Category::child_of(shirts, "Shirts", apparel));
        (catalog, root, apparel, shirts)
    }

    #[test]
    fn ancestors_or_self_walks_nearest_first() {
        let (catalog, root, apparel, shirts) = tree();
        assert_eq!(catalog.ancestors_or_self(shirts), vec![shirts, apparel, root]);
        assert_eq!(catalog.ancestors_or_self(root), vec![root]);
    }

    #[test]
    fn ancestors_of_unknown_category_is_empty() {
        let (catalog, ..) = tree();
        assert!(catalog.ancestors_or_self(CategoryId::generate()).is_empty());
    }

    #[test]
    fn ancestors_stop_on_a_cycle() {
        let catalog = InMemoryCatalog::new();
        let a = CategoryId::generate();
        let b = CategoryId::generate();
        catalog.upsert_category(Category::child_of(a, "A", b));
        catalog.upsert_category(Category::child_of(b, "B", a));

        assert_eq!(catalog.ancestors_or_self(a), vec![a, b]);
    }

    #[test]
    fn child_categories_lists_direct_children_only() {
        let (catalog, root, apparel, shirts) = tree();
        assert_eq!(catalog.child_categories(root), vec![apparel]);
        assert_eq!(catalog.child_categories(apparel), vec![shirts]);
        assert!(catalog.child_categories(shirts).is_empty());
    }

    #[test]
    fn first_channel_follows_insertion_order() {
        let catalog = InMemoryCatalog::new();
        assert!(catalog.first_channel().is_none());

        let first = ChannelId::new();
        catalog.upsert_channel(Channel::new(first, "Web"));
        catalog.upsert_channel(Channel::new(ChannelId::new(), "Marketplace"));

        assert_eq!(catalog.first_channel().map(|c| c.id_typed()), Some(first));
    }

    #[test]
    fn variants_include_inactive_ones_in_insertion_order() {
        let catalog = InMemoryCatalog::new();
        let product = ProductId::generate();
        let a = ProductVariant::new(VariantId::generate(), product);
        let b = ProductVariant::new(VariantId::generate(), product).inactive();
        let other = ProductVariant::new(VariantId::generate(), ProductId::generate());
        catalog.upsert_variant(a.clone());
        catalog.upsert_variant(other);
        catalog.upsert_variant(b.clone());

        assert_eq!(catalog.variants(product), vec![a, b]);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: a linear chain of N categories resolves to N ancestors, leaf first.
            #[test]
            fn chain_depth_matches_ancestor_count(depth in 1usize..40) {
                let catalog = InMemoryCatalog::new();
                let mut ids = Vec::with_capacity(depth);
                let mut parent = None;
                for i in 0..depth {
                    let id = CategoryId::generate();
                    let category = match parent {
                        Some(p) => Category::child_of(id, format!("c{i}").as_str(), p),
                        None => Category::root(id, "root"),
                    };
                    catalog.upsert_category(category);
                    ids.push(id);
                    parent = Some(id);
                }

                let leaf = *ids.last().unwrap();
                let chain = catalog.ancestors_or_self(leaf);
                ids.reverse();
                prop_assert_eq!(chain, ids);
            }
        }
    }
}
