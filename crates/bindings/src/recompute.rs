//! Derived-field recomputation for product bindings.
//!
//! One pass refreshes display name, SEO title, category set and slug of a batch
//! of bindings, then aligns their canonical URLs. Slugs are computed for the
//! whole batch at once so collisions inside it are numbered deterministically.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use storefront_catalog::{Catalog, LanguageCode};
use storefront_core::DomainError;

use crate::cascade::load_bindings;
use crate::categories::{CategoryResolver, CategoryRoots};
use crate::error::BindingResult;
use crate::model::{ProductBinding, ProductBindingId};
use crate::naming::{build_seo_title, resolve_display_name};
use crate::settings::SlugSettings;
use crate::slug::{SlugGenerator, SlugRequest};
use crate::store::BindingRepository;
use crate::urls::{UrlSync, demote_stale_urls, sync_canonical_url};

/// One binding after recomputation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recomputed {
    pub binding: ProductBinding,
    /// Display name, slug or SEO title differ from the stored values.
    pub changed: bool,
    pub url: Option<UrlSync>,
}

pub struct Recomputer<'a> {
    catalog: &'a dyn Catalog,
    roots: &'a dyn CategoryRoots,
    slugs: &'a SlugSettings,
}

impl<'a> Recomputer<'a> {
    pub fn new(catalog: &'a dyn Catalog, roots: &'a dyn CategoryRoots, slugs: &'a SlugSettings) -> Self {
        Self { catalog, roots, slugs }
    }

    /// Recompute and persist the bindings in `ids` (duplicates ignored).
    pub fn recompute(
        &self,
        repo: &mut dyn BindingRepository,
        ids: &[ProductBindingId],
    ) -> BindingResult<Vec<Recomputed>> {
        let before = load_bindings(repo, ids)?;
        if before.is_empty() {
            return Ok(Vec::new());
        }

        let resolver = CategoryResolver::new(self.catalog, self.roots);
        let mut after = Vec::with_capacity(before.len());
        let mut requests = Vec::with_capacity(before.len());
        for stored in &before {
            let product = self
                .catalog
                .product(stored.product())
                .ok_or_else(|| DomainError::not_found(format!("catalog product {}", stored.product())))?;
            let channel = self
                .catalog
                .channel(stored.channel())
                .ok_or_else(|| DomainError::not_found(format!("channel {}", stored.channel())))?;

            let mut binding = stored.clone();
            binding.display_name = resolve_display_name(&binding, &product, &channel);
            binding.seo_title = build_seo_title(std::slice::from_ref(&binding), &channel)?;
            binding.category_bindings = resolver
                .resolve(repo, &binding)?
                .iter()
                .map(|category| category.id_typed())
                .collect();

            requests.push(SlugRequest {
                binding: binding.id_typed(),
                language: binding.language().clone(),
                name: binding.display_name.clone(),
                default_code: product.default_code().map(str::to_string),
                current: stored.slug().map(|slug| slug.as_str().to_string()),
            });
            after.push(binding);
        }

        let mut slugs = SlugGenerator::new(self.slugs).generate(&requests, &reserved_keys(repo, &before));

        // Every binding gives up its stale keys before any new key is inserted,
        // so keys can move between bindings of the batch.
        let mut updated = Vec::with_capacity(after.len());
        for mut binding in after {
            binding.slug = slugs.remove(&binding.id_typed());
            repo.update_product_binding(binding.clone())?;
            let demoted = demote_stale_urls(repo, &binding);
            updated.push((binding, demoted));
        }

        let mut out = Vec::with_capacity(updated.len());
        for (stored, (binding, mut demoted)) in before.iter().zip(updated) {
            let mut url = sync_canonical_url(repo, &binding)?;
            if let Some(sync) = url.as_mut() {
                demoted.append(&mut sync.demoted);
                sync.demoted = demoted;
            }

            let changed = stored.display_name() != binding.display_name()
                || stored.slug() != binding.slug()
                || stored.seo_title() != binding.seo_title();
            debug!(binding_id = %binding.id_typed(), changed, "product binding recomputed");
            out.push(Recomputed { binding, changed, url });
        }
        Ok(out)
    }
}

/// Slugs held by bindings outside `batch`, per language.
fn reserved_keys(
    repo: &dyn BindingRepository,
    batch: &[ProductBinding],
) -> HashMap<LanguageCode, HashSet<String>> {
    let in_batch: HashSet<ProductBindingId> = batch.iter().map(ProductBinding::id_typed).collect();
    let mut reserved: HashMap<LanguageCode, HashSet<String>> = HashMap::new();
    for other in repo.product_bindings() {
        if in_batch.contains(&other.id_typed()) {
            continue;
        }
        if let Some(slug) = other.slug() {
            reserved
                .entry(other.language().clone())
                .or_default()
                .insert(slug.as_str().to_string());
        }
    }
    reserved
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_catalog::{CatalogProduct, Category, CategoryId, Channel, InMemoryCatalog, ProductId};
    use storefront_core::ChannelId;

    use crate::categories::DirectCategory;
    use crate::model::{CategoryBinding, UrlTarget};
    use crate::store::StoreState;

    struct Fixture {
        catalog: InMemoryCatalog,
        repo: StoreState,
        channel: ChannelId,
        settings: SlugSettings,
    }

    fn en() -> LanguageCode {
        LanguageCode::new("en_US").unwrap()
    }

    fn fixture() -> Fixture {
        let catalog = InMemoryCatalog::new();
        let channel = ChannelId::new();
        catalog.upsert_channel(Channel::new(channel, "Web").with_public_name("Acme"));
        Fixture { catalog, repo: StoreState::new(), channel, settings: SlugSettings::default() }
    }

    fn bind(f: &mut Fixture, product: CatalogProduct) -> ProductBindingId {
        let binding = ProductBinding::new(ProductBindingId::generate(), f.channel, product.id_typed(), en());
        let id = binding.id_typed();
        f.catalog.upsert_product(product);
        f.repo.insert_product_binding(binding).unwrap();
        id
    }

    fn run(f: &mut Fixture, ids: &[ProductBindingId]) -> Vec<Recomputed> {
        Recomputer::new(&f.catalog, &DirectCategory, &f.settings)
            .recompute(&mut f.repo, ids)
            .unwrap()
    }

    #[test]
    fn derives_every_field_and_a_canonical_url() {
        let mut f = fixture();
        let category = CategoryId::generate();
        f.catalog.upsert_category(Category::root(category, "Shirts"));
        let category_binding = CategoryBinding::new(category, f.channel, en());
        let category_binding_id = category_binding.id_typed();
        f.repo.insert_category_binding(category_binding).unwrap();

        let id = bind(
            &mut f,
            CatalogProduct::new(ProductId::generate(), "Blue Shirt")
                .with_default_code("BS-01")
                .with_category(category),
        );
        let out = run(&mut f, &[id]);

        let stored = f.repo.product_binding(id).unwrap();
        assert!(out[0].changed);
        assert_eq!(stored.display_name(), "Blue Shirt");
        assert_eq!(stored.seo_title(), "Blue Shirt | Acme");
        assert_eq!(stored.slug().unwrap().as_str(), "blue-shirt-bs-01");
        assert_eq!(stored.category_bindings(), &[category_binding_id]);
        assert_eq!(f.repo.urls_targeting(UrlTarget::Product(id)).len(), 1);
    }

    #[test]
    fn second_pass_without_changes_is_stable() {
        let mut f = fixture();
        let id = bind(&mut f, CatalogProduct::new(ProductId::generate(), "Mug"));
        run(&mut f, &[id]);
        let again = run(&mut f, &[id]);

        assert!(!again[0].changed);
        assert_eq!(f.repo.product_binding(id).unwrap().slug().unwrap().as_str(), "mug");
        assert_eq!(f.repo.urls().len(), 1);
    }

    #[test]
    fn slugs_of_other_bindings_are_reserved() {
        let mut f = fixture();
        let first = bind(&mut f, CatalogProduct::new(ProductId::generate(), "Mug"));
        run(&mut f, &[first]);
        let second = bind(&mut f, CatalogProduct::new(ProductId::generate(), "Mug"));
        run(&mut f, &[second]);

        assert_eq!(f.repo.product_binding(first).unwrap().slug().unwrap().as_str(), "mug");
        assert_eq!(f.repo.product_binding(second).unwrap().slug().unwrap().as_str(), "mug-2");

        // Recomputing the first one alone keeps its key.
        run(&mut f, &[first]);
        assert_eq!(f.repo.product_binding(first).unwrap().slug().unwrap().as_str(), "mug");
    }

    fn slug_of(f: &Fixture, id: ProductBindingId) -> String {
        f.repo.product_binding(id).unwrap().slug().unwrap().as_str().to_string()
    }

    #[test]
    fn held_slug_survives_a_batch_with_a_renamed_twin() {
        let mut f = fixture();
        let cup = ProductId::generate();
        let renamed = bind(&mut f, CatalogProduct::new(cup, "Cup"));
        run(&mut f, &[renamed]);
        let holder = bind(&mut f, CatalogProduct::new(ProductId::generate(), "Mug"));
        run(&mut f, &[holder]);

        f.catalog.upsert_product(CatalogProduct::new(cup, "Mug"));
        run(&mut f, &[renamed]);
        assert_eq!(slug_of(&f, renamed), "mug-2");

        let out = run(&mut f, &[renamed, holder]);
        assert!(out.iter().all(|r| !r.changed));
        assert_eq!(slug_of(&f, holder), "mug");
        assert_eq!(slug_of(&f, renamed), "mug-2");
        assert_eq!(f.repo.urls().len(), 3);
    }

    #[test]
    fn keys_can_swap_inside_one_batch() {
        let mut f = fixture();
        let (mug, cup) = (ProductId::generate(), ProductId::generate());
        let first = bind(&mut f, CatalogProduct::new(mug, "Mug"));
        let second = bind(&mut f, CatalogProduct::new(cup, "Cup"));
        run(&mut f, &[first, second]);

        f.catalog.upsert_product(CatalogProduct::new(mug, "Cup"));
        f.catalog.upsert_product(CatalogProduct::new(cup, "Mug"));
        let out = run(&mut f, &[first, second]);

        assert_eq!(slug_of(&f, first), "cup");
        assert_eq!(slug_of(&f, second), "mug");
        assert!(out.iter().all(|r| r.url.as_ref().unwrap().changed));
        let canonical: Vec<_> = f
            .repo
            .urls_targeting(UrlTarget::Product(first))
            .into_iter()
            .map(|url| (url.key().to_string(), url.is_redirect()))
            .collect();
        assert_eq!(canonical, vec![("cup".to_string(), false)]);
    }

    #[test]
    fn missing_channel_is_not_found() {
        let mut f = fixture();
        let product = CatalogProduct::new(ProductId::generate(), "Orphan");
        let binding = ProductBinding::new(ProductBindingId::generate(), ChannelId::new(), product.id_typed(), en());
        let id = binding.id_typed();
        f.catalog.upsert_product(product);
        f.repo.insert_product_binding(binding).unwrap();

        let err = Recomputer::new(&f.catalog, &DirectCategory, &f.settings)
            .recompute(&mut f.repo, &[id])
            .unwrap_err();
        assert!(matches!(err, crate::BindingError::Domain(DomainError::NotFound(_))));
    }
}
