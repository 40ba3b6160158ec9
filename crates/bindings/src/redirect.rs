//! Redirects for URLs of bindings about to be removed.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use storefront_catalog::Catalog;
use storefront_core::DomainError;

use crate::categories::{CategoryResolver, is_leaf};
use crate::error::{BindingError, BindingResult};
use crate::model::{CategoryBinding, CategoryBindingId, ProductBinding, ProductBindingId, UrlId, UrlTarget};
use crate::store::BindingRepository;

/// URLs of one removed binding and where they now lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub binding: ProductBindingId,
    pub urls: Vec<UrlId>,
    /// `None` when no active leaf category was available; the URLs are then
    /// dropped together with the binding.
    pub category_binding: Option<CategoryBindingId>,
}

/// Categories to consider for `binding`: freshly resolved, or the last stored
/// set when its product is gone from the catalog.
fn candidates(
    repo: &dyn BindingRepository,
    resolver: &CategoryResolver<'_>,
    binding: &ProductBinding,
) -> BindingResult<Vec<CategoryBinding>> {
    match resolver.resolve(repo, binding) {
        Err(BindingError::Domain(DomainError::NotFound(_))) => Ok(binding
            .category_bindings()
            .iter()
            .filter_map(|id| repo.category_binding(*id))
            .collect()),
        other => other,
    }
}

/// Point every URL of each binding at its first active leaf category binding.
///
/// Must run while bindings, categories and URLs all still exist.
pub fn redirect_existing_urls(
    repo: &mut dyn BindingRepository,
    catalog: &dyn Catalog,
    resolver: &CategoryResolver<'_>,
    bindings: &[ProductBinding],
) -> BindingResult<Vec<Redirect>> {
    let mut redirects = Vec::new();
    for binding in bindings {
        let urls: Vec<UrlId> = repo
            .urls_targeting(UrlTarget::Product(binding.id_typed()))
            .iter()
            .map(|url| url.id_typed())
            .collect();
        if urls.is_empty() {
            continue;
        }

        let target = candidates(repo, resolver, binding)?
            .into_iter()
            .find(|candidate| candidate.is_active() && is_leaf(repo, catalog, candidate));

        match &target {
            Some(category) => {
                repo.retarget_urls(&urls, UrlTarget::Category(category.id_typed()), true);
                info!(
                    binding_id = %binding.id_typed(),
                    category_binding_id = %category.id_typed(),
                    urls = urls.len(),
                    "urls redirected to category"
                );
            }
            None => warn!(
                binding_id = %binding.id_typed(),
                urls = urls.len(),
                "no active leaf category to redirect to; urls will be dropped"
            ),
        }
        redirects.push(Redirect {
            binding: binding.id_typed(),
            urls,
            category_binding: target.map(|category| category.id_typed()),
        });
    }
    Ok(redirects)
}

/// Remove URLs still targeting the given bindings.
pub fn drop_orphaned_urls(repo: &mut dyn BindingRepository, bindings: &[ProductBindingId]) -> usize {
    let orphaned: Vec<UrlId> = bindings
        .iter()
        .flat_map(|id| repo.urls_targeting(UrlTarget::Product(*id)))
        .map(|url| url.id_typed())
        .collect();
    if orphaned.is_empty() {
        return 0;
    }
    repo.remove_urls(&orphaned)
}
