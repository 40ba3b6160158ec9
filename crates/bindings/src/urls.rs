//! Canonical URL bookkeeping for product bindings.

use tracing::debug;

use crate::error::BindingResult;
use crate::model::{ProductBinding, UrlId, UrlRecord, UrlTarget};
use crate::store::BindingRepository;

/// Outcome of aligning a binding's URLs with its slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSync {
    /// Canonical URL now serving the slug.
    pub canonical: UrlId,
    /// Whether `canonical` was created (or revived from a redirect) by this call.
    pub changed: bool,
    /// Former canonical URLs of the binding, now redirects to it.
    pub demoted: Vec<UrlId>,
    /// Redirects of other targets that held the slug's key and were dropped.
    pub replaced: Vec<UrlId>,
}

/// Make the binding's slug its single canonical URL.
///
/// Existing URLs are reused when the key already points at the binding. Older
/// canonical URLs stay as redirects to the binding. A binding without a slug
/// has nothing to sync.
pub fn sync_canonical_url(
    repo: &mut dyn BindingRepository,
    binding: &ProductBinding,
) -> BindingResult<Option<UrlSync>> {
    let Some(slug) = binding.slug() else {
        return Ok(None);
    };
    let target = UrlTarget::Product(binding.id_typed());
    let owned = repo.urls_targeting(target);
    let same_key = |url: &UrlRecord| {
        url.key() == slug.as_str()
            && url.channel() == binding.channel()
            && url.language() == binding.language()
    };

    let mut replaced = Vec::new();
    let (canonical, changed) = match owned.iter().find(|url| same_key(*url)) {
        Some(url) if !url.is_redirect() => (url.id_typed(), false),
        Some(url) => {
            repo.retarget_urls(&[url.id_typed()], target, false);
            (url.id_typed(), true)
        }
        None => {
            // A stale redirect of another record may still hold the key.
            replaced = repo
                .urls_with_key(binding.channel(), binding.language(), slug.as_str())
                .into_iter()
                .filter(UrlRecord::is_redirect)
                .map(|url| url.id_typed())
                .collect();
            if !replaced.is_empty() {
                repo.remove_urls(&replaced);
            }
            let url = UrlRecord::canonical(
                slug.as_str(),
                binding.channel(),
                binding.language().clone(),
                target,
            );
            let id = url.id_typed();
            repo.insert_url(url)?;
            (id, true)
        }
    };

    let demoted = demote_stale_urls(repo, binding);

    if changed || !demoted.is_empty() {
        debug!(
            binding_id = %binding.id_typed(),
            key = %slug,
            demoted = demoted.len(),
            "canonical url synchronized"
        );
    }
    Ok(Some(UrlSync { canonical, changed, demoted, replaced }))
}

/// Turn the binding's canonical URLs whose key is not its slug into redirects
/// to it, releasing those keys for other bindings.
pub fn demote_stale_urls(repo: &mut dyn BindingRepository, binding: &ProductBinding) -> Vec<UrlId> {
    let Some(slug) = binding.slug() else {
        return Vec::new();
    };
    let target = UrlTarget::Product(binding.id_typed());
    let stale: Vec<UrlId> = repo
        .urls_targeting(target)
        .iter()
        .filter(|url| !url.is_redirect() && url.key() != slug.as_str())
        .map(UrlRecord::id_typed)
        .collect();
    if !stale.is_empty() {
        repo.retarget_urls(&stale, target, true);
    }
    stale
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_catalog::{LanguageCode, ProductId};
    use storefront_core::ChannelId;

    use crate::model::{ProductBindingId, Slug};
    use crate::store::StoreState;

    fn binding_with_slug(key: &str) -> ProductBinding {
        let mut binding = ProductBinding::new(
            ProductBindingId::generate(),
            ChannelId::new(),
            ProductId::generate(),
            LanguageCode::new("en_US").unwrap(),
        );
        binding.slug = Some(Slug::from_key(key.to_string()));
        binding
    }

    fn owned(repo: &StoreState, binding: &ProductBinding) -> Vec<(String, bool)> {
        repo.urls_targeting(UrlTarget::Product(binding.id_typed()))
            .into_iter()
            .map(|url| (url.key().to_string(), url.is_redirect()))
            .collect()
    }

    #[test]
    fn first_sync_creates_a_canonical_url() {
        let mut repo = StoreState::new();
        let binding = binding_with_slug("blue-shirt");

        let sync = sync_canonical_url(&mut repo, &binding).unwrap().unwrap();
        assert!(sync.changed);
        assert_eq!(owned(&repo, &binding), vec![("blue-shirt".to_string(), false)]);
    }

    #[test]
    fn unchanged_slug_reuses_the_existing_url() {
        let mut repo = StoreState::new();
        let binding = binding_with_slug("blue-shirt");
        let first = sync_canonical_url(&mut repo, &binding).unwrap().unwrap();
        let second = sync_canonical_url(&mut repo, &binding).unwrap().unwrap();

        assert_eq!(first.canonical, second.canonical);
        assert!(!second.changed);
        assert_eq!(repo.urls().len(), 1);
    }

    #[test]
    fn renamed_slug_demotes_the_old_url_to_a_redirect() {
        let mut repo = StoreState::new();
        let mut binding = binding_with_slug("blue-shirt");
        sync_canonical_url(&mut repo, &binding).unwrap();

        binding.slug = Some(Slug::from_key("navy-shirt".to_string()));
        let sync = sync_canonical_url(&mut repo, &binding).unwrap().unwrap();

        assert_eq!(sync.demoted.len(), 1);
        assert_eq!(
            owned(&repo, &binding),
            vec![("blue-shirt".to_string(), true), ("navy-shirt".to_string(), false)]
        );
    }

    #[test]
    fn returning_to_an_old_slug_revives_its_url() {
        let mut repo = StoreState::new();
        let mut binding = binding_with_slug("blue-shirt");
        let original = sync_canonical_url(&mut repo, &binding).unwrap().unwrap();
        binding.slug = Some(Slug::from_key("navy-shirt".to_string()));
        sync_canonical_url(&mut repo, &binding).unwrap();

        binding.slug = Some(Slug::from_key("blue-shirt".to_string()));
        let sync = sync_canonical_url(&mut repo, &binding).unwrap().unwrap();

        assert_eq!(sync.canonical, original.canonical);
        assert_eq!(repo.urls().len(), 2);
        assert_eq!(
            owned(&repo, &binding),
            vec![("blue-shirt".to_string(), false), ("navy-shirt".to_string(), true)]
        );
    }

    #[test]
    fn stale_redirect_of_another_binding_gives_up_its_key() {
        let mut repo = StoreState::new();
        let mut previous = binding_with_slug("mug");
        sync_canonical_url(&mut repo, &previous).unwrap();
        previous.slug = Some(Slug::from_key("big-mug".to_string()));
        sync_canonical_url(&mut repo, &previous).unwrap();

        let mut next = binding_with_slug("mug");
        next.channel = previous.channel();
        let sync = sync_canonical_url(&mut repo, &next).unwrap().unwrap();

        assert_eq!(sync.replaced.len(), 1);
        assert_eq!(owned(&repo, &next), vec![("mug".to_string(), false)]);
        assert_eq!(owned(&repo, &previous), vec![("big-mug".to_string(), false)]);
    }

    #[test]
    fn demoting_first_frees_a_key_for_a_swap() {
        let mut repo = StoreState::new();
        let mut mug = binding_with_slug("mug");
        let mut cup = binding_with_slug("cup");
        cup.channel = mug.channel();
        sync_canonical_url(&mut repo, &mug).unwrap();
        sync_canonical_url(&mut repo, &cup).unwrap();

        mug.slug = Some(Slug::from_key("cup".to_string()));
        cup.slug = Some(Slug::from_key("mug".to_string()));
        assert_eq!(demote_stale_urls(&mut repo, &mug).len(), 1);
        assert_eq!(demote_stale_urls(&mut repo, &cup).len(), 1);
        sync_canonical_url(&mut repo, &mug).unwrap();
        sync_canonical_url(&mut repo, &cup).unwrap();

        assert_eq!(owned(&repo, &mug), vec![("cup".to_string(), false)]);
        assert_eq!(owned(&repo, &cup), vec![("mug".to_string(), false)]);
    }

    #[test]
    fn binding_without_slug_is_skipped() {
        let mut repo = StoreState::new();
        let mut binding = binding_with_slug("x");
        binding.slug = None;
        assert!(sync_canonical_url(&mut repo, &binding).unwrap().is_none());
    }
}
