//! Lifecycle orchestration for product bindings.
//!
//! [`BindingService`] is the entry point the rest of the storefront talks to. Every
//! operation follows the same pipeline:
//!
//! 1. **Validate** inputs against the catalog (channel, product).
//! 2. **Transact**: run the engine steps against one repository transaction.
//! 3. **Commit**: the store keeps the writes only if every step succeeded.
//! 4. **Publish**: lifecycle events go to the bus after the commit.
//!
//! ## Error Semantics
//!
//! - **Domain errors** (arity, uniqueness, missing records) abort the transaction;
//!   nothing is written.
//! - **Publish errors** are reported as `BindingError::Publish`; the writes are
//!   already committed, so the caller may retry publication without redoing work.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use storefront_catalog::{Catalog, LanguageCode, ProductId};
use storefront_core::{ChannelId, DomainError};
use storefront_events::{EventBus, EventEnvelope};

use crate::cascade::{self, Acknowledgement, ActivationReport, load_bindings};
use crate::categories::{CategoryResolver, CategoryRoots, DirectCategory};
use crate::error::{BindingError, BindingResult};
use crate::events::{
    BindingActivated, BindingCreated, BindingDeactivated, BindingEvent, BindingRecomputed,
    BindingUnlinked, UrlsRedirected, VariantBindingsCreated,
};
use crate::model::{
    BindingContent, CategoryBinding, ProductBinding, ProductBindingId, Slug, UrlRecord, UrlTarget,
    VariantBinding,
};
use crate::recompute::{Recomputed, Recomputer};
use crate::redirect::{Redirect, drop_orphaned_urls, redirect_existing_urls};
use crate::settings::SlugSettings;
use crate::store::{BindingRepository, TransactionalStore};
use crate::variants::sync_variant_bindings;

/// Fields a caller may ask defaults for before building a [`NewProductBinding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingField {
    Channel,
    Language,
    Active,
}

/// Defaults for the requested fields; unrequested fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingDefaults {
    pub channel: Option<ChannelId>,
    pub active: Option<bool>,
}

/// Input of [`BindingService::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProductBinding {
    /// Falls back to the first channel of the catalog when `None`.
    pub channel: Option<ChannelId>,
    pub product: ProductId,
    pub language: LanguageCode,
    pub active: bool,
    pub override_name: Option<String>,
    pub seo_title_override: Option<String>,
    pub content: BindingContent,
    /// Create variant bindings right after the product binding.
    pub materialize_variants: bool,
}

impl NewProductBinding {
    pub fn new(product: ProductId, language: LanguageCode) -> Self {
        Self {
            channel: None,
            product,
            language,
            active: true,
            override_name: None,
            seo_title_override: None,
            content: BindingContent::default(),
            materialize_variants: false,
        }
    }

    pub fn in_channel(mut self, channel: ChannelId) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_override_name(mut self, name: impl Into<String>) -> Self {
        self.override_name = Some(name.into());
        self
    }

    pub fn with_seo_title_override(mut self, title: impl Into<String>) -> Self {
        self.seo_title_override = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: BindingContent) -> Self {
        self.content = content;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn materialize_variants(mut self) -> Self {
        self.materialize_variants = true;
        self
    }
}

/// Edit of caller-owned binding fields. `None` leaves a field untouched;
/// `Some(None)` clears an optional one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingChange {
    pub override_name: Option<Option<String>>,
    pub language: Option<LanguageCode>,
    pub seo_title_override: Option<Option<String>>,
    pub content: Option<BindingContent>,
}

/// What [`BindingService::unlink`] removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlinkReport {
    pub unlinked: Vec<ProductBindingId>,
    pub variant_bindings_removed: usize,
    pub redirects: Vec<Redirect>,
    /// URLs removed because no redirect target was found.
    pub urls_dropped: usize,
}

/// Orchestrates binding lifecycle operations over a catalog, a transactional
/// store and an event bus.
///
/// ## Generic Parameters
///
/// - `C`: catalog the bindings derive from
/// - `S`: binding store (one transaction per operation)
/// - `B`: bus receiving `EventEnvelope<BindingEvent>` after each commit
pub struct BindingService<C, S, B> {
    catalog: C,
    store: S,
    bus: B,
    roots: Box<dyn CategoryRoots>,
    slugs: SlugSettings,
    sequence: AtomicU64,
}

impl<C, S, B> BindingService<C, S, B> {
    pub fn new(catalog: C, store: S, bus: B) -> Self {
        Self {
            catalog,
            store,
            bus,
            roots: Box::new(DirectCategory),
            slugs: SlugSettings::default(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Replace the hook deciding which categories a product exposes.
    pub fn with_category_roots(mut self, roots: impl CategoryRoots + 'static) -> Self {
        self.roots = Box::new(roots);
        self
    }

    pub fn with_slug_settings(mut self, slugs: SlugSettings) -> Self {
        self.slugs = slugs;
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<C, S, B> BindingService<C, S, B>
where
    C: Catalog,
    S: TransactionalStore,
    B: EventBus<EventEnvelope<BindingEvent>>,
{
    /// Defaults for the requested fields. The channel default is the first
    /// channel known to the catalog.
    pub fn default_values(&self, fields: &[BindingField]) -> BindingDefaults {
        let mut defaults = BindingDefaults::default();
        for field in fields {
            match field {
                BindingField::Channel => {
                    defaults.channel = self.catalog.first_channel().map(|channel| channel.id_typed())
                }
                BindingField::Active => defaults.active = Some(true),
                BindingField::Language => {}
            }
        }
        defaults
    }

    /// Create one product binding, derive its fields and optionally its
    /// variant bindings.
    pub fn create(&self, request: NewProductBinding) -> BindingResult<ProductBinding> {
        self.create_many(vec![request])?
            .pop()
            .ok_or_else(|| DomainError::invariant("create produced no binding").into())
    }

    /// Create several product bindings in one transaction. Slugs are assigned
    /// in request order.
    pub fn create_many(&self, requests: Vec<NewProductBinding>) -> BindingResult<Vec<ProductBinding>> {
        let mut prepared = Vec::with_capacity(requests.len());
        for request in requests {
            let channel = match request.channel {
                Some(channel) => channel,
                None => self
                    .default_values(&[BindingField::Channel])
                    .channel
                    .ok_or_else(|| DomainError::validation("no channel given and none available"))?,
            };
            if self.catalog.channel(channel).is_none() {
                return Err(DomainError::not_found(format!("channel {channel}")).into());
            }
            if self.catalog.product(request.product).is_none() {
                return Err(DomainError::not_found(format!("catalog product {}", request.product)).into());
            }
            prepared.push((channel, request));
        }

        let (created, events) = self.store.transaction(|repo: &mut S::Repository| {
            let repo: &mut dyn BindingRepository = repo;
            let mut ids = Vec::with_capacity(prepared.len());
            for (channel, request) in &prepared {
                let mut binding = ProductBinding::new(
                    ProductBindingId::generate(),
                    *channel,
                    request.product,
                    request.language.clone(),
                );
                binding.active = request.active;
                binding.override_name = request.override_name.clone();
                binding.seo_title_override = request.seo_title_override.clone();
                binding.content = request.content.clone();
                ids.push(binding.id_typed());
                repo.insert_product_binding(binding)?;
            }

            let recomputed = self.recomputer().recompute(repo, &ids)?;
            let mut events = Vec::new();
            let mut created = Vec::with_capacity(recomputed.len());
            for (Recomputed { binding, .. }, (_, request)) in recomputed.into_iter().zip(&prepared) {
                events.push(BindingEvent::BindingCreated(BindingCreated {
                    channel_id: binding.channel(),
                    binding_id: binding.id_typed(),
                    product_id: binding.product(),
                    language: binding.language().clone(),
                    slug: binding.slug().map(|slug| slug.as_str().to_string()),
                    active: binding.is_active(),
                    occurred_at: chrono::Utc::now(),
                }));
                if request.materialize_variants {
                    let variants = sync_variant_bindings(repo, &self.catalog, &binding)?;
                    events.extend(variants_created_event(&binding, &variants));
                }
                created.push(binding);
            }
            Ok::<_, BindingError>((created, events))
        })?;

        info!(count = created.len(), "product bindings created");
        self.publish(events)?;
        Ok(created)
    }

    /// Apply a caller edit and recompute the binding's derived fields.
    pub fn update(&self, id: ProductBindingId, change: BindingChange) -> BindingResult<ProductBinding> {
        let (binding, events) = self.store.transaction(|repo: &mut S::Repository| {
            let repo: &mut dyn BindingRepository = repo;
            let mut binding = repo
                .product_binding(id)
                .ok_or_else(|| DomainError::not_found(format!("product binding {id}")))?;
            if let Some(name) = change.override_name {
                binding.override_name = name;
            }
            if let Some(language) = change.language {
                binding.language = language;
            }
            if let Some(title) = change.seo_title_override {
                binding.seo_title_override = title;
            }
            if let Some(content) = change.content {
                binding.content = content;
            }
            repo.update_product_binding(binding)?;

            let recomputed = self.recomputer().recompute(repo, &[id])?;
            let events = recomputed_events(&recomputed);
            let binding = recomputed
                .into_iter()
                .next()
                .map(|r| r.binding)
                .ok_or_else(|| DomainError::not_found(format!("product binding {id}")))?;
            Ok::<_, BindingError>((binding, events))
        })?;

        self.publish(events)?;
        Ok(binding)
    }

    /// Recompute derived fields of the given bindings in one batch.
    pub fn recompute(&self, ids: &[ProductBindingId]) -> BindingResult<Vec<ProductBinding>> {
        let recomputed = self.store.transaction(|repo: &mut S::Repository| {
            self.recomputer().recompute(repo, ids)
        })?;
        self.publish(recomputed_events(&recomputed))?;
        Ok(recomputed.into_iter().map(|r| r.binding).collect())
    }

    /// Catalog products were renamed, recoded or recategorized.
    pub fn on_catalog_changed(&self, products: &[ProductId]) -> BindingResult<Vec<ProductBinding>> {
        let products: HashSet<ProductId> = products.iter().copied().collect();
        let ids = self.binding_ids_where(|binding| products.contains(&binding.product()))?;
        self.recompute(&ids)
    }

    /// Channel settings (override flag, public name) or the channel's category
    /// bindings changed.
    pub fn on_channel_changed(&self, channel: ChannelId) -> BindingResult<Vec<ProductBinding>> {
        let ids = self.binding_ids_where(|binding| binding.channel() == channel)?;
        self.recompute(&ids)
    }

    /// Create the variant bindings `id` is missing.
    pub fn sync_variants(&self, id: ProductBindingId) -> BindingResult<Vec<VariantBinding>> {
        let (created, events) = self.store.transaction(|repo: &mut S::Repository| {
            let repo: &mut dyn BindingRepository = repo;
            let owner = repo
                .product_binding(id)
                .ok_or_else(|| DomainError::not_found(format!("product binding {id}")))?;
            let created = sync_variant_bindings(repo, &self.catalog, &owner)?;
            let events: Vec<BindingEvent> = variants_created_event(&owner, &created).into_iter().collect();
            Ok::<_, BindingError>((created, events))
        })?;
        self.publish(events)?;
        Ok(created)
    }

    /// Set the active flag of `ids` and cascade to their variant bindings.
    pub fn set_active(&self, ids: &[ProductBindingId], active: bool) -> BindingResult<ActivationReport> {
        self.change_activation(ids, |repo| cascade::set_active(repo, ids, active))
    }

    /// Flip each binding's active flag and cascade.
    pub fn toggle_published(&self, ids: &[ProductBindingId]) -> BindingResult<Acknowledgement> {
        self.change_activation(ids, |repo| cascade::toggle_published(repo, ids))?;
        Ok(Acknowledgement {})
    }

    /// Remove bindings. URLs are redirected first, then variant bindings are
    /// removed, then the bindings themselves.
    pub fn unlink(&self, ids: &[ProductBindingId]) -> BindingResult<UnlinkReport> {
        let (report, events) = self.store.transaction(|repo: &mut S::Repository| {
            let repo: &mut dyn BindingRepository = repo;
            let bindings = load_bindings(repo, ids)?;
            let ids: Vec<ProductBindingId> = bindings.iter().map(ProductBinding::id_typed).collect();

            let resolver = CategoryResolver::new(&self.catalog, self.roots.as_ref());
            let redirects = redirect_existing_urls(repo, &self.catalog, &resolver, &bindings)?;

            let mut removed_per_owner = Vec::with_capacity(bindings.len());
            let mut variant_ids = Vec::new();
            for binding in &bindings {
                let owned = repo.variant_bindings_of(&[binding.id_typed()]);
                removed_per_owner.push(owned.len());
                variant_ids.extend(owned.iter().map(VariantBinding::id_typed));
            }
            let variant_bindings_removed = repo.remove_variant_bindings(&variant_ids);
            let urls_dropped = drop_orphaned_urls(repo, &ids);
            repo.remove_product_bindings(&ids);

            let now = chrono::Utc::now();
            let mut events = Vec::new();
            for redirect in &redirects {
                if let Some(binding) = bindings.iter().find(|b| b.id_typed() == redirect.binding) {
                    events.push(BindingEvent::UrlsRedirected(UrlsRedirected {
                        channel_id: binding.channel(),
                        binding_id: binding.id_typed(),
                        urls: redirect.urls.clone(),
                        category_binding: redirect.category_binding,
                        occurred_at: now,
                    }));
                }
            }
            for (binding, removed) in bindings.iter().zip(removed_per_owner) {
                events.push(BindingEvent::BindingUnlinked(BindingUnlinked {
                    channel_id: binding.channel(),
                    binding_id: binding.id_typed(),
                    product_id: binding.product(),
                    variant_bindings_removed: removed,
                    occurred_at: now,
                }));
            }

            let report = UnlinkReport {
                unlinked: ids,
                variant_bindings_removed,
                redirects,
                urls_dropped,
            };
            Ok::<_, BindingError>((report, events))
        })?;

        if report.urls_dropped > 0 {
            warn!(urls = report.urls_dropped, "urls dropped without redirect target");
        }
        info!(
            count = report.unlinked.len(),
            variant_bindings = report.variant_bindings_removed,
            "product bindings unlinked"
        );
        self.publish(events)?;
        Ok(report)
    }

    // Read-only accessors over committed state.

    pub fn product_binding(&self, id: ProductBindingId) -> BindingResult<ProductBinding> {
        self.store
            .read(|repo| repo.product_binding(id))?
            .ok_or_else(|| DomainError::not_found(format!("product binding {id}")).into())
    }

    pub fn find(
        &self,
        channel: ChannelId,
        product: ProductId,
        language: &LanguageCode,
    ) -> BindingResult<Option<ProductBinding>> {
        Ok(self
            .store
            .read(|repo| repo.find_product_binding(channel, product, language))?)
    }

    pub fn display_name(&self, id: ProductBindingId) -> BindingResult<String> {
        Ok(self.product_binding(id)?.display_name().to_string())
    }

    pub fn slug(&self, id: ProductBindingId) -> BindingResult<Option<Slug>> {
        Ok(self.product_binding(id)?.slug().cloned())
    }

    pub fn seo_title(&self, id: ProductBindingId) -> BindingResult<String> {
        Ok(self.product_binding(id)?.seo_title().to_string())
    }

    pub fn category_bindings(&self, id: ProductBindingId) -> BindingResult<Vec<CategoryBinding>> {
        let binding = self.product_binding(id)?;
        Ok(self.store.read(|repo| {
            binding
                .category_bindings()
                .iter()
                .filter_map(|category| repo.category_binding(*category))
                .collect()
        })?)
    }

    pub fn variant_bindings(&self, id: ProductBindingId) -> BindingResult<Vec<VariantBinding>> {
        Ok(self.store.read(|repo| repo.variant_bindings_of(&[id]))?)
    }

    /// URLs currently resolving to the binding (canonical and redirects).
    pub fn urls(&self, id: ProductBindingId) -> BindingResult<Vec<UrlRecord>> {
        Ok(self.store.read(|repo| repo.urls_targeting(UrlTarget::Product(id)))?)
    }

    fn recomputer(&self) -> Recomputer<'_> {
        Recomputer::new(&self.catalog, self.roots.as_ref(), &self.slugs)
    }

    fn binding_ids_where(
        &self,
        keep: impl Fn(&ProductBinding) -> bool,
    ) -> BindingResult<Vec<ProductBindingId>> {
        Ok(self.store.read(|repo| {
            repo.product_bindings()
                .iter()
                .filter(|binding| keep(*binding))
                .map(ProductBinding::id_typed)
                .collect()
        })?)
    }

    fn change_activation(
        &self,
        ids: &[ProductBindingId],
        apply: impl FnOnce(&mut dyn BindingRepository) -> BindingResult<ActivationReport>,
    ) -> BindingResult<ActivationReport> {
        let (report, bindings) = self.store.transaction(|repo: &mut S::Repository| {
            let repo: &mut dyn BindingRepository = repo;
            let bindings = load_bindings(repo, ids)?;
            let report = apply(repo)?;
            Ok::<_, BindingError>((report, bindings))
        })?;

        let now = chrono::Utc::now();
        let mut events = Vec::new();
        for binding in &bindings {
            let id = binding.id_typed();
            let channel_id = binding.channel();
            if report.activated.contains(&id) {
                events.push(BindingEvent::BindingActivated(BindingActivated {
                    channel_id,
                    binding_id: id,
                    occurred_at: now,
                }));
            } else if report.deactivated.contains(&id) {
                events.push(BindingEvent::BindingDeactivated(BindingDeactivated {
                    channel_id,
                    binding_id: id,
                    occurred_at: now,
                }));
            }
        }
        self.publish(events)?;
        Ok(report)
    }

    fn publish(&self, events: Vec<BindingEvent>) -> BindingResult<()> {
        for event in events {
            let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            let envelope = EventEnvelope::seal(sequence, event);
            self.bus
                .publish(envelope)
                .map_err(|e| BindingError::Publish(format!("{e:?}")))?;
        }
        Ok(())
    }
}

fn variants_created_event(owner: &ProductBinding, created: &[VariantBinding]) -> Option<BindingEvent> {
    if created.is_empty() {
        return None;
    }
    Some(BindingEvent::VariantBindingsCreated(VariantBindingsCreated {
        channel_id: owner.channel(),
        binding_id: owner.id_typed(),
        variant_bindings: created.iter().map(VariantBinding::id_typed).collect(),
        occurred_at: chrono::Utc::now(),
    }))
}

fn recomputed_events(recomputed: &[Recomputed]) -> Vec<BindingEvent> {
    let now = chrono::Utc::now();
    recomputed
        .iter()
        .filter(|r| r.changed)
        .map(|r| {
            BindingEvent::BindingRecomputed(BindingRecomputed {
                channel_id: r.binding.channel(),
                binding_id: r.binding.id_typed(),
                display_name: r.binding.display_name().to_string(),
                slug: r.binding.slug().map(|slug| slug.as_str().to_string()),
                seo_title: r.binding.seo_title().to_string(),
                occurred_at: now,
            })
        })
        .collect()
}
