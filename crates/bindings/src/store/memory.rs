use std::collections::HashSet;
use std::sync::RwLock;

use storefront_catalog::{CategoryId, LanguageCode, ProductId, VariantId};
use storefront_core::{ChannelId, Entity};

use crate::error::{StoreError, StoreResult};
use crate::model::{
    CategoryBinding, CategoryBindingId, ProductBinding, ProductBindingId, UrlId, UrlRecord,
    UrlTarget, VariantBinding, VariantBindingId,
};
use crate::store::{BindingRepository, TransactionalStore};

/// In-memory tables. Rows are kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    product_bindings: Vec<ProductBinding>,
    variant_bindings: Vec<VariantBinding>,
    category_bindings: Vec<CategoryBinding>,
    urls: Vec<UrlRecord>,
}

impl StoreState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variant_bindings(&self) -> &[VariantBinding] {
        &self.variant_bindings
    }

    pub fn urls(&self) -> &[UrlRecord] {
        &self.urls
    }

    fn check_product_key(&self, candidate: &ProductBinding) -> StoreResult<()> {
        let clash = self
            .product_bindings
            .iter()
            .any(|b| !b.same_identity_as(candidate) && b.unique_key() == candidate.unique_key());
        if clash {
            return Err(StoreError::UniqueConstraint {
                constraint: "product_binding_record_uniq",
                detail: format!(
                    "product {} already bound for channel {} and language {}",
                    candidate.product, candidate.channel, candidate.language
                ),
            });
        }
        Ok(())
    }
}

impl BindingRepository for StoreState {
    fn product_binding(&self, id: ProductBindingId) -> Option<ProductBinding> {
        self.product_bindings.iter().find(|b| b.id == id).cloned()
    }

    fn find_product_binding(
        &self,
        channel: ChannelId,
        product: ProductId,
        language: &LanguageCode,
    ) -> Option<ProductBinding> {
        self.product_bindings
            .iter()
            .find(|b| b.unique_key() == (channel, product, language))
            .cloned()
    }

    fn product_bindings(&self) -> Vec<ProductBinding> {
        self.product_bindings.clone()
    }

    fn insert_product_binding(&mut self, binding: ProductBinding) -> StoreResult<()> {
        if self.product_bindings.iter().any(|b| b.same_identity_as(&binding)) {
            return Err(StoreError::UniqueConstraint {
                constraint: "product_binding_pkey",
                detail: binding.id.to_string(),
            });
        }
        self.check_product_key(&binding)?;
        self.product_bindings.push(binding);
        Ok(())
    }

    fn update_product_binding(&mut self, binding: ProductBinding) -> StoreResult<()> {
        self.check_product_key(&binding)?;
        let row = self
            .product_bindings
            .iter_mut()
            .find(|b| b.same_identity_as(&binding))
            .ok_or_else(|| StoreError::MissingRecord(format!("product binding {}", binding.id)))?;
        *row = binding;
        Ok(())
    }

    fn set_product_bindings_active(&mut self, ids: &[ProductBindingId], active: bool) -> usize {
        let ids: HashSet<_> = ids.iter().collect();
        let mut changed = 0;
        for row in self.product_bindings.iter_mut().filter(|b| ids.contains(&b.id)) {
            if row.active != active {
                row.active = active;
                changed += 1;
            }
        }
        changed
    }

    fn remove_product_bindings(&mut self, ids: &[ProductBindingId]) -> usize {
        let ids: HashSet<_> = ids.iter().collect();
        let before = self.product_bindings.len();
        self.product_bindings.retain(|b| !ids.contains(&b.id));
        before - self.product_bindings.len()
    }

    fn variant_binding_exists(&self, variant: VariantId, owner: ProductBindingId) -> bool {
        self.variant_bindings
            .iter()
            .any(|vb| vb.variant == variant && vb.product_binding == owner)
    }

    fn insert_variant_binding(&mut self, binding: VariantBinding) -> StoreResult<()> {
        if self.variant_binding_exists(binding.variant, binding.product_binding) {
            return Err(StoreError::UniqueConstraint {
                constraint: "variant_binding_record_uniq",
                detail: format!(
                    "variant {} already bound under product binding {}",
                    binding.variant, binding.product_binding
                ),
            });
        }
        if self.product_binding(binding.product_binding).is_none() {
            return Err(StoreError::MissingRecord(format!(
                "owner product binding {}",
                binding.product_binding
            )));
        }
        self.variant_bindings.push(binding);
        Ok(())
    }

    fn variant_bindings_of(&self, owners: &[ProductBindingId]) -> Vec<VariantBinding> {
        let owners: HashSet<_> = owners.iter().collect();
        self.variant_bindings
            .iter()
            .filter(|vb| owners.contains(&vb.product_binding))
            .cloned()
            .collect()
    }

    fn set_variants_active(&mut self, owners: &[ProductBindingId], active: bool) -> usize {
        let owners: HashSet<_> = owners.iter().collect();
        let mut changed = 0;
        for row in self
            .variant_bindings
            .iter_mut()
            .filter(|vb| owners.contains(&vb.product_binding))
        {
            if row.active != active {
                row.active = active;
                changed += 1;
            }
        }
        changed
    }

    fn remove_variant_bindings(&mut self, ids: &[VariantBindingId]) -> usize {
        let ids: HashSet<_> = ids.iter().collect();
        let before = self.variant_bindings.len();
        self.variant_bindings.retain(|vb| !ids.contains(&vb.id));
        before - self.variant_bindings.len()
    }

    fn category_binding(&self, id: CategoryBindingId) -> Option<CategoryBinding> {
        self.category_bindings.iter().find(|c| c.id == id).cloned()
    }

    fn insert_category_binding(&mut self, binding: CategoryBinding) -> StoreResult<()> {
        let clash = self.category_bindings.iter().any(|c| {
            c.id == binding.id
                || (c.category == binding.category
                    && c.channel == binding.channel
                    && c.language == binding.language)
        });
        if clash {
            return Err(StoreError::UniqueConstraint {
                constraint: "category_binding_record_uniq",
                detail: format!(
                    "category {} already bound for channel {} and language {}",
                    binding.category, binding.channel, binding.language
                ),
            });
        }
        self.category_bindings.push(binding);
        Ok(())
    }

    fn set_category_binding_active(&mut self, id: CategoryBindingId, active: bool) -> StoreResult<()> {
        let row = self
            .category_bindings
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::MissingRecord(format!("category binding {id}")))?;
        row.active = active;
        Ok(())
    }

    fn category_bindings_in_scope(
        &self,
        categories: &[CategoryId],
        channel: ChannelId,
        language: &LanguageCode,
    ) -> Vec<CategoryBinding> {
        categories
            .iter()
            .filter_map(|category| {
                self.category_bindings.iter().find(|c| {
                    c.category == *category && c.channel == channel && &c.language == language
                })
            })
            .cloned()
            .collect()
    }

    fn urls_targeting(&self, target: UrlTarget) -> Vec<UrlRecord> {
        self.urls.iter().filter(|u| u.target == target).cloned().collect()
    }

    fn urls_with_key(&self, channel: ChannelId, language: &LanguageCode, key: &str) -> Vec<UrlRecord> {
        self.urls
            .iter()
            .filter(|u| u.channel == channel && &u.language == language && u.key == key)
            .cloned()
            .collect()
    }

    fn insert_url(&mut self, url: UrlRecord) -> StoreResult<()> {
        let clash = self.urls.iter().any(|u| {
            u.id == url.id
                || (u.channel == url.channel && u.language == url.language && u.key == url.key)
        });
        if clash {
            return Err(StoreError::UniqueConstraint {
                constraint: "url_key_uniq",
                detail: format!("url {:?} already exists in language {}", url.key, url.language),
            });
        }
        self.urls.push(url);
        Ok(())
    }

    fn retarget_urls(&mut self, ids: &[UrlId], target: UrlTarget, redirect: bool) -> usize {
        let ids: HashSet<_> = ids.iter().collect();
        let mut touched = 0;
        for row in self.urls.iter_mut().filter(|u| ids.contains(&u.id)) {
            row.target = target;
            row.redirect = redirect;
            touched += 1;
        }
        touched
    }

    fn remove_urls(&mut self, ids: &[UrlId]) -> usize {
        let ids: HashSet<_> = ids.iter().collect();
        let before = self.urls.len();
        self.urls.retain(|u| !ids.contains(&u.id));
        before - self.urls.len()
    }
}

/// In-memory transactional store for tests/dev.
///
/// A transaction works on a copy of the tables and swaps it in on success, so a
/// failing operation leaves committed state untouched. Transactions are
/// serialized by the write lock.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a category binding outside any lifecycle operation.
    pub fn insert_category_binding(&self, binding: CategoryBinding) -> StoreResult<()> {
        self.transaction(|repo: &mut StoreState| repo.insert_category_binding(binding))
    }
}

impl TransactionalStore for InMemoryStore {
    type Repository = StoreState;

    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self::Repository) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut committed = self.state.write().map_err(|_| StoreError::Poisoned)?;
        let mut working = committed.clone();
        let out = f(&mut working)?;
        *committed = working;
        Ok(out)
    }

    fn read<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Self::Repository) -> T,
    {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang() -> LanguageCode {
        LanguageCode::new("en_US").unwrap()
    }

    fn binding(channel: ChannelId, product: ProductId) -> ProductBinding {
        ProductBinding::new(ProductBindingId::generate(), channel, product, lang())
    }

    fn variant_binding(variant: VariantId, owner: ProductBindingId, active: bool) -> VariantBinding {
        VariantBinding {
            id: VariantBindingId::generate(),
            variant,
            product_binding: owner,
            active,
        }
    }

    #[test]
    fn product_binding_key_is_unique() {
        let mut state = StoreState::new();
        let channel = ChannelId::new();
        let product = ProductId::generate();
        state.insert_product_binding(binding(channel, product)).unwrap();

        let err = state.insert_product_binding(binding(channel, product)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UniqueConstraint { constraint: "product_binding_record_uniq", .. }
        ));

        // Another language is a different key.
        let mut other = binding(channel, product);
        other.language = LanguageCode::new("fr_FR").unwrap();
        state.insert_product_binding(other).unwrap();
    }

    #[test]
    fn update_rechecks_the_unique_key() {
        let mut state = StoreState::new();
        let channel = ChannelId::new();
        let product = ProductId::generate();
        let en = binding(channel, product);
        let mut fr = binding(channel, product);
        fr.language = LanguageCode::new("fr_FR").unwrap();
        state.insert_product_binding(en).unwrap();
        state.insert_product_binding(fr.clone()).unwrap();

        fr.language = lang();
        assert!(state.update_product_binding(fr).is_err());
    }

    #[test]
    fn variant_binding_pair_is_unique() {
        let mut state = StoreState::new();
        let owner = binding(ChannelId::new(), ProductId::generate());
        let owner_id = owner.id;
        state.insert_product_binding(owner).unwrap();
        let variant = VariantId::generate();

        state.insert_variant_binding(variant_binding(variant, owner_id, true)).unwrap();
        let err = state
            .insert_variant_binding(variant_binding(variant, owner_id, true))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::UniqueConstraint { constraint: "variant_binding_record_uniq", .. }
        ));
    }

    #[test]
    fn set_variants_active_only_counts_real_changes() {
        let mut state = StoreState::new();
        let owner = binding(ChannelId::new(), ProductId::generate());
        let owner_id = owner.id;
        state.insert_product_binding(owner).unwrap();
        state
            .insert_variant_binding(variant_binding(VariantId::generate(), owner_id, true))
            .unwrap();
        state
            .insert_variant_binding(variant_binding(VariantId::generate(), owner_id, false))
            .unwrap();

        assert_eq!(state.set_variants_active(&[owner_id], false), 1);
        assert_eq!(state.set_variants_active(&[owner_id], false), 0);
        assert!(state.variant_bindings_of(&[owner_id]).iter().all(|vb| !vb.active));
    }

    #[test]
    fn failed_transaction_keeps_committed_state() {
        let store = InMemoryStore::new();
        let channel = ChannelId::new();
        let product = ProductId::generate();

        store
            .transaction(|repo: &mut StoreState| repo.insert_product_binding(binding(channel, product)))
            .unwrap();

        let result: Result<(), StoreError> = store.transaction(|repo| {
            repo.insert_product_binding(binding(channel, ProductId::generate()))?;
            repo.insert_product_binding(binding(channel, product))
        });
        assert!(result.is_err());

        let count = store.read(|repo| repo.product_bindings().len()).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn category_bindings_follow_requested_order_and_scope() {
        let mut state = StoreState::new();
        let channel = ChannelId::new();
        let (a, b) = (CategoryId::generate(), CategoryId::generate());
        let cb_a = CategoryBinding::new(a, channel, lang());
        let cb_b = CategoryBinding::new(b, channel, lang());
        let other_lang = CategoryBinding::new(a, channel, LanguageCode::new("fr_FR").unwrap());
        state.insert_category_binding(cb_a.clone()).unwrap();
        state.insert_category_binding(cb_b.clone()).unwrap();
        state.insert_category_binding(other_lang).unwrap();

        let found = state.category_bindings_in_scope(&[b, a], channel, &lang());
        assert_eq!(found, vec![cb_b, cb_a]);
    }

    #[test]
    fn url_keys_are_unique_per_channel_and_language() {
        let mut state = StoreState::new();
        let channel = ChannelId::new();
        let target = UrlTarget::Product(ProductBindingId::generate());
        state
            .insert_url(UrlRecord::canonical("blue-shirt", channel, lang(), target))
            .unwrap();

        assert!(state
            .insert_url(UrlRecord::canonical("blue-shirt", channel, lang(), target))
            .is_err());
        state
            .insert_url(UrlRecord::canonical("blue-shirt", ChannelId::new(), lang(), target))
            .unwrap();
    }
}
