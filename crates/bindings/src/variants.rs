//! Variant binding materialization.

use storefront_catalog::{Catalog, ProductVariant};
use tracing::debug;

use crate::error::BindingResult;
use crate::model::{ProductBinding, VariantBinding, VariantBindingId};
use crate::store::BindingRepository;

/// New variant binding for `variant` under `owner`.
///
/// A variant binding is never more active than its owner.
pub fn prepare_variant_binding(owner: &ProductBinding, variant: &ProductVariant) -> VariantBinding {
    VariantBinding {
        id: VariantBindingId::generate(),
        variant: variant.id_typed(),
        product_binding: owner.id_typed(),
        active: variant.is_active() && owner.is_active(),
    }
}

/// Create the variant bindings `owner` is missing, one per catalog variant
/// (inactive variants included). Existing pairs are left untouched.
///
/// Returns only the bindings created by this call.
pub fn sync_variant_bindings(
    repo: &mut dyn BindingRepository,
    catalog: &dyn Catalog,
    owner: &ProductBinding,
) -> BindingResult<Vec<VariantBinding>> {
    let mut created = Vec::new();
    for variant in catalog.variants(owner.product()) {
        if repo.variant_binding_exists(variant.id_typed(), owner.id_typed()) {
            continue;
        }
        let binding = prepare_variant_binding(owner, &variant);
        repo.insert_variant_binding(binding.clone())?;
        created.push(binding);
    }
    debug!(
        binding_id = %owner.id_typed(),
        created = created.len(),
        "variant bindings synchronized"
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_catalog::{CatalogProduct, InMemoryCatalog, LanguageCode, ProductId, VariantId};
    use storefront_core::ChannelId;

    use crate::model::ProductBindingId;
    use crate::store::StoreState;

    fn setup(variants: usize) -> (InMemoryCatalog, StoreState, ProductBinding) {
        let catalog = InMemoryCatalog::new();
        let product = ProductId::generate();
        catalog.upsert_product(CatalogProduct::new(product, "Shirt"));
        for i in 0..variants {
            let variant = ProductVariant::new(VariantId::generate(), product);
            catalog.upsert_variant(if i % 2 == 1 { variant.inactive() } else { variant });
        }

        let mut repo = StoreState::new();
        let owner = ProductBinding::new(
            ProductBindingId::generate(),
            ChannelId::new(),
            product,
            LanguageCode::new("en_US").unwrap(),
        );
        repo.insert_product_binding(owner.clone()).unwrap();
        (catalog, repo, owner)
    }

    #[test]
    fn creates_one_binding_per_variant_including_inactive() {
        let (catalog, mut repo, owner) = setup(3);
        let created = sync_variant_bindings(&mut repo, &catalog, &owner).unwrap();

        assert_eq!(created.len(), 3);
        let active: Vec<bool> = created.iter().map(VariantBinding::is_active).collect();
        assert_eq!(active, vec![true, false, true]);
    }

    #[test]
    fn second_sync_is_a_no_op() {
        let (catalog, mut repo, owner) = setup(2);
        sync_variant_bindings(&mut repo, &catalog, &owner).unwrap();
        let again = sync_variant_bindings(&mut repo, &catalog, &owner).unwrap();

        assert!(again.is_empty());
        assert_eq!(repo.variant_bindings_of(&[owner.id_typed()]).len(), 2);
    }

    #[test]
    fn inactive_owner_yields_inactive_variant_bindings() {
        let (catalog, mut repo, mut owner) = setup(2);
        owner.active = false;
        let created = sync_variant_bindings(&mut repo, &catalog, &owner).unwrap();
        assert!(created.iter().all(|v| !v.is_active()));
    }

    #[test]
    fn picks_up_variants_added_later() {
        let (catalog, mut repo, owner) = setup(1);
        sync_variant_bindings(&mut repo, &catalog, &owner).unwrap();

        catalog.upsert_variant(ProductVariant::new(VariantId::generate(), owner.product()));
        let created = sync_variant_bindings(&mut repo, &catalog, &owner).unwrap();
        assert_eq!(created.len(), 1);
    }

    #[test]
    fn product_without_variants_creates_nothing() {
        let (catalog, mut repo, owner) = setup(0);
        assert!(sync_variant_bindings(&mut repo, &catalog, &owner).unwrap().is_empty());
    }
}
