//! Display name and SEO title derivation.

use storefront_catalog::{CatalogProduct, Channel};
use storefront_core::{DomainError, DomainResult};

use crate::model::ProductBinding;

/// Name shown on the storefront.
///
/// The binding's own name wins only when its channel allows overrides and the
/// override is non-blank; otherwise the product name in the binding's language.
pub fn resolve_display_name(
    binding: &ProductBinding,
    product: &CatalogProduct,
    channel: &Channel,
) -> String {
    match binding.override_name() {
        Some(name) if channel.use_override_name() && !name.trim().is_empty() => name.to_string(),
        _ => product.name().get(binding.language()).to_string(),
    }
}

/// `"<display name> | <channel public name>"` for exactly one binding.
pub fn build_seo_title(records: &[ProductBinding], channel: &Channel) -> DomainResult<String> {
    DomainError::ensure_one("seo_title", records.len())?;
    let record = &records[0];
    if record.channel() != channel.id_typed() {
        return Err(DomainError::invariant(format!(
            "binding {} belongs to channel {}, not {}",
            record.id_typed(),
            record.channel(),
            channel.id_typed()
        )));
    }
    Ok(format!(
        "{} | {}",
        record.display_name(),
        channel.website_public_name().unwrap_or("")
    ))
}
