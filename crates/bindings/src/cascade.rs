//! Active-state propagation from product bindings to their variant bindings.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use storefront_core::DomainError;

use crate::error::{BindingError, BindingResult};
use crate::model::{ProductBinding, ProductBindingId};
use crate::store::BindingRepository;

/// Number of variant bindings whose flag actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    pub variants_activated: usize,
    pub variants_deactivated: usize,
}

/// Result of an activation change over a set of product bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationReport {
    /// Bindings that went from inactive to active.
    pub activated: Vec<ProductBindingId>,
    /// Bindings that went from active to inactive.
    pub deactivated: Vec<ProductBindingId>,
    pub cascade: CascadeReport,
}

/// Empty acknowledgement returned to UI-facing callers. Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {}

/// Align every variant binding with its owner's active flag.
///
/// One bulk write for all active owners, one for all inactive owners.
pub fn cascade_active(repo: &mut dyn BindingRepository, bindings: &[ProductBinding]) -> CascadeReport {
    let (active, inactive): (Vec<&ProductBinding>, Vec<&ProductBinding>) =
        bindings.iter().partition(|b| b.is_active());
    let active: Vec<ProductBindingId> = active.iter().map(|b| b.id_typed()).collect();
    let inactive: Vec<ProductBindingId> = inactive.iter().map(|b| b.id_typed()).collect();

    let report = CascadeReport {
        variants_activated: if active.is_empty() { 0 } else { repo.set_variants_active(&active, true) },
        variants_deactivated: if inactive.is_empty() {
            0
        } else {
            repo.set_variants_active(&inactive, false)
        },
    };
    debug!(
        activated = report.variants_activated,
        deactivated = report.variants_deactivated,
        "active state cascaded to variant bindings"
    );
    report
}

/// Load `ids` once each, in order; any unknown id fails the whole call.
pub(crate) fn load_bindings(repo: &dyn BindingRepository, ids: &[ProductBindingId]) -> BindingResult<Vec<ProductBinding>> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(**id))
        .map(|id| {
            repo.product_binding(*id)
                .ok_or_else(|| BindingError::from(DomainError::not_found(format!("product binding {id}"))))
        })
        .collect()
}

/// Set the active flag of `ids` to `active` and cascade.
///
/// The cascade runs for every listed binding, even those already in the
/// requested state, so drifted variant bindings are realigned.
pub fn set_active(
    repo: &mut dyn BindingRepository,
    ids: &[ProductBindingId],
    active: bool,
) -> BindingResult<ActivationReport> {
    let mut bindings = load_bindings(repo, ids)?;
    let changed: Vec<ProductBindingId> = bindings
        .iter()
        .filter(|b| b.is_active() != active)
        .map(ProductBinding::id_typed)
        .collect();

    let all: Vec<ProductBindingId> = bindings.iter().map(ProductBinding::id_typed).collect();
    repo.set_product_bindings_active(&all, active);
    for binding in &mut bindings {
        binding.active = active;
    }
    let cascade = cascade_active(repo, &bindings);

    info!(count = bindings.len(), active, changed = changed.len(), "product bindings activation set");
    let (activated, deactivated) = if active { (changed, Vec::new()) } else { (Vec::new(), changed) };
    Ok(ActivationReport { activated, deactivated, cascade })
}

/// Flip the active flag of each binding independently, then cascade.
pub fn toggle_published(
    repo: &mut dyn BindingRepository,
    ids: &[ProductBindingId],
) -> BindingResult<ActivationReport> {
    let mut bindings = load_bindings(repo, ids)?;
    let (to_deactivate, to_activate): (Vec<ProductBindingId>, Vec<ProductBindingId>) = {
        let (on, off): (Vec<&ProductBinding>, Vec<&ProductBinding>) =
            bindings.iter().partition(|b| b.is_active());
        (
            on.iter().map(|b| b.id_typed()).collect(),
            off.iter().map(|b| b.id_typed()).collect(),
        )
    };

    if !to_activate.is_empty() {
        repo.set_product_bindings_active(&to_activate, true);
    }
    if !to_deactivate.is_empty() {
        repo.set_product_bindings_active(&to_deactivate, false);
    }
    for binding in &mut bindings {
        binding.active = !binding.active;
    }
    let cascade = cascade_active(repo, &bindings);

    info!(
        activated = to_activate.len(),
        deactivated = to_deactivate.len(),
        "product bindings publication toggled"
    );
    Ok(ActivationReport {
        activated: to_activate,
        deactivated: to_deactivate,
        cascade,
    })
}
