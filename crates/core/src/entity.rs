//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Bindings and catalog records are entities: two records with the same id are
/// the same record, whatever their current field values.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Returns `true` when `other` has the same identity.
    fn same_identity_as(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
