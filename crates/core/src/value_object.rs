//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**: they are defined entirely by their
//! attribute values. A language code or a slug is a value object; a product
//! binding is an entity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct LanguageCode(String);
///
/// impl ValueObject for LanguageCode {}
///
/// assert_eq!(LanguageCode("en".into()), LanguageCode("en".into()));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
