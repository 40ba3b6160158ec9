use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use storefront_core::{Entity, aggregate_newtype};

use crate::category::CategoryId;
use crate::language::LanguageCode;

aggregate_newtype!(
    /// Catalog product identifier (the product template).
    ProductId
);

aggregate_newtype!(
    /// Identifier of one sellable variant of a catalog product.
    VariantId
);

/// Translatable text: a source value plus per-language overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedText {
    source: String,
    #[serde(default)]
    translations: BTreeMap<LanguageCode, String>,
}

impl TranslatedText {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            translations: BTreeMap::new(),
        }
    }

    pub fn with_translation(mut self, language: LanguageCode, value: impl Into<String>) -> Self {
        self.translations.insert(language, value.into());
        self
    }

    pub fn set_translation(&mut self, language: LanguageCode, value: impl Into<String>) {
        self.translations.insert(language, value.into());
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Value in `language`, falling back to the source text.
    pub fn get(&self, language: &LanguageCode) -> &str {
        self.translations
            .get(language)
            .map(String::as_str)
            .unwrap_or(&self.source)
    }
}

impl From<&str> for TranslatedText {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TranslatedText {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Source-of-truth product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    id: ProductId,
    name: TranslatedText,
    default_code: Option<String>,
    category: Option<CategoryId>,
    #[serde(default)]
    extra_categories: Vec<CategoryId>,
}

impl CatalogProduct {
    pub fn new(id: ProductId, name: impl Into<TranslatedText>) -> Self {
        Self {
            id,
            name: name.into(),
            default_code: None,
            category: None,
            extra_categories: Vec::new(),
        }
    }

    /// Blank codes are treated as "no code".
    pub fn with_default_code(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        let code = code.trim();
        self.default_code = (!code.is_empty()).then(|| code.to_string());
        self
    }

    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    /// Secondary categories (e.g. public categories of a kit or a pack).
    pub fn with_extra_categories(mut self, categories: impl IntoIterator<Item = CategoryId>) -> Self {
        self.extra_categories = categories.into_iter().collect();
        self
    }

    pub fn rename(&mut self, name: impl Into<TranslatedText>) {
        self.name = name.into();
    }

    pub fn set_category(&mut self, category: Option<CategoryId>) {
        self.category = category;
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &TranslatedText {
        &self.name
    }

    pub fn default_code(&self) -> Option<&str> {
        self.default_code.as_deref()
    }

    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }

    pub fn extra_categories(&self) -> &[CategoryId] {
        &self.extra_categories
    }
}

impl Entity for CatalogProduct {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// One variant of a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    id: VariantId,
    product: ProductId,
    active: bool,
}

impl ProductVariant {
    pub fn new(id: VariantId, product: ProductId) -> Self {
        Self {
            id,
            product,
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn id_typed(&self) -> VariantId {
        self.id
    }

    pub fn product(&self) -> ProductId {
        self.product
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Entity for ProductVariant {
    type Id = VariantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(code: &str) -> LanguageCode {
        LanguageCode::new(code).unwrap()
    }

    #[test]
    fn translated_text_falls_back_to_source() {
        let name = TranslatedText::new("Blue Shirt").with_translation(lang("fr_FR"), "Chemise bleue");

        assert_eq!(name.get(&lang("fr_FR")), "Chemise bleue");
        assert_eq!(name.get(&lang("de_DE")), "Blue Shirt");
        assert_eq!(name.source(), "Blue Shirt");
    }

    #[test]
    fn blank_default_code_is_dropped() {
        let product = CatalogProduct::new(ProductId::generate(), "Shirt").with_default_code("   ");
        assert_eq!(product.default_code(), None);

        let product = product.with_default_code(" BS-01 ");
        assert_eq!(product.default_code(), Some("BS-01"));
    }

    #[test]
    fn variants_start_active() {
        let product = ProductId::generate();
        let variant = ProductVariant::new(VariantId::generate(), product);
        assert!(variant.is_active());
        assert!(!variant.clone().inactive().is_active());
        assert_eq!(variant.product(), product);
    }

    #[test]
    fn product_serializes_translations_by_language_code() {
        let product = CatalogProduct::new(
            ProductId::generate(),
            TranslatedText::new("Shirt").with_translation(lang("fr_FR"), "Chemise"),
        );
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["name"]["translations"]["fr_FR"], "Chemise");
    }
}
