use serde::{Deserialize, Serialize};

use storefront_core::{Entity, aggregate_newtype};

use crate::product::TranslatedText;

aggregate_newtype!(
    /// Catalog category identifier.
    CategoryId
);

/// Node of the catalog category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    id: CategoryId,
    name: TranslatedText,
    parent: Option<CategoryId>,
}

impl Category {
    pub fn root(id: CategoryId, name: impl Into<TranslatedText>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
        }
    }

    pub fn child_of(id: CategoryId, name: impl Into<TranslatedText>, parent: CategoryId) -> Self {
        Self {
            id,
            name: name.into(),
            parent: Some(parent),
        }
    }

    pub fn id_typed(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &TranslatedText {
        &self.name
    }

    pub fn parent(&self) -> Option<CategoryId> {
        self.parent
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
