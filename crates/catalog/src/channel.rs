use serde::{Deserialize, Serialize};

use storefront_core::{ChannelId, Entity};

/// Sales channel (a storefront backend).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    id: ChannelId,
    name: String,
    website_public_name: Option<String>,
    /// Lets bindings of this channel replace the product name with their own.
    use_override_name: bool,
}

impl Channel {
    pub fn new(id: ChannelId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            website_public_name: None,
            use_override_name: false,
        }
    }

    pub fn with_public_name(mut self, public_name: impl Into<String>) -> Self {
        self.website_public_name = Some(public_name.into());
        self
    }

    pub fn with_override_names(mut self, enabled: bool) -> Self {
        self.use_override_name = enabled;
        self
    }

    pub fn set_public_name(&mut self, public_name: Option<String>) {
        self.website_public_name = public_name;
    }

    pub fn set_use_override_name(&mut self, enabled: bool) {
        self.use_override_name = enabled;
    }

    pub fn id_typed(&self) -> ChannelId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn website_public_name(&self) -> Option<&str> {
        self.website_public_name.as_deref()
    }

    pub fn use_override_name(&self) -> bool {
        self.use_override_name
    }
}

impl Entity for Channel {
    type Id = ChannelId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
