//! Lifecycle events published after a binding operation commits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_catalog::{LanguageCode, ProductId};
use storefront_core::ChannelId;
use storefront_events::Event;

use crate::model::{CategoryBindingId, ProductBindingId, UrlId, VariantBindingId};

/// Event: BindingCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingCreated {
    pub channel_id: ChannelId,
    pub binding_id: ProductBindingId,
    pub product_id: ProductId,
    pub language: LanguageCode,
    pub slug: Option<String>,
    pub active: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: VariantBindingsCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantBindingsCreated {
    pub channel_id: ChannelId,
    pub binding_id: ProductBindingId,
    pub variant_bindings: Vec<VariantBindingId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BindingActivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingActivated {
    pub channel_id: ChannelId,
    pub binding_id: ProductBindingId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BindingDeactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingDeactivated {
    pub channel_id: ChannelId,
    pub binding_id: ProductBindingId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BindingRecomputed (derived fields changed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingRecomputed {
    pub channel_id: ChannelId,
    pub binding_id: ProductBindingId,
    pub display_name: String,
    pub slug: Option<String>,
    pub seo_title: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: UrlsRedirected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlsRedirected {
    pub channel_id: ChannelId,
    pub binding_id: ProductBindingId,
    pub urls: Vec<UrlId>,
    /// `None` when the URLs were dropped for lack of a target.
    pub category_binding: Option<CategoryBindingId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BindingUnlinked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingUnlinked {
    pub channel_id: ChannelId,
    pub binding_id: ProductBindingId,
    pub product_id: ProductId,
    pub variant_bindings_removed: usize,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingEvent {
    BindingCreated(BindingCreated),
    VariantBindingsCreated(VariantBindingsCreated),
    BindingActivated(BindingActivated),
    BindingDeactivated(BindingDeactivated),
    BindingRecomputed(BindingRecomputed),
    UrlsRedirected(UrlsRedirected),
    BindingUnlinked(BindingUnlinked),
}

impl BindingEvent {
    pub fn channel_id(&self) -> ChannelId {
        match self {
            BindingEvent::BindingCreated(e) => e.channel_id,
            BindingEvent::VariantBindingsCreated(e) => e.channel_id,
            BindingEvent::BindingActivated(e) => e.channel_id,
            BindingEvent::BindingDeactivated(e) => e.channel_id,
            BindingEvent::BindingRecomputed(e) => e.channel_id,
            BindingEvent::UrlsRedirected(e) => e.channel_id,
            BindingEvent::BindingUnlinked(e) => e.channel_id,
        }
    }

    /// Product binding the event is about; the envelope's aggregate.
    pub fn binding_id(&self) -> ProductBindingId {
        match self {
            BindingEvent::BindingCreated(e) => e.binding_id,
            BindingEvent::VariantBindingsCreated(e) => e.binding_id,
            BindingEvent::BindingActivated(e) => e.binding_id,
            BindingEvent::BindingDeactivated(e) => e.binding_id,
            BindingEvent::BindingRecomputed(e) => e.binding_id,
            BindingEvent::UrlsRedirected(e) => e.binding_id,
            BindingEvent::BindingUnlinked(e) => e.binding_id,
        }
    }
}

impl Event for BindingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BindingEvent::BindingCreated(_) => "storefront.product_binding.created",
            BindingEvent::VariantBindingsCreated(_) => "storefront.product_binding.variants_created",
            BindingEvent::BindingActivated(_) => "storefront.product_binding.activated",
            BindingEvent::BindingDeactivated(_) => "storefront.product_binding.deactivated",
            BindingEvent::BindingRecomputed(_) => "storefront.product_binding.recomputed",
            BindingEvent::UrlsRedirected(_) => "storefront.product_binding.urls_redirected",
            BindingEvent::BindingUnlinked(_) => "storefront.product_binding.unlinked",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BindingEvent::BindingCreated(e) => e.occurred_at,
            BindingEvent::VariantBindingsCreated(e) => e.occurred_at,
            BindingEvent::BindingActivated(e) => e.occurred_at,
            BindingEvent::BindingDeactivated(e) => e.occurred_at,
            BindingEvent::BindingRecomputed(e) => e.occurred_at,
            BindingEvent::UrlsRedirected(e) => e.occurred_at,
            BindingEvent::BindingUnlinked(e) => e.occurred_at,
        }
    }
}
