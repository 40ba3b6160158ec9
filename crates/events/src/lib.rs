//! Lifecycle events: the envelope, the event contract and the pub/sub bus.
//!
//! Binding operations commit their writes first, then publish what happened so
//! downstream consumers (search indexers, caches, audit) can follow along.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
