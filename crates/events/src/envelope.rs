use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::Event;

/// A published event plus what a consumer needs to route and order it.
///
/// Payloads already name their channel and binding, so the envelope only
/// adds delivery metadata: a unique id, the payload's type and schema
/// version, and the publisher's sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    event_type: String,
    event_version: u32,
    /// Position in the publisher's stream; strictly increasing.
    sequence: u64,
    payload: E,
}

impl<E: Event> EventEnvelope<E> {
    /// Wrap `payload` as the `sequence`-th delivery of its publisher.
    pub fn seal(sequence: u64, payload: E) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: payload.event_type().to_string(),
            event_version: payload.version(),
            sequence,
            payload,
        }
    }
}

impl<E> EventEnvelope<E> {
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_version(&self) -> u32 {
        self.event_version
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Renamed {
        at: DateTime<Utc>,
    }

    impl Event for Renamed {
        fn event_type(&self) -> &'static str {
            "test.renamed"
        }

        fn version(&self) -> u32 {
            2
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    #[test]
    fn seal_copies_type_and_version_from_the_payload() {
        let payload = Renamed { at: Utc::now() };
        let envelope = EventEnvelope::seal(7, payload.clone());

        assert_eq!(envelope.event_type(), "test.renamed");
        assert_eq!(envelope.event_version(), 2);
        assert_eq!(envelope.sequence(), 7);
        assert_eq!(envelope.into_payload(), payload);
    }

    #[test]
    fn every_envelope_gets_its_own_id() {
        let payload = Renamed { at: Utc::now() };
        let first = EventEnvelope::seal(1, payload.clone());
        let second = EventEnvelope::seal(2, payload);
        assert_ne!(first.event_id(), second.event_id());
    }
}
