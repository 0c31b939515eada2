//! Event — an immutable record of a pipeline outcome, published on the
//! in-process bus so observers (UI, logs) can react without being called
//! inline.

use serde::{Deserialize, Serialize};

use crate::id::{EntityKey, EventId};
use crate::time::{Timestamp, now};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    IntentQueued,
    IntentRejected,
    CommandDispatched,
    DispatchFailed,
    ApprovalResolved,
    ModeChanged,
    PolicyUpdated,
}

/// A pipeline outcome record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    /// The device concerned, when there is exactly one.
    pub device: Option<EntityKey>,
    /// Event-specific payload.
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl Event {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(event_type: EventType, device: Option<EntityKey>, data: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            device,
            data,
            timestamp: now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_assign_unique_ids() {
        let a = Event::new(EventType::ModeChanged, None, serde_json::json!({}));
        let b = Event::new(EventType::ModeChanged, None, serde_json::json!({}));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let event = Event::new(
            EventType::CommandDispatched,
            Some(EntityKey::parse("light.living_room").unwrap()),
            serde_json::json!({"service": "light.turn_on"}),
        );
        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, event.id);
        assert_eq!(parsed.event_type, EventType::CommandDispatched);
    }
}
