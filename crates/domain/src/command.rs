//! Command — the wire-level unit sent to the device backend.

use serde::{Deserialize, Serialize};

use crate::id::EntityKey;

/// A single service call, e.g. `light.turn_on` on `light.living_room`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub entity_id: EntityKey,
    /// Fully qualified service name, `domain.action`.
    pub service: String,
    /// Service-specific payload fields (brightness, temperature, …).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Command {
    /// Build a command whose service domain follows the entity key.
    #[must_use]
    pub fn for_entity(entity_id: EntityKey, action: &str, data: Option<serde_json::Value>) -> Self {
        let service = format!("{}.{action}", entity_id.domain());
        Self {
            entity_id,
            service,
            data,
        }
    }

    /// The domain half of the service name.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.service.split_once('.').map_or("", |(domain, _)| domain)
    }

    /// The action half of the service name.
    #[must_use]
    pub fn action(&self) -> &str {
        self.service
            .split_once('.')
            .map_or(self.service.as_str(), |(_, action)| action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_derive_service_domain_from_entity_key() {
        let command = Command::for_entity(
            EntityKey::parse("cover.garage").unwrap(),
            "turn_on",
            None,
        );
        assert_eq!(command.service, "cover.turn_on");
        assert_eq!(command.domain(), "cover");
        assert_eq!(command.action(), "turn_on");
    }

    #[test]
    fn should_carry_payload_data() {
        let command = Command::for_entity(
            EntityKey::parse("climate.thermostat_hall").unwrap(),
            "set_temperature",
            Some(serde_json::json!({"temperature": 72.0})),
        );
        assert_eq!(command.data.unwrap()["temperature"], 72.0);
    }
}
