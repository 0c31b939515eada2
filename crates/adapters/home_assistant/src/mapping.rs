//! Pure mapping from Home Assistant state payloads to domain devices.

use serde::Deserialize;
use serde_json::Value;

use autohome_domain::device::{AttributeValue, Device, DeviceKind, DeviceState};
use autohome_domain::id::EntityKey;

/// One entry of `GET /api/states`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatePayload {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: serde_json::Map<String, Value>,
}

/// Map one state payload to a [`Device`], `None` when the entity's domain is
/// not one the pipeline handles.
#[must_use]
pub fn device_from_state(payload: &StatePayload) -> Option<Device> {
    let key = EntityKey::parse(&payload.entity_id).ok()?;
    let kind = DeviceKind::from_domain(key.domain())?;

    let available = payload.state != "unavailable" && payload.state != "unknown";
    let state = match payload.state.as_str() {
        "on" | "open" => DeviceState::Bool(true),
        "off" | "closed" => DeviceState::Bool(false),
        other => other
            .parse::<f64>()
            .map_or_else(|_| DeviceState::Text(other.to_string()), DeviceState::Number),
    };

    let mut builder = Device::builder()
        .key(key)
        .kind(kind)
        .state(state)
        .available(available);
    for (name, value) in &payload.attributes {
        if name == "room"
            && let Some(room) = value.as_str()
        {
            builder = builder.room(room);
            continue;
        }
        builder = builder.attribute(name.clone(), attribute_from_value(value));
    }

    // the builder only fails on a missing key or state, both set above
    builder.build().ok()
}

fn attribute_from_value(value: &Value) -> AttributeValue {
    match value {
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) if n.is_i64() => AttributeValue::Int(n.as_i64().unwrap_or_default()),
        Value::Number(n) => AttributeValue::Float(n.as_f64().unwrap_or_default()),
        Value::String(s) => AttributeValue::String(s.clone()),
        other => AttributeValue::Json(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(entity_id: &str, state: &str, attributes: Value) -> StatePayload {
        StatePayload {
            entity_id: entity_id.to_string(),
            state: state.to_string(),
            attributes: attributes.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn should_map_an_on_light_with_brightness() {
        let device = device_from_state(&payload(
            "light.living_room",
            "on",
            json!({ "brightness": 80, "room": "living_room" }),
        ))
        .unwrap();

        assert_eq!(device.kind, DeviceKind::Light);
        assert_eq!(device.state, DeviceState::Bool(true));
        assert_eq!(
            device.attributes.get("brightness"),
            Some(&AttributeValue::Int(80))
        );
        assert_eq!(device.room.as_deref(), Some("living_room"));
        assert!(device.available);
    }

    #[test]
    fn should_map_numeric_states() {
        let device = device_from_state(&payload(
            "climate.thermostat_hall",
            "68.5",
            json!({}),
        ))
        .unwrap();
        assert_eq!(device.state, DeviceState::Number(68.5));
    }

    #[test]
    fn should_mark_unavailable_entities() {
        let device =
            device_from_state(&payload("switch.coffee_machine", "unavailable", json!({})))
                .unwrap();
        assert!(!device.available);
    }

    #[test]
    fn should_skip_domains_the_pipeline_does_not_handle() {
        assert!(device_from_state(&payload("sun.sun", "above_horizon", json!({}))).is_none());
        assert!(device_from_state(&payload("notakey", "on", json!({}))).is_none());
    }

    #[test]
    fn should_keep_unstructured_attributes_as_json() {
        let device = device_from_state(&payload(
            "light.bedroom",
            "off",
            json!({ "rgb_color": [255, 180, 120] }),
        ))
        .unwrap();
        assert_eq!(
            device.attributes.get("rgb_color"),
            Some(&AttributeValue::Json(json!([255, 180, 120])))
        );
    }
}
