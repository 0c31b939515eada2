//! In-memory device backend with a fixed floor plan.

use std::collections::HashMap;
use std::sync::Mutex;

use autohome_app::ports::DeviceAdapter;
use autohome_domain::device::{AttributeValue, Device, DeviceKind, DeviceState};
use autohome_domain::error::DispatchError;
use autohome_domain::id::EntityKey;

/// Simulated device backend mutating a local map.
///
/// Service semantics mirror a real home hub: `turn_on` accepts an optional
/// `brightness`, brightness is clamped to 0–100, and `set_temperature`
/// writes the target straight into the device's attributes.
pub struct MockDeviceAdapter {
    devices: Mutex<HashMap<EntityKey, Device>>,
    fail_next: Mutex<Option<String>>,
}

impl Default for MockDeviceAdapter {
    fn default() -> Self {
        let devices = seed_devices()
            .into_iter()
            .map(|device| (device.key.clone(), device))
            .collect();
        Self {
            devices: Mutex::new(devices),
            fail_next: Mutex::new(None),
        }
    }
}

impl MockDeviceAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a custom set of devices instead of the default floor plan.
    #[must_use]
    pub fn with_devices(devices: Vec<Device>) -> Self {
        Self {
            devices: Mutex::new(
                devices
                    .into_iter()
                    .map(|device| (device.key.clone(), device))
                    .collect(),
            ),
            fail_next: Mutex::new(None),
        }
    }

    /// Make the next service call fail with the given message.
    pub fn inject_failure(&self, message: impl Into<String>) {
        *self.fail_next.lock().unwrap() = Some(message.into());
    }
}

impl DeviceAdapter for MockDeviceAdapter {
    async fn list_entities(&self) -> Result<Vec<Device>, DispatchError> {
        let devices = self.devices.lock().unwrap();
        let mut listed: Vec<Device> = devices.values().cloned().collect();
        listed.sort_by(|a, b| a.key.as_str().cmp(b.key.as_str()));
        Ok(listed)
    }

    async fn get_state(&self, key: &EntityKey) -> Result<Option<Device>, DispatchError> {
        Ok(self.devices.lock().unwrap().get(key).cloned())
    }

    async fn call_service(
        &self,
        _domain: &str,
        service: &str,
        payload: serde_json::Value,
    ) -> Result<(), DispatchError> {
        if let Some(message) = self.fail_next.lock().unwrap().take() {
            return Err(DispatchError::Backend(message));
        }

        let entity_id = payload
            .get("entity_id")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| DispatchError::Backend("payload missing entity_id".to_string()))?;
        let key = EntityKey::parse(entity_id)
            .map_err(|err| DispatchError::Backend(err.to_string()))?;

        let mut devices = self.devices.lock().unwrap();
        let device = devices.get_mut(&key).ok_or_else(|| DispatchError::Backend(
            format!("unknown entity '{key}'"),
        ))?;

        match service {
            "turn_on" => {
                device.state = DeviceState::Bool(true);
                if let Some(brightness) = payload.get("brightness").and_then(serde_json::Value::as_i64)
                {
                    device.attributes.insert(
                        "brightness".to_string(),
                        AttributeValue::Int(brightness.clamp(0, 100)),
                    );
                }
                Ok(())
            }
            "turn_off" => {
                device.state = DeviceState::Bool(false);
                Ok(())
            }
            "toggle" => {
                let on = device.state.as_bool().unwrap_or(false);
                device.state = DeviceState::Bool(!on);
                Ok(())
            }
            "set_brightness" => {
                let brightness = payload
                    .get("brightness")
                    .and_then(serde_json::Value::as_i64)
                    .unwrap_or(0);
                device.state = DeviceState::Bool(true);
                device.attributes.insert(
                    "brightness".to_string(),
                    AttributeValue::Int(brightness.clamp(0, 100)),
                );
                Ok(())
            }
            "set_temperature" => {
                let temperature = payload
                    .get("temperature")
                    .and_then(serde_json::Value::as_f64)
                    .ok_or_else(|| {
                        DispatchError::Backend("payload missing temperature".to_string())
                    })?;
                device.state = DeviceState::Number(temperature);
                device.attributes.insert(
                    "temperature".to_string(),
                    AttributeValue::Float(temperature),
                );
                Ok(())
            }
            other => Err(DispatchError::UnsupportedService {
                entity_id: key.to_string(),
                service: other.to_string(),
            }),
        }
    }
}

fn seed_devices() -> Vec<Device> {
    vec![
        light("light.living_room", "living_room", true, 80),
        light("light.bedroom", "bedroom", false, 0),
        binary("switch.coffee_machine", DeviceKind::Switch, "kitchen"),
        binary("fan.office_fan", DeviceKind::Fan, "office"),
        binary("cover.garage", DeviceKind::Cover, "garage"),
        thermostat("climate.thermostat_hall", "hall", 68.0),
    ]
}

fn light(key: &str, room: &str, on: bool, brightness: i64) -> Device {
    Device::builder()
        .key(EntityKey::parse(key).unwrap())
        .kind(DeviceKind::Light)
        .state(DeviceState::Bool(on))
        .attribute("brightness", AttributeValue::Int(brightness))
        .room(room)
        .available(true)
        .build()
        .unwrap()
}

fn binary(key: &str, kind: DeviceKind, room: &str) -> Device {
    Device::builder()
        .key(EntityKey::parse(key).unwrap())
        .kind(kind)
        .state(DeviceState::Bool(false))
        .room(room)
        .available(true)
        .build()
        .unwrap()
}

fn thermostat(key: &str, room: &str, temperature: f64) -> Device {
    Device::builder()
        .key(EntityKey::parse(key).unwrap())
        .kind(DeviceKind::Climate)
        .state(DeviceState::Number(temperature))
        .attribute("temperature", AttributeValue::Float(temperature))
        .room(room)
        .available(true)
        .build()
        .unwrap()
}
