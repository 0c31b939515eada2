//! Device — the read-mostly cached description of a controllable thing.
//!
//! The device backend owns the truth; the core holds a cached copy that is
//! updated optimistically on dispatch and refreshed after confirmation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::EntityKey;

/// Category of device, usually mirrored by the key's domain prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Switch,
    Light,
    Climate,
    Sensor,
    Cover,
    Camera,
    Fan,
}

impl DeviceKind {
    /// Map a key's domain prefix to a kind, when it is one we model.
    #[must_use]
    pub fn from_domain(domain: &str) -> Option<Self> {
        match domain {
            "switch" => Some(Self::Switch),
            "light" => Some(Self::Light),
            "climate" => Some(Self::Climate),
            "sensor" => Some(Self::Sensor),
            "cover" => Some(Self::Cover),
            "camera" => Some(Self::Camera),
            "fan" => Some(Self::Fan),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Switch => "switch",
            Self::Light => "light",
            Self::Climate => "climate",
            Self::Sensor => "sensor",
            Self::Cover => "cover",
            Self::Camera => "camera",
            Self::Fan => "fan",
        };
        f.write_str(name)
    }
}

/// Current primary state of a device; the shape depends on the kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceState {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl DeviceState {
    /// Numeric view of the state, when it has one.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }

    /// Boolean view of the state, when it has one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Number(_) | Self::Text(_) => None,
        }
    }
}

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Json(serde_json::Value),
}

/// Cached description of a device known to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub key: EntityKey,
    pub kind: DeviceKind,
    pub state: DeviceState,
    #[serde(default)]
    pub attributes: HashMap<String, AttributeValue>,
    #[serde(default)]
    pub room: Option<String>,
    pub available: bool,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    key: Option<EntityKey>,
    kind: Option<DeviceKind>,
    state: Option<DeviceState>,
    attributes: HashMap<String, AttributeValue>,
    room: Option<String>,
    available: Option<bool>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn key(mut self, key: EntityKey) -> Self {
        self.key = Some(key);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: DeviceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn state(mut self, state: DeviceState) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    #[must_use]
    pub fn available(mut self, available: bool) -> Self {
        self.available = Some(available);
        self
    }

    /// Consume the builder and return a [`Device`].
    ///
    /// The kind defaults to whatever the key's domain prefix implies.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedEntityKey`] when no key was given
    /// or when the key's domain maps to no known kind and none was set
    /// explicitly.
    pub fn build(self) -> Result<Device, ValidationError> {
        let key = self
            .key
            .ok_or_else(|| ValidationError::MalformedEntityKey(String::new()))?;
        let kind = match self.kind.or_else(|| DeviceKind::from_domain(key.domain())) {
            Some(kind) => kind,
            None => return Err(ValidationError::MalformedEntityKey(key.to_string())),
        };
        Ok(Device {
            key,
            kind,
            state: self.state.unwrap_or(DeviceState::Bool(false)),
            attributes: self.attributes,
            room: self.room,
            available: self.available.unwrap_or(true),
        })
    }
}
