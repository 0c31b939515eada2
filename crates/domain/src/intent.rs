//! Intent — a structured, immutable representation of a requested action.
//!
//! Produced by an external NLU collaborator and consumed exactly once by the
//! pipeline. Each variant carries only the fields the variant needs, so the
//! dispatcher can match exhaustively instead of probing optional fields.

use serde::{Deserialize, Serialize};

use crate::guardrail::GuardrailSetting;
use crate::id::EntityKey;
use crate::time::Timestamp;

/// A continuous level carried by a [`Intent::SetLevel`] request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelValue {
    /// Brightness or speed as a percentage, 0–100.
    Percent(u8),
    /// Target temperature in °F.
    Temperature(f64),
}

impl LevelValue {
    /// The raw numeric value, used for guardrail bound checks.
    #[must_use]
    pub fn numeric(self) -> f64 {
        match self {
            Self::Percent(value) => f64::from(value),
            Self::Temperature(value) => value,
        }
    }

    /// The device field this level writes, used as the debounce key.
    #[must_use]
    pub fn field(self) -> &'static str {
        match self {
            Self::Percent(_) => "brightness",
            Self::Temperature(_) => "temperature",
        }
    }
}

/// A requested change, parsed from chat text or raised by a UI control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    /// Switch a device on or off.
    ToggleDevice { device: EntityKey, on: bool },
    /// Set a continuous value (brightness, temperature) on a device.
    SetLevel { device: EntityKey, value: LevelValue },
    /// Reach a target temperature by a deadline.
    ScheduleDevice {
        device: EntityKey,
        temperature: f64,
        deadline: Timestamp,
    },
    /// Re-plan the schedule against pricing; handled by the optimizer
    /// collaborator, not dispatched as a device command.
    RunOptimization { cheapest: bool, avoid_peak: bool },
    /// Replace the guardrail setting for a device.
    SetPolicy {
        device: EntityKey,
        setting: GuardrailSetting,
    },
    /// Read-only status question.
    QueryStatus { parameters: serde_json::Value },
}

impl Intent {
    /// The device this intent targets, when it targets exactly one.
    #[must_use]
    pub fn device(&self) -> Option<&EntityKey> {
        match self {
            Self::ToggleDevice { device, .. }
            | Self::SetLevel { device, .. }
            | Self::ScheduleDevice { device, .. }
            | Self::SetPolicy { device, .. } => Some(device),
            Self::RunOptimization { .. } | Self::QueryStatus { .. } => None,
        }
    }

    /// The action name checked against a guardrail's allow-list.
    #[must_use]
    pub fn action(&self) -> Option<&'static str> {
        match self {
            Self::ToggleDevice { on: true, .. } => Some("turn_on"),
            Self::ToggleDevice { on: false, .. } => Some("turn_off"),
            Self::SetLevel {
                value: LevelValue::Percent(_),
                ..
            } => Some("set_brightness"),
            Self::SetLevel {
                value: LevelValue::Temperature(_),
                ..
            }
            | Self::ScheduleDevice { .. } => Some("set_temperature"),
            Self::RunOptimization { .. } | Self::SetPolicy { .. } | Self::QueryStatus { .. } => {
                None
            }
        }
    }

    /// The numeric value carried by value-bearing intents, used for bound
    /// checks. `None` for everything else.
    #[must_use]
    pub fn numeric_value(&self) -> Option<f64> {
        match self {
            Self::SetLevel { value, .. } => Some(value.numeric()),
            Self::ScheduleDevice { temperature, .. } => Some(*temperature),
            _ => None,
        }
    }

    /// Short human-readable summary for approval cards and logs.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::ToggleDevice { device, on } => {
                format!("Turn {} {}", if *on { "on" } else { "off" }, device)
            }
            Self::SetLevel { device, value } => match value {
                LevelValue::Percent(pct) => format!("Set {device} to {pct}%"),
                LevelValue::Temperature(temp) => format!("Set {device} to {temp}°F"),
            },
            Self::ScheduleDevice {
                device,
                temperature,
                deadline,
            } => format!("Reach {temperature}°F on {device} by {deadline}"),
            Self::RunOptimization { .. } => "Re-optimize the schedule".to_string(),
            Self::SetPolicy { device, .. } => format!("Update guardrails for {device}"),
            Self::QueryStatus { .. } => "Status query".to_string(),
        }
    }
}
