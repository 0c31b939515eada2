//! Guardrail — per-device policy and the pure evaluator.
//!
//! Evaluation is synchronous and touches nothing but its arguments, so it can
//! run inline on the hot path. All checks run even after a violation is found
//! so the caller gets the complete list of reasons.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::action_log::ActionLog;
use crate::error::ValidationError;
use crate::intent::Intent;
use crate::time::{Timestamp, hour_of};

/// An hour range during which actions need human sign-off.
///
/// The range may wrap midnight: `start=22, end=7` covers 22:00–06:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    /// First quiet hour, 0–23.
    pub start: u8,
    /// First hour after the quiet window, 0–23.
    pub end: u8,
}

impl QuietHours {
    /// Whether the given hour-of-day falls inside the quiet window.
    #[must_use]
    pub fn contains(&self, hour: u8) -> bool {
        if self.start <= self.end {
            self.start <= hour && hour < self.end
        } else {
            hour >= self.start || hour < self.end
        }
    }
}

/// Per-device policy constraining permitted actions, values, and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailSetting {
    pub enabled: bool,
    /// Action names the device accepts; `None` means unrestricted.
    #[serde(default)]
    pub allowed_actions: Option<HashSet<String>>,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub quiet_hours: Option<QuietHours>,
    /// Successful dispatches allowed per trailing hour; `None` means unlimited.
    #[serde(default)]
    pub max_actions_per_hour: Option<u32>,
    pub require_confirmation: bool,
}

impl Default for GuardrailSetting {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_actions: None,
            min_value: None,
            max_value: None,
            quiet_hours: None,
            max_actions_per_hour: None,
            require_confirmation: false,
        }
    }
}

impl GuardrailSetting {
    /// Create a builder for constructing a [`GuardrailSetting`].
    #[must_use]
    pub fn builder() -> GuardrailSettingBuilder {
        GuardrailSettingBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedBounds`] when `min_value` exceeds
    /// `max_value`, or [`ValidationError::InvalidQuietHour`] for hours
    /// outside 0–23.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let (Some(min), Some(max)) = (self.min_value, self.max_value)
            && min > max
        {
            return Err(ValidationError::InvertedBounds { min, max });
        }
        if let Some(quiet) = self.quiet_hours {
            for hour in [quiet.start, quiet.end] {
                if hour > 23 {
                    return Err(ValidationError::InvalidQuietHour(hour));
                }
            }
        }
        Ok(())
    }

    /// Evaluate an intent against this policy.
    ///
    /// Pure and synchronous. Checks run in a fixed order and are never
    /// short-circuited, so `reasons` lists every violation at once:
    ///
    /// 1. disabled device → block
    /// 2. action outside the allow-list → block
    /// 3. value outside `[min, max]` → block (never silently clamped —
    ///    clamping would hide the user's actual request)
    /// 4. quiet hours → escalate
    /// 5. hourly rate limit reached → escalate, never drop
    /// 6. `require_confirmation` → escalate, regardless of everything else
    #[must_use]
    pub fn evaluate(&self, intent: &Intent, log: &ActionLog, now: Timestamp) -> Decision {
        let mut reasons = Vec::new();
        let mut allow = true;
        let mut requires_approval = false;

        if !self.enabled {
            allow = false;
            reasons.push(DecisionReason::Disabled);
        }

        if let (Some(allowed), Some(action)) = (&self.allowed_actions, intent.action())
            && !allowed.contains(action)
        {
            allow = false;
            reasons.push(DecisionReason::ActionNotAllowed {
                action: action.to_string(),
            });
        }

        if let Some(value) = intent.numeric_value() {
            let below = self.min_value.is_some_and(|min| value < min);
            let above = self.max_value.is_some_and(|max| value > max);
            if below || above {
                allow = false;
                reasons.push(DecisionReason::ValueOutOfBounds {
                    value,
                    min: self.min_value,
                    max: self.max_value,
                });
            }
        }

        if let Some(quiet) = self.quiet_hours
            && quiet.contains(hour_of(now))
        {
            requires_approval = true;
            reasons.push(DecisionReason::QuietHours {
                start: quiet.start,
                end: quiet.end,
            });
        }

        if let Some(limit) = self.max_actions_per_hour {
            let count = log.count_last_hour(now);
            if count >= limit as usize {
                requires_approval = true;
                reasons.push(DecisionReason::RateLimited { count, limit });
            }
        }

        if self.require_confirmation {
            requires_approval = true;
            reasons.push(DecisionReason::ConfirmationRequired);
        }

        Decision {
            allow,
            requires_approval,
            reasons,
        }
    }
}

/// Step-by-step builder for [`GuardrailSetting`].
#[derive(Debug, Default)]
pub struct GuardrailSettingBuilder {
    setting: GuardrailSetting,
}

impl GuardrailSettingBuilder {
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.setting.enabled = enabled;
        self
    }

    #[must_use]
    pub fn allowed_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.setting.allowed_actions = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn bounds(mut self, min: f64, max: f64) -> Self {
        self.setting.min_value = Some(min);
        self.setting.max_value = Some(max);
        self
    }

    #[must_use]
    pub fn min_value(mut self, min: f64) -> Self {
        self.setting.min_value = Some(min);
        self
    }

    #[must_use]
    pub fn max_value(mut self, max: f64) -> Self {
        self.setting.max_value = Some(max);
        self
    }

    #[must_use]
    pub fn quiet_hours(mut self, start: u8, end: u8) -> Self {
        self.setting.quiet_hours = Some(QuietHours { start, end });
        self
    }

    #[must_use]
    pub fn max_actions_per_hour(mut self, limit: u32) -> Self {
        self.setting.max_actions_per_hour = Some(limit);
        self
    }

    #[must_use]
    pub fn require_confirmation(mut self, require: bool) -> Self {
        self.setting.require_confirmation = require;
        self
    }

    /// Consume the builder, validate, and return the setting.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when invariants fail.
    pub fn build(self) -> Result<GuardrailSetting, ValidationError> {
        self.setting.validate()?;
        Ok(self.setting)
    }
}

/// Outcome of evaluating one intent against one device's policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// `false` when any hard check failed; hard blocks are never queued.
    pub allow: bool,
    /// `true` when the intent needs human sign-off before dispatch.
    pub requires_approval: bool,
    /// Every violated check, in evaluation order.
    pub reasons: Vec<DecisionReason>,
}

impl Decision {
    /// A decision that permits immediate dispatch.
    #[must_use]
    pub fn allowed() -> Self {
        Self {
            allow: true,
            requires_approval: false,
            reasons: Vec::new(),
        }
    }

    /// Reasons rendered as short badge strings for approval cards.
    #[must_use]
    pub fn badges(&self) -> Vec<String> {
        self.reasons.iter().map(ToString::to_string).collect()
    }
}

/// A single violated guardrail check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DecisionReason {
    Disabled,
    ActionNotAllowed {
        action: String,
    },
    ValueOutOfBounds {
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
    QuietHours {
        start: u8,
        end: u8,
    },
    RateLimited {
        count: usize,
        limit: u32,
    },
    ConfirmationRequired,
    /// Not a guardrail check: the pipeline was paused.
    Paused,
}

impl std::fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => f.write_str("disabled"),
            Self::ActionNotAllowed { action } => write!(f, "action '{action}' not allowed"),
            Self::ValueOutOfBounds { value, min, max } => {
                let min = min.map_or("-∞".to_string(), |v| v.to_string());
                let max = max.map_or("∞".to_string(), |v| v.to_string());
                write!(f, "value {value} outside [{min}, {max}]")
            }
            Self::QuietHours { start, end } => write!(f, "quiet hours {start:02}:00–{end:02}:00"),
            Self::RateLimited { count, limit } => write!(f, "rate limited ({count}/{limit} this hour)"),
            Self::ConfirmationRequired => f.write_str("confirmation required"),
            Self::Paused => f.write_str("paused"),
        }
    }
}
