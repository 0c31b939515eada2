//! Guardrail service — per-device policy store, action logs, and the
//! per-device locks that keep rate-limit accounting honest.
//!
//! Evaluation itself is pure (`GuardrailSetting::evaluate`); this service
//! owns the shared mutable state around it. Rate limiting is only accurate
//! when a successful dispatch lands in the log before the next evaluation
//! for the same device runs, so callers hold that device's lock across
//! evaluate → dispatch → record. Locks are scoped per device key; unrelated
//! devices never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use autohome_domain::action_log::ActionLog;
use autohome_domain::guardrail::{Decision, GuardrailSetting};
use autohome_domain::id::EntityKey;
use autohome_domain::intent::Intent;
use autohome_domain::time::Timestamp;

/// Store of per-device guardrail settings plus dispatch logs.
#[derive(Default)]
pub struct GuardrailService {
    settings: Mutex<HashMap<EntityKey, GuardrailSetting>>,
    logs: Mutex<HashMap<EntityKey, ActionLog>>,
    locks: Mutex<HashMap<EntityKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl GuardrailService {
    /// Create an empty store; devices without a setting are unrestricted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the setting for a device.
    #[tracing::instrument(skip(self, setting), fields(device = %key))]
    pub fn set(&self, key: EntityKey, setting: GuardrailSetting) {
        self.settings.lock().unwrap().insert(key, setting);
    }

    /// The setting for a device; the permissive default when none is stored.
    #[must_use]
    pub fn get(&self, key: &EntityKey) -> GuardrailSetting {
        self.settings.lock().unwrap().get(key).cloned().unwrap_or_default()
    }

    /// Remove a device's setting, returning whether one existed.
    pub fn remove(&self, key: &EntityKey) -> bool {
        self.settings.lock().unwrap().remove(key).is_some()
    }

    /// All stored settings, for the configuration boundary.
    #[must_use]
    pub fn list(&self) -> Vec<(EntityKey, GuardrailSetting)> {
        self.settings
            .lock()
            .unwrap()
            .iter()
            .map(|(key, setting)| (key.clone(), setting.clone()))
            .collect()
    }

    /// Evaluate an intent against its target device's policy.
    ///
    /// Callers serialize per-device: hold [`device_lock`](Self::device_lock)
    /// for the intent's device across this call and any following dispatch.
    #[must_use]
    pub fn evaluate(&self, intent: &Intent, key: &EntityKey, now: Timestamp) -> Decision {
        let setting = self.get(key);
        let logs = self.logs.lock().unwrap();
        let empty = ActionLog::new();
        let log = logs.get(key).unwrap_or(&empty);
        setting.evaluate(intent, log, now)
    }

    /// Record a successful dispatch for rate-limit counting.
    pub fn record_dispatch(&self, key: &EntityKey, now: Timestamp) {
        self.logs
            .lock()
            .unwrap()
            .entry(key.clone())
            .or_default()
            .record(now);
    }

    /// Dispatches for this device within the trailing hour.
    #[must_use]
    pub fn dispatch_count_last_hour(&self, key: &EntityKey, now: Timestamp) -> usize {
        self.logs
            .lock()
            .unwrap()
            .get(key)
            .map_or(0, |log| log.count_last_hour(now))
    }

    /// The serialization lock for one device key.
    ///
    /// Created on first use and shared thereafter; the returned `Arc` keeps
    /// the lock alive across the map.
    #[must_use]
    pub fn device_lock(&self, key: &EntityKey) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(
            self.locks
                .lock()
                .unwrap()
                .entry(key.clone())
                .or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autohome_domain::guardrail::DecisionReason;
    use autohome_domain::time::now;

    fn key(raw: &str) -> EntityKey {
        EntityKey::parse(raw).unwrap()
    }

    fn toggle(device: &str) -> Intent {
        Intent::ToggleDevice {
            device: key(device),
            on: true,
        }
    }

    #[test]
    fn should_default_to_unrestricted_for_unknown_device() {
        let service = GuardrailService::new();
        let decision = service.evaluate(&toggle("light.hall"), &key("light.hall"), now());
        assert!(decision.allow);
        assert!(!decision.requires_approval);
    }

    #[test]
    fn should_apply_stored_setting() {
        let service = GuardrailService::new();
        service.set(
            key("cover.garage"),
            GuardrailSetting::builder().require_confirmation(true).build().unwrap(),
        );
        let decision = service.evaluate(&toggle("cover.garage"), &key("cover.garage"), now());
        assert!(decision.requires_approval);
    }

    #[test]
    fn should_escalate_after_recorded_dispatches_reach_limit() {
        let service = GuardrailService::new();
        let device = key("fan.office_fan");
        service.set(
            device.clone(),
            GuardrailSetting::builder().max_actions_per_hour(3).build().unwrap(),
        );
        let ts = now();
        for _ in 0..3 {
            service.record_dispatch(&device, ts);
        }
        let decision = service.evaluate(&toggle("fan.office_fan"), &device, ts);
        assert!(decision.requires_approval);
        assert!(matches!(
            decision.reasons[0],
            DecisionReason::RateLimited { count: 3, limit: 3 }
        ));
    }

    #[test]
    fn should_track_logs_per_device() {
        let service = GuardrailService::new();
        let ts = now();
        service.record_dispatch(&key("light.a"), ts);
        service.record_dispatch(&key("light.a"), ts);
        service.record_dispatch(&key("light.b"), ts);
        assert_eq!(service.dispatch_count_last_hour(&key("light.a"), ts), 2);
        assert_eq!(service.dispatch_count_last_hour(&key("light.b"), ts), 1);
    }

    #[test]
    fn should_share_one_lock_per_device() {
        let service = GuardrailService::new();
        let a1 = service.device_lock(&key("light.a"));
        let a2 = service.device_lock(&key("light.a"));
        let b = service.device_lock(&key("light.b"));
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }

    #[test]
    fn should_remove_setting() {
        let service = GuardrailService::new();
        service.set(key("light.a"), GuardrailSetting::builder().enabled(false).build().unwrap());
        assert!(service.remove(&key("light.a")));
        assert!(!service.remove(&key("light.a")));
        assert!(service.evaluate(&toggle("light.a"), &key("light.a"), now()).allow);
    }
}
