//! Command dispatcher — intent translation, optimistic device cache, and
//! per-`(device, field)` debounce in front of the device adapter port.
//!
//! Every incoming value updates the optimistic cache immediately; only the
//! last value standing when the quiet period elapses reaches the wire. A
//! failed adapter call rolls the cache back to the last confirmed state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use autohome_domain::command::Command;
use autohome_domain::device::{AttributeValue, Device, DeviceState};
use autohome_domain::error::{AutoHomeError, DispatchError, ValidationError};
use autohome_domain::event::{Event, EventType};
use autohome_domain::id::EntityKey;
use autohome_domain::intent::{Intent, LevelValue};
use autohome_domain::time;
use serde_json::json;

use crate::ports::{DeviceAdapter, EventPublisher};
use crate::services::guardrail_service::GuardrailService;

/// Quiet period between the last value change and the wire call.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(800);
/// Upper bound on a single adapter call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub quiet_period: Duration,
    pub call_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Translate an intent into the wire commands it implies.
///
/// # Errors
///
/// Fails with [`ValidationError::UnsupportedIntent`] for intents that do not
/// target a single device.
pub fn translate(intent: &Intent) -> Result<Vec<Command>, ValidationError> {
    match intent {
        Intent::ToggleDevice { device, on } => Ok(vec![Command::for_entity(
            device.clone(),
            if *on { "turn_on" } else { "turn_off" },
            None,
        )]),
        Intent::SetLevel {
            device,
            value: LevelValue::Percent(pct),
        } => Ok(vec![Command::for_entity(
            device.clone(),
            "turn_on",
            Some(json!({ "brightness": pct })),
        )]),
        Intent::SetLevel {
            device,
            value: LevelValue::Temperature(temperature),
        } => Ok(vec![Command::for_entity(
            device.clone(),
            "set_temperature",
            Some(json!({ "temperature": temperature })),
        )]),
        Intent::ScheduleDevice {
            device,
            temperature,
            ..
        } => Ok(vec![Command::for_entity(
            device.clone(),
            "set_temperature",
            Some(json!({ "temperature": temperature })),
        )]),
        Intent::RunOptimization { .. } => Err(ValidationError::UnsupportedIntent("run_optimization")),
        Intent::SetPolicy { .. } => Err(ValidationError::UnsupportedIntent("set_policy")),
        Intent::QueryStatus { .. } => Err(ValidationError::UnsupportedIntent("query_status")),
    }
}

/// The debounced field an intent writes, `None` for non-value intents.
#[must_use]
pub fn debounce_field(intent: &Intent) -> Option<&'static str> {
    match intent {
        Intent::SetLevel { value, .. } => Some(value.field()),
        Intent::ScheduleDevice { .. } => Some("temperature"),
        _ => None,
    }
}

#[derive(Debug, Clone)]
struct CacheSlot {
    /// What the ui should show right now, including unconfirmed writes.
    current: Device,
    /// Last state confirmed by the backend; rollback target.
    confirmed: Device,
}

/// Local cache of device state with an optimistic and a confirmed slot per
/// device.
#[derive(Debug, Default)]
pub struct DeviceCache {
    slots: Mutex<HashMap<EntityKey, CacheSlot>>,
}

impl DeviceCache {
    /// Replace the whole cache with an authoritative listing.
    pub fn replace_all(&self, devices: Vec<Device>) {
        let slots = devices
            .into_iter()
            .map(|device| {
                (
                    device.key.clone(),
                    CacheSlot {
                        current: device.clone(),
                        confirmed: device,
                    },
                )
            })
            .collect();
        *self.slots.lock().unwrap() = slots;
    }

    /// The optimistic view of one device.
    #[must_use]
    pub fn get(&self, key: &EntityKey) -> Option<Device> {
        self.slots
            .lock()
            .unwrap()
            .get(key)
            .map(|slot| slot.current.clone())
    }

    /// Optimistic views of every cached device, ordered by key.
    #[must_use]
    pub fn list(&self) -> Vec<Device> {
        let slots = self.slots.lock().unwrap();
        let mut devices: Vec<Device> = slots.values().map(|slot| slot.current.clone()).collect();
        devices.sort_by(|a, b| a.key.as_str().cmp(b.key.as_str()));
        devices
    }

    /// Write an intent's effect into the optimistic slot.
    pub fn apply(&self, intent: &Intent) {
        let Some(key) = intent.device() else { return };
        let mut slots = self.slots.lock().unwrap();
        let Some(slot) = slots.get_mut(key) else { return };
        match intent {
            Intent::ToggleDevice { on, .. } => {
                slot.current.state = DeviceState::Bool(*on);
            }
            Intent::SetLevel {
                value: LevelValue::Percent(pct),
                ..
            } => {
                slot.current.state = DeviceState::Bool(true);
                slot.current
                    .attributes
                    .insert("brightness".to_string(), AttributeValue::Int(i64::from(*pct)));
            }
            Intent::SetLevel {
                value: LevelValue::Temperature(temperature),
                ..
            } => {
                slot.current
                    .attributes
                    .insert("temperature".to_string(), AttributeValue::Float(*temperature));
            }
            Intent::ScheduleDevice { temperature, .. } => {
                slot.current
                    .attributes
                    .insert("temperature".to_string(), AttributeValue::Float(*temperature));
            }
            Intent::RunOptimization { .. }
            | Intent::SetPolicy { .. }
            | Intent::QueryStatus { .. } => {}
        }
    }

    /// Mark the device's state confirmed, preferring a fresh backend read.
    pub fn confirm(&self, key: &EntityKey, fresh: Option<Device>) {
        let mut slots = self.slots.lock().unwrap();
        let Some(slot) = slots.get_mut(key) else { return };
        match fresh {
            Some(device) => {
                slot.current = device.clone();
                slot.confirmed = device;
            }
            None => slot.confirmed = slot.current.clone(),
        }
    }

    /// Undo unconfirmed writes, restoring the last confirmed state.
    pub fn rollback(&self, key: &EntityKey) {
        let mut slots = self.slots.lock().unwrap();
        if let Some(slot) = slots.get_mut(key) {
            slot.current = slot.confirmed.clone();
        }
    }
}

/// Sends commands to the device backend and keeps the local cache honest.
pub struct CommandDispatcher<A, P> {
    adapter: A,
    publisher: P,
    guardrails: Arc<GuardrailService>,
    cache: DeviceCache,
    generations: Mutex<HashMap<(EntityKey, &'static str), u64>>,
    config: DispatcherConfig,
}

impl<A, P> CommandDispatcher<A, P>
where
    A: DeviceAdapter + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    pub fn new(
        adapter: A,
        publisher: P,
        guardrails: Arc<GuardrailService>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            adapter,
            publisher,
            guardrails,
            cache: DeviceCache::default(),
            generations: Mutex::new(HashMap::new()),
            config,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &DeviceCache {
        &self.cache
    }

    /// Reload the cache from the backend's authoritative listing.
    ///
    /// # Errors
    ///
    /// Fails when the backend listing call fails.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Vec<Device>, DispatchError> {
        let devices = self.adapter.list_entities().await?;
        self.cache.replace_all(devices.clone());
        Ok(devices)
    }

    /// Translate and send an intent's commands immediately.
    ///
    /// Applies the optimistic update first, rolls back on any failure, and
    /// appends to the device's action log only after every command landed.
    /// The caller is expected to hold the device's pipeline lock.
    ///
    /// # Errors
    ///
    /// Fails when translation fails or the backend rejects or times out.
    #[tracing::instrument(skip_all, fields(intent = %intent.summary()))]
    pub async fn dispatch_now(&self, intent: &Intent) -> Result<Vec<Command>, AutoHomeError> {
        let commands = translate(intent)?;
        let device = intent
            .device()
            .cloned()
            .ok_or(ValidationError::UnsupportedIntent("device-less intent"))?;
        self.cache.apply(intent);
        for command in &commands {
            if let Err(error) = self.call(command).await {
                self.cache.rollback(&device);
                self.emit(Event::new(
                    EventType::DispatchFailed,
                    Some(device.clone()),
                    json!({ "service": command.service, "error": error.to_string() }),
                ))
                .await;
                return Err(error.into());
            }
        }
        self.guardrails.record_dispatch(&device, time::now());
        let fresh = self.adapter.get_state(&device).await.unwrap_or(None);
        self.cache.confirm(&device, fresh);
        for command in &commands {
            self.emit(Event::new(
                EventType::CommandDispatched,
                Some(device.clone()),
                json!({ "service": command.service, "data": command.data }),
            ))
            .await;
        }
        Ok(commands)
    }

    /// Apply a value-bearing intent optimistically and (re)start its debounce
    /// timer.
    ///
    /// Timers are generation-counted per `(device, field)`: a newer value
    /// bumps the generation, and a sleeping task whose generation went stale
    /// drops without touching the wire. Failures on this path surface as
    /// `DispatchFailed` events, not return values.
    ///
    /// # Errors
    ///
    /// Fails when the intent carries no debounceable value.
    pub fn dispatch_debounced(self: &Arc<Self>, intent: Intent) -> Result<(), ValidationError> {
        let field = debounce_field(&intent)
            .ok_or(ValidationError::UnsupportedIntent("not a value intent"))?;
        let device = intent
            .device()
            .cloned()
            .ok_or(ValidationError::UnsupportedIntent("device-less intent"))?;
        self.cache.apply(&intent);
        let generation = {
            let mut generations = self.generations.lock().unwrap();
            let entry = generations.entry((device.clone(), field)).or_insert(0);
            *entry += 1;
            *entry
        };
        let dispatcher = Arc::clone(self);
        let quiet = self.config.quiet_period;
        tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            if dispatcher.generation(&device, field) != generation {
                return;
            }
            let lock = dispatcher.guardrails.device_lock(&device);
            let _guard = lock.lock().await;
            // superseded while waiting for the device slot
            if dispatcher.generation(&device, field) != generation {
                return;
            }
            if let Err(error) = dispatcher.dispatch_now(&intent).await {
                tracing::warn!(device = %device, %error, "debounced dispatch failed");
            }
        });
        Ok(())
    }

    fn generation(&self, device: &EntityKey, field: &'static str) -> u64 {
        self.generations
            .lock()
            .unwrap()
            .get(&(device.clone(), field))
            .copied()
            .unwrap_or(0)
    }

    async fn call(&self, command: &Command) -> Result<(), DispatchError> {
        let timeout = self.config.call_timeout;
        tokio::time::timeout(
            timeout,
            self.adapter
                .call_service(command.domain(), command.action(), wire_payload(command)),
        )
        .await
        .map_err(|_| DispatchError::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)))?
    }

    async fn emit(&self, event: Event) {
        if self.publisher.publish(event).await.is_err() {
            tracing::warn!("event bus publish failed");
        }
    }
}

/// Merge the entity id into the command's payload object.
fn wire_payload(command: &Command) -> serde_json::Value {
    // translate only ever produces object payloads
    let mut payload = match &command.data {
        Some(serde_json::Value::Object(map)) => map.clone(),
        _ => serde_json::Map::new(),
    };
    payload.insert(
        "entity_id".to_string(),
        json!(command.entity_id.as_str()),
    );
    serde_json::Value::Object(payload)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use autohome_domain::device::DeviceKind;

    use super::*;

    struct FakeAdapter {
        devices: Mutex<HashMap<EntityKey, Device>>,
        calls: Mutex<Vec<(String, String, serde_json::Value)>>,
        fail_next: AtomicBool,
        delay: Option<Duration>,
    }

    impl FakeAdapter {
        fn with_devices(devices: Vec<Device>) -> Self {
            Self {
                devices: Mutex::new(
                    devices.into_iter().map(|d| (d.key.clone(), d)).collect(),
                ),
                calls: Mutex::new(Vec::new()),
                fail_next: AtomicBool::new(false),
                delay: None,
            }
        }

        fn calls(&self) -> Vec<(String, String, serde_json::Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl DeviceAdapter for FakeAdapter {
        async fn list_entities(&self) -> Result<Vec<Device>, DispatchError> {
            Ok(self.devices.lock().unwrap().values().cloned().collect())
        }

        async fn get_state(&self, key: &EntityKey) -> Result<Option<Device>, DispatchError> {
            Ok(self.devices.lock().unwrap().get(key).cloned())
        }

        async fn call_service(
            &self,
            domain: &str,
            service: &str,
            payload: serde_json::Value,
        ) -> Result<(), DispatchError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(DispatchError::Backend("injected failure".to_string()));
            }
            self.calls
                .lock()
                .unwrap()
                .push((domain.to_string(), service.to_string(), payload));
            Ok(())
        }
    }

    #[derive(Default)]
    struct SpyPublisher {
        events: Mutex<Vec<Event>>,
    }

    impl EventPublisher for SpyPublisher {
        async fn publish(&self, event: Event) -> Result<(), AutoHomeError> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn living_room() -> EntityKey {
        EntityKey::parse("light.living_room").unwrap()
    }

    fn living_room_light() -> Device {
        Device::builder()
            .key(living_room())
            .kind(DeviceKind::Light)
            .state(DeviceState::Bool(false))
            .attribute("brightness", AttributeValue::Int(0))
            .available(true)
            .build()
            .unwrap()
    }

    fn dispatcher(
        adapter: Arc<FakeAdapter>,
        publisher: Arc<SpyPublisher>,
    ) -> Arc<CommandDispatcher<Arc<FakeAdapter>, Arc<SpyPublisher>>> {
        Arc::new(CommandDispatcher::new(
            adapter,
            publisher,
            Arc::new(GuardrailService::new()),
            DispatcherConfig::default(),
        ))
    }

    fn set_brightness(pct: u8) -> Intent {
        Intent::SetLevel {
            device: living_room(),
            value: LevelValue::Percent(pct),
        }
    }

    #[test]
    fn should_translate_toggle_to_domain_service() {
        let on = translate(&Intent::ToggleDevice {
            device: living_room(),
            on: true,
        })
        .unwrap();
        assert_eq!(on[0].service, "light.turn_on");
        assert_eq!(on[0].data, None);

        let off = translate(&Intent::ToggleDevice {
            device: living_room(),
            on: false,
        })
        .unwrap();
        assert_eq!(off[0].service, "light.turn_off");
    }

    #[test]
    fn should_translate_percent_level_to_turn_on_with_brightness() {
        let commands = translate(&set_brightness(40)).unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].service, "light.turn_on");
        assert_eq!(commands[0].data, Some(json!({ "brightness": 40 })));
    }

    #[test]
    fn should_translate_temperature_to_set_temperature() {
        let key = EntityKey::parse("climate.thermostat_hall").unwrap();
        let commands = translate(&Intent::SetLevel {
            device: key,
            value: LevelValue::Temperature(68.5),
        })
        .unwrap();
        assert_eq!(commands[0].service, "climate.set_temperature");
        assert_eq!(commands[0].data, Some(json!({ "temperature": 68.5 })));
    }

    #[test]
    fn should_refuse_to_translate_device_less_intents() {
        let result = translate(&Intent::RunOptimization {
            cheapest: true,
            avoid_peak: false,
        });
        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedIntent(_))
        ));
    }

    #[tokio::test]
    async fn should_dispatch_record_and_publish() {
        let adapter = Arc::new(FakeAdapter::with_devices(vec![living_room_light()]));
        let publisher = Arc::new(SpyPublisher::default());
        let dispatcher = dispatcher(Arc::clone(&adapter), Arc::clone(&publisher));
        dispatcher.refresh().await.unwrap();

        let commands = dispatcher
            .dispatch_now(&Intent::ToggleDevice {
                device: living_room(),
                on: true,
            })
            .await
            .unwrap();

        assert_eq!(commands.len(), 1);
        let calls = adapter.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "light");
        assert_eq!(calls[0].1, "turn_on");
        assert_eq!(calls[0].2, json!({ "entity_id": "light.living_room" }));
        assert_eq!(
            dispatcher
                .guardrails
                .dispatch_count_last_hour(&living_room(), time::now()),
            1
        );
        let events = publisher.events.lock().unwrap();
        assert!(events
            .iter()
            .any(|e| e.event_type == EventType::CommandDispatched));
    }

    #[tokio::test]
    async fn should_rollback_optimistic_state_on_failure() {
        let adapter = Arc::new(FakeAdapter::with_devices(vec![living_room_light()]));
        let publisher = Arc::new(SpyPublisher::default());
        let dispatcher = dispatcher(Arc::clone(&adapter), Arc::clone(&publisher));
        dispatcher.refresh().await.unwrap();
        adapter.fail_next.store(true, Ordering::SeqCst);

        let result = dispatcher
            .dispatch_now(&Intent::ToggleDevice {
                device: living_room(),
                on: true,
            })
            .await;

        assert!(matches!(result, Err(AutoHomeError::Dispatch(_))));
        let cached = dispatcher.cache().get(&living_room()).unwrap();
        assert_eq!(cached.state, DeviceState::Bool(false));
        assert_eq!(
            dispatcher
                .guardrails
                .dispatch_count_last_hour(&living_room(), time::now()),
            0
        );
        let events = publisher.events.lock().unwrap();
        assert!(events
            .iter()
            .any(|e| e.event_type == EventType::DispatchFailed));
    }

    #[tokio::test(start_paused = true)]
    async fn should_time_out_a_stalled_adapter_call() {
        let mut adapter = FakeAdapter::with_devices(vec![living_room_light()]);
        adapter.delay = Some(Duration::from_secs(60));
        let publisher = Arc::new(SpyPublisher::default());
        let dispatcher = dispatcher(Arc::new(adapter), publisher);
        dispatcher.refresh().await.unwrap();

        let result = dispatcher
            .dispatch_now(&Intent::ToggleDevice {
                device: living_room(),
                on: true,
            })
            .await;

        assert!(matches!(
            result,
            Err(AutoHomeError::Dispatch(DispatchError::Timeout(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn should_coalesce_rapid_level_changes_into_one_call() {
        let adapter = Arc::new(FakeAdapter::with_devices(vec![living_room_light()]));
        let publisher = Arc::new(SpyPublisher::default());
        let dispatcher = dispatcher(Arc::clone(&adapter), publisher);
        dispatcher.refresh().await.unwrap();

        for pct in [70, 71, 72] {
            dispatcher.dispatch_debounced(set_brightness(pct)).unwrap();
        }
        // every write is visible optimistically before anything hits the wire
        let cached = dispatcher.cache().get(&living_room()).unwrap();
        assert_eq!(
            cached.attributes.get("brightness"),
            Some(&AttributeValue::Int(72))
        );
        assert!(adapter.calls().is_empty());

        tokio::time::sleep(Duration::from_millis(900)).await;

        let calls = adapter.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].2["brightness"], json!(72));
    }

    #[tokio::test(start_paused = true)]
    async fn should_restart_the_timer_when_a_newer_value_arrives() {
        let adapter = Arc::new(FakeAdapter::with_devices(vec![living_room_light()]));
        let publisher = Arc::new(SpyPublisher::default());
        let dispatcher = dispatcher(Arc::clone(&adapter), publisher);
        dispatcher.refresh().await.unwrap();

        dispatcher.dispatch_debounced(set_brightness(70)).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        dispatcher.dispatch_debounced(set_brightness(80)).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        // one second after the first write, but only half a quiet period
        // after the second: nothing on the wire yet
        assert!(adapter.calls().is_empty());

        tokio::time::sleep(Duration::from_millis(400)).await;
        let calls = adapter.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].2["brightness"], json!(80));
    }

    #[tokio::test(start_paused = true)]
    async fn should_debounce_fields_independently() {
        let thermostat = Device::builder()
            .key(EntityKey::parse("climate.thermostat_hall").unwrap())
            .kind(DeviceKind::Climate)
            .state(DeviceState::Number(68.0))
            .available(true)
            .build()
            .unwrap();
        let adapter = Arc::new(FakeAdapter::with_devices(vec![
            living_room_light(),
            thermostat,
        ]));
        let publisher = Arc::new(SpyPublisher::default());
        let dispatcher = dispatcher(Arc::clone(&adapter), publisher);
        dispatcher.refresh().await.unwrap();

        dispatcher.dispatch_debounced(set_brightness(50)).unwrap();
        dispatcher
            .dispatch_debounced(Intent::SetLevel {
                device: EntityKey::parse("climate.thermostat_hall").unwrap(),
                value: LevelValue::Temperature(70.0),
            })
            .unwrap();

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(adapter.calls().len(), 2);
    }
}
