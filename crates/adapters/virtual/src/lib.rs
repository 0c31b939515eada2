//! # autohome-adapter-virtual
//!
//! Virtual/demo device adapter that simulates a small home for testing and
//! demonstration.
//!
//! ## Provided devices
//!
//! | Device | Entity key | Behaviour |
//! |--------|-----------|-----------|
//! | Living room light | `light.living_room` | `turn_on` / `turn_off` / `toggle`, brightness 0–100 |
//! | Bedroom light | `light.bedroom` | same |
//! | Coffee machine | `switch.coffee_machine` | `turn_on` / `turn_off` / `toggle` |
//! | Office fan | `fan.office_fan` | `turn_on` / `turn_off` / `toggle` |
//! | Garage door | `cover.garage` | `turn_on` (open) / `turn_off` (close) |
//! | Hall thermostat | `climate.thermostat_hall` | `set_temperature` |
//!
//! ## Dependency rule
//!
//! Depends on `autohome-app` (port traits) and `autohome-domain` only.

mod mock;
mod scripted;

pub use mock::MockDeviceAdapter;
pub use scripted::ScriptedIntentSource;
