//! Device adapter port — the abstracted device backend.
//!
//! Two implementations exist as adapter crates: an in-memory mock that
//! mutates a local map and a real adapter that forwards to the Home
//! Assistant REST API. The core depends only on this trait and must not
//! assume either implementation's internals — in particular it must not
//! assume calls complete synchronously.

use std::future::Future;

use autohome_domain::device::Device;
use autohome_domain::error::DispatchError;
use autohome_domain::id::EntityKey;

/// Executes and queries device state on behalf of the pipeline.
pub trait DeviceAdapter: Send + Sync {
    /// List every device the backend knows about.
    fn list_entities(&self) -> impl Future<Output = Result<Vec<Device>, DispatchError>> + Send;

    /// Fetch the current state of one device, `None` when unknown.
    fn get_state(
        &self,
        key: &EntityKey,
    ) -> impl Future<Output = Result<Option<Device>, DispatchError>> + Send;

    /// Invoke a service (`domain` + `service` + JSON payload including
    /// `entity_id`).
    fn call_service(
        &self,
        domain: &str,
        service: &str,
        payload: serde_json::Value,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

impl<T: DeviceAdapter> DeviceAdapter for std::sync::Arc<T> {
    fn list_entities(&self) -> impl Future<Output = Result<Vec<Device>, DispatchError>> + Send {
        (**self).list_entities()
    }

    fn get_state(
        &self,
        key: &EntityKey,
    ) -> impl Future<Output = Result<Option<Device>, DispatchError>> + Send {
        (**self).get_state(key)
    }

    fn call_service(
        &self,
        domain: &str,
        service: &str,
        payload: serde_json::Value,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send {
        (**self).call_service(domain, service, payload)
    }
}
