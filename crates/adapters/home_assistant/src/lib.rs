//! # autohome-adapter-hass
//!
//! Device adapter backed by a real [Home Assistant](https://www.home-assistant.io)
//! instance over its REST API.
//!
//! ## Wire format
//! - `POST {base}/api/services/{domain}/{service}` with a bearer token and a
//!   JSON payload carrying `entity_id` plus service data
//! - `GET {base}/api/states` / `GET {base}/api/states/{entity_id}` for state
//!
//! ## Dependency rule
//!
//! Depends on `autohome-app` (port traits) and `autohome-domain` only;
//! reqwest types never leak out of this crate.

mod mapping;

pub use mapping::{StatePayload, device_from_state};

use autohome_app::ports::DeviceAdapter;
use autohome_domain::device::Device;
use autohome_domain::error::DispatchError;
use autohome_domain::id::EntityKey;
use reqwest::StatusCode;

/// Connection settings for one Home Assistant instance.
#[derive(Debug, Clone)]
pub struct HassConfig {
    /// Base URL without a trailing slash, e.g. `http://homeassistant.local:8123`.
    pub base_url: String,
    /// Long-lived access token.
    pub token: String,
}

/// Home Assistant REST adapter.
pub struct HassAdapter {
    client: reqwest::Client,
    config: HassConfig,
}

impl HassAdapter {
    /// Build an adapter for the given instance.
    ///
    /// # Errors
    ///
    /// Fails when the underlying HTTP client cannot be constructed.
    pub fn new(config: HassConfig) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| DispatchError::Backend(err.to_string()))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }
}

impl DeviceAdapter for HassAdapter {
    #[tracing::instrument(skip(self))]
    async fn list_entities(&self) -> Result<Vec<Device>, DispatchError> {
        let states: Vec<StatePayload> = self
            .client
            .get(self.url("/api/states"))
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|err| DispatchError::Backend(err.to_string()))?
            .error_for_status()
            .map_err(|err| DispatchError::Backend(err.to_string()))?
            .json()
            .await
            .map_err(|err| DispatchError::Backend(err.to_string()))?;

        // entities in domains the pipeline has no notion of are skipped
        Ok(states.iter().filter_map(device_from_state).collect())
    }

    #[tracing::instrument(skip(self), fields(entity = %key))]
    async fn get_state(&self, key: &EntityKey) -> Result<Option<Device>, DispatchError> {
        let response = self
            .client
            .get(self.url(&format!("/api/states/{key}")))
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|err| DispatchError::Backend(err.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let state: StatePayload = response
            .error_for_status()
            .map_err(|err| DispatchError::Backend(err.to_string()))?
            .json()
            .await
            .map_err(|err| DispatchError::Backend(err.to_string()))?;
        Ok(device_from_state(&state))
    }

    #[tracing::instrument(skip(self, payload))]
    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        payload: serde_json::Value,
    ) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(self.url(&format!("/api/services/{domain}/{service}")))
            .bearer_auth(&self.config.token)
            .json(&payload)
            .send()
            .await
            .map_err(|err| DispatchError::Backend(err.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(DispatchError::UnsupportedService {
                entity_id: payload
                    .get("entity_id")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                service: format!("{domain}.{service}"),
            }),
            status => Err(DispatchError::Backend(format!(
                "service call answered {status}"
            ))),
        }
    }
}
