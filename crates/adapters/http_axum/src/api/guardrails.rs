//! JSON handlers for per-device guardrail settings.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use autohome_app::ports::{DeviceAdapter, EventPublisher};
use autohome_domain::error::NotFoundError;
use autohome_domain::guardrail::GuardrailSetting;
use autohome_domain::id::EntityKey;
use autohome_domain::intent::Intent;
use autohome_domain::time;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// One stored setting with the device it applies to.
#[derive(Serialize)]
pub struct GuardrailEntry {
    pub device: EntityKey,
    pub setting: GuardrailSetting,
}

/// `GET /api/guardrails`
pub async fn list<A, P>(State(state): State<AppState<A, P>>) -> Json<Vec<GuardrailEntry>>
where
    A: DeviceAdapter + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let entries = state
        .pipeline
        .guardrails()
        .list()
        .into_iter()
        .map(|(device, setting)| GuardrailEntry { device, setting })
        .collect();
    Json(entries)
}

/// `GET /api/guardrails/{device}`
///
/// Devices without a stored setting answer with the permissive default.
pub async fn get<A, P>(
    State(state): State<AppState<A, P>>,
    Path(device): Path<String>,
) -> Result<Json<GuardrailSetting>, ApiError>
where
    A: DeviceAdapter + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let key = EntityKey::parse(&device).map_err(autohome_domain::error::AutoHomeError::from)?;
    Ok(Json(state.pipeline.guardrails().get(&key)))
}

/// `PUT /api/guardrails/{device}`
pub async fn put<A, P>(
    State(state): State<AppState<A, P>>,
    Path(device): Path<String>,
    Json(setting): Json<GuardrailSetting>,
) -> Result<Json<GuardrailSetting>, ApiError>
where
    A: DeviceAdapter + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let key = EntityKey::parse(&device).map_err(autohome_domain::error::AutoHomeError::from)?;
    state
        .pipeline
        .submit(
            Intent::SetPolicy {
                device: key.clone(),
                setting: setting.clone(),
            },
            time::now(),
        )
        .await?;
    Ok(Json(setting))
}

/// `DELETE /api/guardrails/{device}`
pub async fn delete<A, P>(
    State(state): State<AppState<A, P>>,
    Path(device): Path<String>,
) -> Result<StatusCode, ApiError>
where
    A: DeviceAdapter + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let key = EntityKey::parse(&device).map_err(autohome_domain::error::AutoHomeError::from)?;
    if state.pipeline.guardrails().remove(&key) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::from(autohome_domain::error::AutoHomeError::from(
            NotFoundError {
                entity: "GuardrailSetting",
                id: device,
            },
        )))
    }
}
