//! JSON handler for submitting intents to the pipeline.

use axum::Json;
use axum::extract::State;

use autohome_app::pipeline::RouteOutcome;
use autohome_app::ports::{DeviceAdapter, EventPublisher};
use autohome_domain::intent::Intent;
use autohome_domain::time;

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/intents`
///
/// Runs the intent through validation, guardrails, and mode routing; the
/// body of the answer names where it ended up. Rejections surface as `403`
/// with the guardrail reasons.
pub async fn submit<A, P>(
    State(state): State<AppState<A, P>>,
    Json(intent): Json<Intent>,
) -> Result<Json<RouteOutcome>, ApiError>
where
    A: DeviceAdapter + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let outcome = state.pipeline.submit(intent, time::now()).await?;
    Ok(Json(outcome))
}
