//! JSON handlers for the dashboard resource.
//!
//! Every mutation returns the full snapshot so the frontend can replace its
//! local copy wholesale.

use axum::Json;
use axum::extract::{Path, State};

use autohome_app::ports::{DeviceAdapter, EventPublisher};
use autohome_domain::approval::ApprovalDecision;
use autohome_domain::error::ValidationError;
use autohome_domain::id::ApprovalId;
use autohome_domain::intent::Intent;
use autohome_domain::mode::OperationMode;
use autohome_domain::snapshot::DashboardSnapshot;
use autohome_domain::time;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for switching the operation mode.
#[derive(Deserialize)]
pub struct SetModeRequest {
    pub mode: OperationMode,
}

/// Request body for queueing an intent directly.
#[derive(Deserialize)]
pub struct CreateApprovalRequest {
    pub intent: Intent,
    #[serde(default)]
    pub ttl_seconds: Option<i64>,
}

/// Request body for resolving a queued item.
#[derive(Deserialize)]
pub struct ResolveApprovalRequest {
    pub decision: ApprovalDecision,
}

/// `GET /api/dashboard`
pub async fn snapshot<A, P>(
    State(state): State<AppState<A, P>>,
) -> Json<DashboardSnapshot>
where
    A: DeviceAdapter + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Json(state.pipeline.dashboard().snapshot(time::now()))
}

/// `PATCH /api/dashboard/operation-mode`
pub async fn set_mode<A, P>(
    State(state): State<AppState<A, P>>,
    Json(req): Json<SetModeRequest>,
) -> Json<DashboardSnapshot>
where
    A: DeviceAdapter + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    state.pipeline.dashboard().set_mode(req.mode).await;
    Json(state.pipeline.dashboard().snapshot(time::now()))
}

/// `POST /api/dashboard/approvals`
pub async fn create_approval<A, P>(
    State(state): State<AppState<A, P>>,
    Json(req): Json<CreateApprovalRequest>,
) -> Result<Json<DashboardSnapshot>, ApiError>
where
    A: DeviceAdapter + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    // only executable intents can be parked; there is nothing to dispatch
    // later for the rest
    if req.intent.action().is_none() {
        return Err(ApiError::from(autohome_domain::error::AutoHomeError::from(
            ValidationError::UnsupportedIntent("not executable"),
        )));
    }
    let now = time::now();
    let summary = req.intent.summary();
    state
        .pipeline
        .approvals()
        .create(req.intent, &summary, Vec::new(), req.ttl_seconds, now);
    Ok(Json(state.pipeline.dashboard().snapshot(now)))
}

/// `PATCH /api/dashboard/approvals/{id}`
pub async fn resolve_approval<A, P>(
    State(state): State<AppState<A, P>>,
    Path(id): Path<ApprovalId>,
    Json(req): Json<ResolveApprovalRequest>,
) -> Result<Json<DashboardSnapshot>, ApiError>
where
    A: DeviceAdapter + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let now = time::now();
    state.pipeline.resolve_approval(id, req.decision, now).await?;
    Ok(Json(state.pipeline.dashboard().snapshot(now)))
}
