//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod dashboard;
#[allow(clippy::missing_errors_doc)]
pub mod guardrails;
#[allow(clippy::missing_errors_doc)]
pub mod intents;

use axum::Router;
use axum::routing::{get, patch, post};

use autohome_app::ports::{DeviceAdapter, EventPublisher};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<A, P>() -> Router<AppState<A, P>>
where
    A: DeviceAdapter + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        // Dashboard
        .route("/dashboard", get(dashboard::snapshot::<A, P>))
        .route(
            "/dashboard/operation-mode",
            patch(dashboard::set_mode::<A, P>),
        )
        .route(
            "/dashboard/approvals",
            post(dashboard::create_approval::<A, P>),
        )
        .route(
            "/dashboard/approvals/{id}",
            patch(dashboard::resolve_approval::<A, P>),
        )
        // Guardrails
        .route("/guardrails", get(guardrails::list::<A, P>))
        .route(
            "/guardrails/{device}",
            get(guardrails::get::<A, P>)
                .put(guardrails::put::<A, P>)
                .delete(guardrails::delete::<A, P>),
        )
        // Intents
        .route("/intents", post(intents::submit::<A, P>))
}
