//! # autohomed — autohome daemon
//!
//! Composition root that wires the guarded command pipeline to a device
//! backend and serves the HTTP API.
//!
//! ## Responsibilities
//! - Load configuration (`autohome.toml` + environment overrides)
//! - Pick the device backend (simulated home or a real Home Assistant)
//! - Construct the services and the pipeline, injecting the backend via the
//!   `DeviceAdapter` port
//! - Build the axum router, bind a TCP port, and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use autohome_adapter_hass::{HassAdapter, HassConfig};
use autohome_adapter_http_axum::router;
use autohome_adapter_http_axum::state::AppState;
use autohome_adapter_virtual::MockDeviceAdapter;
use autohome_app::event_bus::InProcessEventBus;
use autohome_app::pipeline::IntentPipeline;
use autohome_app::ports::DeviceAdapter;
use autohome_app::services::approval_service::ApprovalService;
use autohome_app::services::dashboard_service::DashboardService;
use autohome_app::services::dispatch_service::{CommandDispatcher, DispatcherConfig};
use autohome_app::services::guardrail_service::GuardrailService;
use autohome_domain::guardrail::GuardrailSetting;
use autohome_domain::id::EntityKey;

use crate::config::{BackendKind, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.filter))
        .init();

    match config.backend.kind {
        BackendKind::Mock => serve(MockDeviceAdapter::new(), &config).await,
        BackendKind::HomeAssistant => {
            let adapter = HassAdapter::new(HassConfig {
                base_url: config.backend.base_url.clone(),
                token: config.backend.token.clone(),
            })?;
            serve(adapter, &config).await
        }
    }
}

async fn serve<A>(adapter: A, config: &Config) -> anyhow::Result<()>
where
    A: DeviceAdapter + Send + Sync + 'static,
{
    // Event bus
    let publisher = Arc::new(InProcessEventBus::new(config.pipeline.event_capacity));

    // Services
    let guardrails = Arc::new(GuardrailService::new());
    let approvals = Arc::new(ApprovalService::new());
    let dashboard = Arc::new(DashboardService::new(
        Arc::clone(&publisher),
        Arc::clone(&approvals),
    ));
    let dispatcher = Arc::new(CommandDispatcher::new(
        adapter,
        Arc::clone(&publisher),
        Arc::clone(&guardrails),
        DispatcherConfig {
            quiet_period: config.quiet_period(),
            call_timeout: config.call_timeout(),
        },
    ));

    let devices = dispatcher.refresh().await?;
    tracing::info!(devices = devices.len(), "device cache primed");

    if config.backend.kind == BackendKind::Mock {
        seed_guardrails(&guardrails);
    }

    let pipeline = Arc::new(IntentPipeline::new(
        guardrails, approvals, dashboard, dispatcher, publisher,
    ));

    // HTTP
    let app = router::build(AppState::new(pipeline));
    let bind_addr = config.bind_addr();
    tracing::info!(%bind_addr, "autohomed listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Starting policies for the simulated home: a brightness ceiling on the
/// living room light, temperature-only commands on the thermostat, and a
/// confirmation gate on the garage door.
fn seed_guardrails(guardrails: &GuardrailService) {
    let seeds = [
        (
            "light.living_room",
            GuardrailSetting::builder().max_value(90.0).build(),
        ),
        (
            "climate.thermostat_hall",
            GuardrailSetting::builder()
                .allowed_actions(["set_temperature"])
                .build(),
        ),
        (
            "cover.garage",
            GuardrailSetting::builder().require_confirmation(true).build(),
        ),
    ];
    for (key, setting) in seeds {
        match setting {
            Ok(setting) => guardrails.set(
                EntityKey::parse(key).expect("seed keys are well-formed"),
                setting,
            ),
            Err(err) => tracing::warn!(device = key, error = %err, "skipping guardrail seed"),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("ctrl-c handler should install");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("sigterm handler should install")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutting down");
}
