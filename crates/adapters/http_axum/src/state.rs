//! Shared application state for axum handlers.

use std::sync::Arc;

use autohome_app::pipeline::IntentPipeline;
use autohome_app::ports::{DeviceAdapter, EventPublisher};

/// Application state shared across all axum handlers.
///
/// Generic over the device adapter and event publisher to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone` — only the `Arc` is cloned.
pub struct AppState<A, P> {
    /// The guarded command pipeline and the services hanging off it.
    pub pipeline: Arc<IntentPipeline<A, P>>,
}

impl<A, P> Clone for AppState<A, P> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

impl<A, P> AppState<A, P>
where
    A: DeviceAdapter + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create the state from a wired pipeline.
    pub fn new(pipeline: Arc<IntentPipeline<A, P>>) -> Self {
        Self { pipeline }
    }
}
