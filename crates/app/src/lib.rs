//! # autohome-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement (driven/outbound ports):
//!   - `DeviceAdapter` — execute and query device state
//!   - `IntentSource` — natural-language text → structured intent
//!   - `EventPublisher` — broadcast pipeline outcomes
//! - Provide the pipeline services:
//!   - `GuardrailService` — per-device policy store + action logs
//!   - `ApprovalService` — the time-bounded approval queue
//!   - `CommandDispatcher` — intent → commands, debounce, optimistic state
//!   - `DashboardService` — snapshot assembly and wholesale replacement
//!   - `IntentPipeline` — evaluate → route → dispatch/queue/reject
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `autohome-domain` only (plus `tokio::sync`/`tokio::time` for
//! channels and timers). Never imports adapter crates. Adapters depend on
//! *this* crate, not the reverse.

pub mod event_bus;
pub mod pipeline;
pub mod ports;
pub mod services;
