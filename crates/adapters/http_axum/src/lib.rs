//! # autohome-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the JSON API the dashboard frontend talks to
//!   (`/api/dashboard`, `/api/guardrails`, `/api/intents`, …)
//! - Map HTTP requests into pipeline and service calls (driving adapter)
//! - Map typed errors into HTTP status codes (guardrail block → 403,
//!   expired or already-resolved approval → 409, backend failure → 502)
//!
//! ## Dependency rule
//! Depends on `autohome-app` (pipeline and services) and `autohome-domain`
//! (types used in request/response mapping). Never leaks axum types into the
//! domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
