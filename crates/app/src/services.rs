//! Application services — one module per pipeline concern.

pub mod approval_service;
pub mod dashboard_service;
pub mod dispatch_service;
pub mod guardrail_service;
