//! # autohome-domain
//!
//! Pure domain model for the autohome guarded command pipeline.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** (cached descriptions of controllable things)
//! - Define **Intents** (structured, immutable device-action requests)
//! - Define **Guardrails** (per-device policy plus the pure evaluator)
//! - Define **Approvals** (time-bounded items awaiting human sign-off)
//! - Define the **Operation mode** state machine and routing decision
//! - Define **Commands** (the wire-level unit sent to a device backend)
//! - Contain all invariant enforcement and decision logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod action_log;
pub mod approval;
pub mod chat;
pub mod command;
pub mod device;
pub mod event;
pub mod guardrail;
pub mod intent;
pub mod mode;
pub mod snapshot;
