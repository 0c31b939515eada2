//! Operation mode — the global switch deciding how allowed intents proceed.
//!
//! A plain three-state machine with no intermediate states; transitions fire
//! only on an explicit user command, never on internal events. A mode change
//! affects intents evaluated afterwards; dispatches already past the router
//! keep going.

use serde::{Deserialize, Serialize};

use crate::guardrail::Decision;

/// Global pipeline mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    /// Allowed intents dispatch immediately; escalations queue.
    #[default]
    Auto,
    /// Every intent queues for human confirmation.
    Manual,
    /// Every intent is rejected outright, regardless of guardrail output.
    Paused,
}

/// Where the router sends an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePath {
    /// Hand to the dispatcher now.
    Dispatch,
    /// Park in the approval queue.
    Queue,
    /// Reject; the guardrail reasons explain why.
    Reject,
}

impl OperationMode {
    /// Combine this mode with a guardrail decision to pick a path.
    #[must_use]
    pub fn route(self, decision: &Decision) -> RoutePath {
        match self {
            Self::Paused => RoutePath::Reject,
            Self::Manual => RoutePath::Queue,
            Self::Auto => {
                if !decision.allow {
                    RoutePath::Reject
                } else if decision.requires_approval {
                    RoutePath::Queue
                } else {
                    RoutePath::Dispatch
                }
            }
        }
    }
}

impl std::fmt::Display for OperationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Manual => f.write_str("manual"),
            Self::Paused => f.write_str("paused"),
        }
    }
}
