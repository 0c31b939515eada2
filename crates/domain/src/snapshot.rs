//! Dashboard snapshot — the authoritative state bundle exchanged at the
//! boundary.
//!
//! Every mutating dashboard operation returns one of these; consumers must
//! replace their local copies wholesale instead of merging field-by-field,
//! so client and server state cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::approval::ApprovalItem;
use crate::chat::ChatMessage;
use crate::mode::OperationMode;

/// Full dashboard state as exposed at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub approval_queue: Vec<ApprovalItem>,
    pub chat_history: Vec<ChatMessage>,
    pub operation_mode: OperationMode,
}
