//! Dashboard service — operation mode, chat history, and snapshot assembly.
//!
//! Boundary mutations return the full snapshot; consumers replace their local
//! copy wholesale instead of merging.

use std::sync::{Arc, Mutex};

use autohome_domain::chat::ChatMessage;
use autohome_domain::event::{Event, EventType};
use autohome_domain::mode::OperationMode;
use autohome_domain::snapshot::DashboardSnapshot;
use autohome_domain::time::Timestamp;
use serde_json::json;

use crate::ports::EventPublisher;
use crate::services::approval_service::ApprovalService;

pub struct DashboardService<P> {
    publisher: P,
    approvals: Arc<ApprovalService>,
    mode: Mutex<OperationMode>,
    chat: Mutex<Vec<ChatMessage>>,
}

impl<P: EventPublisher> DashboardService<P> {
    pub fn new(publisher: P, approvals: Arc<ApprovalService>) -> Self {
        Self {
            publisher,
            approvals,
            mode: Mutex::new(OperationMode::default()),
            chat: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn mode(&self) -> OperationMode {
        *self.mode.lock().unwrap()
    }

    /// Switch the operation mode. Affects subsequent intents only; items
    /// already queued stay queued.
    #[tracing::instrument(skip(self))]
    pub async fn set_mode(&self, mode: OperationMode) -> OperationMode {
        let previous = {
            let mut current = self.mode.lock().unwrap();
            std::mem::replace(&mut *current, mode)
        };
        if previous != mode {
            let event = Event::new(
                EventType::ModeChanged,
                None,
                json!({ "from": previous, "to": mode }),
            );
            if self.publisher.publish(event).await.is_err() {
                tracing::warn!("event bus publish failed");
            }
        }
        previous
    }

    pub fn push_message(&self, message: ChatMessage) {
        self.chat.lock().unwrap().push(message);
    }

    #[must_use]
    pub fn chat_history(&self) -> Vec<ChatMessage> {
        self.chat.lock().unwrap().clone()
    }

    /// Assemble the full dashboard state, sweeping expired queue items first.
    #[must_use]
    pub fn snapshot(&self, now: Timestamp) -> DashboardSnapshot {
        self.approvals.sweep(now);
        DashboardSnapshot {
            approval_queue: self.approvals.list(None),
            chat_history: self.chat_history(),
            operation_mode: self.mode(),
        }
    }

    /// Replace every local copy with an authoritative snapshot.
    pub fn replace(&self, snapshot: DashboardSnapshot) {
        self.approvals.replace_all(snapshot.approval_queue);
        *self.chat.lock().unwrap() = snapshot.chat_history;
        *self.mode.lock().unwrap() = snapshot.operation_mode;
    }
}
