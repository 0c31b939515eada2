//! Chat message — one turn of the conversation shown on the dashboard.

use serde::{Deserialize, Serialize};

use crate::id::MessageId;
use crate::intent::Intent;
use crate::time::Timestamp;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single chat turn; user messages carry the intent the NLU derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub intent: Option<Intent>,
}

impl ChatMessage {
    /// A user turn with its parsed intent.
    #[must_use]
    pub fn user(content: impl Into<String>, intent: Intent, now: Timestamp) -> Self {
        Self {
            id: MessageId::new(),
            role: MessageRole::User,
            content: content.into(),
            timestamp: now,
            intent: Some(intent),
        }
    }

    /// An assistant reply.
    #[must_use]
    pub fn assistant(content: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id: MessageId::new(),
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: now,
            intent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::EntityKey;
    use crate::time::now;

    #[test]
    fn should_attach_intent_to_user_messages_only() {
        let intent = Intent::ToggleDevice {
            device: EntityKey::parse("light.bedroom").unwrap(),
            on: false,
        };
        let ts = now();
        let user = ChatMessage::user("turn off the bedroom light", intent, ts);
        let assistant = ChatMessage::assistant("Done.", ts);
        assert_eq!(user.role, MessageRole::User);
        assert!(user.intent.is_some());
        assert!(assistant.intent.is_none());
    }
}
