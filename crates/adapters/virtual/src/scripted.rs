//! Scripted intent source for demos and tests.
//!
//! Real natural-language parsing lives behind the
//! [`IntentSource`](autohome_app::ports::IntentSource) port and is provided
//! by an external service; this implementation replays a prepared sequence
//! of intents so the rest of the pipeline can be exercised without one.

use std::collections::VecDeque;
use std::sync::Mutex;

use autohome_app::ports::IntentSource;
use autohome_domain::error::{AutoHomeError, ValidationError};
use autohome_domain::intent::Intent;

/// Replays a fixed queue of intents, one per `parse` call.
#[derive(Default)]
pub struct ScriptedIntentSource {
    script: Mutex<VecDeque<Intent>>,
}

impl ScriptedIntentSource {
    /// Queue up the intents to replay, in order.
    #[must_use]
    pub fn new(intents: impl IntoIterator<Item = Intent>) -> Self {
        Self {
            script: Mutex::new(intents.into_iter().collect()),
        }
    }

    /// Append one more intent to the script.
    pub fn push(&self, intent: Intent) {
        self.script.lock().unwrap().push_back(intent);
    }
}

impl IntentSource for ScriptedIntentSource {
    async fn parse(&self, _text: &str) -> Result<Intent, AutoHomeError> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ValidationError::UnsupportedIntent("script exhausted").into())
    }

    async fn generate_response(&self, intent: &Intent) -> String {
        format!("Okay, {}.", intent.summary())
    }
}
