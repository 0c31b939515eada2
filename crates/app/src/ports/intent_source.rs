//! Intent source port — the external NLU collaborator.
//!
//! Parsing heuristics (keyword matching, LLM prompting) live entirely in the
//! implementation; the core only consumes the structured result.

use std::future::Future;

use autohome_domain::error::AutoHomeError;
use autohome_domain::intent::Intent;

/// Turns chat text into structured intents and renders replies.
pub trait IntentSource: Send + Sync {
    /// Parse free-form text into an [`Intent`].
    fn parse(&self, text: &str) -> impl Future<Output = Result<Intent, AutoHomeError>> + Send;

    /// Produce a conversational acknowledgement for an intent.
    fn generate_response(&self, intent: &Intent) -> impl Future<Output = String> + Send;
}
