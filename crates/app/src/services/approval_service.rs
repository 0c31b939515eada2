//! Approval service — the time-bounded queue of intents awaiting human
//! confirmation.
//!
//! Expiry is checked lazily on every write touching an item; no background
//! sweep is needed for correctness. [`sweep`](ApprovalService::sweep) exists
//! purely for queue-size hygiene.

use std::sync::Mutex;

use autohome_domain::approval::{
    ApprovalDecision, ApprovalItem, ApprovalStatus, DEFAULT_TTL_SECONDS,
};
use autohome_domain::error::{AutoHomeError, NotFoundError};
use autohome_domain::id::ApprovalId;
use autohome_domain::intent::Intent;
use autohome_domain::time::Timestamp;

/// Manager of the pending-approval queue.
#[derive(Default)]
pub struct ApprovalService {
    items: Mutex<Vec<ApprovalItem>>,
}

impl ApprovalService {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Park an intent, returning the created item.
    ///
    /// `ttl_seconds` defaults to 300 when `None`.
    #[tracing::instrument(skip(self, intent, badges), fields(summary = %summary))]
    pub fn create(
        &self,
        intent: Intent,
        summary: &str,
        badges: Vec<String>,
        ttl_seconds: Option<i64>,
        now: Timestamp,
    ) -> ApprovalItem {
        let item = ApprovalItem::new(
            intent,
            summary,
            badges,
            ttl_seconds.unwrap_or(DEFAULT_TTL_SECONDS),
            now,
        );
        self.items.lock().unwrap().push(item.clone());
        item
    }

    /// List items, optionally filtered by stored status.
    #[must_use]
    pub fn list(&self, filter: Option<ApprovalStatus>) -> Vec<ApprovalItem> {
        let items = self.items.lock().unwrap();
        match filter {
            Some(status) => items.iter().filter(|i| i.status == status).cloned().collect(),
            None => items.clone(),
        }
    }

    /// Apply a human decision to a pending item.
    ///
    /// Returns the resolved item (carrying the original intent) so the
    /// caller can dispatch it on approval.
    ///
    /// # Errors
    ///
    /// - [`NotFoundError`] when no item has this id
    /// - [`AutoHomeError::Approval`] `Expired` when the deadline passed while
    ///   pending — the stored status is left `Pending`
    /// - [`AutoHomeError::Approval`] `AlreadyResolved` on repeat resolutions
    #[tracing::instrument(skip(self), fields(item = %id))]
    pub fn resolve(
        &self,
        id: ApprovalId,
        decision: ApprovalDecision,
        now: Timestamp,
    ) -> Result<ApprovalItem, AutoHomeError> {
        let mut items = self.items.lock().unwrap();
        let item = items.iter_mut().find(|i| i.id == id).ok_or(NotFoundError {
            entity: "ApprovalItem",
            id: id.to_string(),
        })?;
        item.resolve(decision, now)?;
        Ok(item.clone())
    }

    /// Drop expired pending items; returns how many were removed.
    pub fn sweep(&self, now: Timestamp) -> usize {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|i| !(i.status == ApprovalStatus::Pending && i.is_expired(now)));
        before - items.len()
    }

    /// Replace the whole queue with an authoritative snapshot copy.
    pub fn replace_all(&self, items: Vec<ApprovalItem>) {
        *self.items.lock().unwrap() = items;
    }
}
