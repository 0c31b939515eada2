//! Approval — a queued intent waiting for explicit human sign-off.
//!
//! Items are time-bounded. Status moves `Pending → Approved` or
//! `Pending → Rejected` exactly once; an item whose deadline passed while
//! still pending is terminal for all writes even though its stored status
//! stays `Pending`, so "expired" and "explicitly rejected" stay
//! distinguishable.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ApprovalError;
use crate::id::ApprovalId;
use crate::intent::Intent;
use crate::time::Timestamp;

/// Default time-to-live for a freshly created item.
pub const DEFAULT_TTL_SECONDS: i64 = 300;

/// Lifecycle state of an approval item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// The human's verdict on a pending item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

/// An intent parked until a human confirms or rejects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalItem {
    pub id: ApprovalId,
    pub summary: String,
    pub intent: Intent,
    /// Short badge strings naming the guardrail checks that escalated this.
    pub guardrail_badges: Vec<String>,
    #[serde(default)]
    pub cost_delta: Option<String>,
    #[serde(default)]
    pub comfort_delta: Option<String>,
    pub expires_at: Timestamp,
    pub status: ApprovalStatus,
}

impl ApprovalItem {
    /// Create a pending item expiring `ttl_seconds` from `now`.
    #[must_use]
    pub fn new(
        intent: Intent,
        summary: impl Into<String>,
        badges: Vec<String>,
        ttl_seconds: i64,
        now: Timestamp,
    ) -> Self {
        Self {
            id: ApprovalId::new(),
            summary: summary.into(),
            intent,
            guardrail_badges: badges,
            cost_delta: None,
            comfort_delta: None,
            expires_at: now + Duration::seconds(ttl_seconds),
            status: ApprovalStatus::Pending,
        }
    }

    /// Whether the deadline has passed.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }

    /// Apply a human decision.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::AlreadyResolved`] when the item is no longer
    /// pending, or [`ApprovalError::Expired`] when the deadline has passed —
    /// in that case the stored status is deliberately left `Pending`.
    pub fn resolve(
        &mut self,
        decision: ApprovalDecision,
        now: Timestamp,
    ) -> Result<(), ApprovalError> {
        if self.status != ApprovalStatus::Pending {
            return Err(ApprovalError::AlreadyResolved(self.id.to_string()));
        }
        if self.is_expired(now) {
            return Err(ApprovalError::Expired(self.id.to_string()));
        }
        self.status = match decision {
            ApprovalDecision::Approved => ApprovalStatus::Approved,
            ApprovalDecision::Rejected => ApprovalStatus::Rejected,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::EntityKey;
    use crate::time::now;

    fn pending_item(ttl_seconds: i64, created: Timestamp) -> ApprovalItem {
        let intent = Intent::ToggleDevice {
            device: EntityKey::parse("cover.garage").unwrap(),
            on: true,
        };
        ApprovalItem::new(intent, "Open the garage", vec![], ttl_seconds, created)
    }

    #[test]
    fn should_start_pending_with_deadline_from_ttl() {
        let created = now();
        let item = pending_item(300, created);
        assert_eq!(item.status, ApprovalStatus::Pending);
        assert_eq!(item.expires_at, created + Duration::seconds(300));
    }

    #[test]
    fn should_approve_before_deadline() {
        let created = now();
        let mut item = pending_item(300, created);
        item.resolve(ApprovalDecision::Approved, created + Duration::seconds(10))
            .unwrap();
        assert_eq!(item.status, ApprovalStatus::Approved);
    }

    #[test]
    fn should_fail_with_expired_and_keep_status_pending() {
        let created = now();
        let mut item = pending_item(300, created);
        let late = created + Duration::seconds(301);
        let result = item.resolve(ApprovalDecision::Approved, late);
        assert!(matches!(result, Err(ApprovalError::Expired(_))));
        assert_eq!(item.status, ApprovalStatus::Pending);
    }

    #[test]
    fn should_fail_with_already_resolved_on_second_resolution() {
        let created = now();
        let mut item = pending_item(300, created);
        item.resolve(ApprovalDecision::Rejected, created).unwrap();
        let result = item.resolve(ApprovalDecision::Approved, created);
        assert!(matches!(result, Err(ApprovalError::AlreadyResolved(_))));
        assert_eq!(item.status, ApprovalStatus::Rejected);
    }

    #[test]
    fn should_not_be_expired_exactly_at_the_deadline() {
        let created = now();
        let item = pending_item(300, created);
        assert!(!item.is_expired(item.expires_at));
        assert!(item.is_expired(item.expires_at + Duration::seconds(1)));
    }
}
