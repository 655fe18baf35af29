//! Immutable audit events.
//!
//! Every state-changing workflow step appends one event with before and
//! after snapshots. Events are append-only; nothing in the stack updates
//! or deletes one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{EventId, OrgId};

/// One audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: EventId,
    pub org_id: OrgId,
    /// Entity kind, e.g. "PermitCase", "Inspection".
    pub entity: String,
    /// Identifier of the affected entity, as a string.
    pub entity_id: String,
    /// User email, or "system" for worker-driven changes.
    pub actor: String,
    /// Action code, e.g. "PRECHECK_COMPLETED", "PERMIT_SUBMITTED".
    pub action: String,
    /// Snapshot before the change, when one existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,
    /// Snapshot after the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,
    /// Evidence reference (e.g. receipt screenshot URI).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Build an event for an entity change, snapshotting both sides.
    ///
    /// Serialization of the snapshots is infallible for the record types
    /// in this crate; a failure would indicate a non-serializable value
    /// and is reported as `null` rather than dropping the event.
    pub fn record<B: Serialize, A: Serialize>(
        org_id: OrgId,
        entity: &str,
        entity_id: impl ToString,
        actor: &str,
        action: &str,
        before: Option<&B>,
        after: Option<&A>,
    ) -> Self {
        Self {
            id: EventId::new(),
            org_id,
            entity: entity.to_string(),
            entity_id: entity_id.to_string(),
            actor: actor.to_string(),
            action: action.to_string(),
            before: before.map(|b| serde_json::to_value(b).unwrap_or(serde_json::Value::Null)),
            after: after.map(|a| serde_json::to_value(a).unwrap_or(serde_json::Value::Null)),
            evidence: None,
            created_at: Utc::now(),
        }
    }

    /// Attach an evidence reference.
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_snapshots_both_sides() {
        let org = OrgId::new();
        let event = AuditEvent::record(
            org,
            "PermitCase",
            "case-1",
            "pat@example.com",
            "PRECHECK_COMPLETED",
            Some(&serde_json::json!({"status": "draft"})),
            Some(&serde_json::json!({"status": "precheck_ready"})),
        );
        assert_eq!(event.entity, "PermitCase");
        assert_eq!(event.action, "PRECHECK_COMPLETED");
        assert_eq!(event.before.unwrap()["status"], "draft");
        assert_eq!(event.after.unwrap()["status"], "precheck_ready");
        assert!(event.evidence.is_none());
    }

    #[test]
    fn evidence_attaches() {
        let event = AuditEvent::record::<(), ()>(
            OrgId::new(),
            "PermitCase",
            "case-1",
            "system",
            "PERMIT_SUBMITTED",
            None,
            None,
        )
        .with_evidence("screenshots/submit-case-1.png");
        assert_eq!(
            event.evidence.as_deref(),
            Some("screenshots/submit-case-1.png")
        );
    }
}
