//! # Notification Collaborator Boundary
//!
//! The engine does not deliver notifications; it hands them to an external
//! collaborator after the workflow transaction has committed. Delivery is
//! best effort. A failed dispatch is logged and swallowed so it can never
//! roll back an already-committed transition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use aula_core::{EntityRef, StudentId, TeacherId, UserId};

// ─── Recipients ─────────────────────────────────────────────────────

/// The addressee of a notification.
///
/// The engine knows actors by their typed workflow identifiers; resolving
/// them to a delivery channel is the collaborator's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Recipient {
    /// A student actor.
    Student(StudentId),
    /// A teacher actor.
    Teacher(TeacherId),
    /// A platform user outside the two actor types (e.g. an approver).
    User(UserId),
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student(id) => write!(f, "{id}"),
            Self::Teacher(id) => write!(f, "{id}"),
            Self::User(id) => write!(f, "{id}"),
        }
    }
}

// ─── Notification Payload ───────────────────────────────────────────

/// The category of a workflow notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A topic application was submitted.
    ApplicationSubmitted,
    /// A topic application was decided or withdrawn.
    ApplicationDecision,
    /// A thesis proposal was submitted.
    ProposalSubmitted,
    /// A thesis proposal was decided or withdrawn.
    ProposalDecision,
    /// A thesis registration was created.
    RegistrationSubmitted,
    /// A thesis registration was decided or cancelled.
    RegistrationDecision,
    /// A pre-thesis was graded.
    PreThesisGraded,
    /// A committee assignment was added, refreshed, or removed.
    AssignmentChanged,
    /// A defense session was scheduled or rescheduled.
    DefenseScheduled,
    /// A defense session was completed.
    DefenseCompleted,
    /// The final grade was recorded and the thesis completed.
    ThesisCompleted,
    /// The thesis was cancelled.
    ThesisCancelled,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ApplicationSubmitted => "application_submitted",
            Self::ApplicationDecision => "application_decision",
            Self::ProposalSubmitted => "proposal_submitted",
            Self::ProposalDecision => "proposal_decision",
            Self::RegistrationSubmitted => "registration_submitted",
            Self::RegistrationDecision => "registration_decision",
            Self::PreThesisGraded => "pre_thesis_graded",
            Self::AssignmentChanged => "assignment_changed",
            Self::DefenseScheduled => "defense_scheduled",
            Self::DefenseCompleted => "defense_completed",
            Self::ThesisCompleted => "thesis_completed",
            Self::ThesisCancelled => "thesis_cancelled",
        };
        f.write_str(s)
    }
}

/// One outbound notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Who receives it.
    pub recipient: Recipient,
    /// Category.
    pub kind: NotificationKind,
    /// Short human-readable title.
    pub title: String,
    /// Message body.
    pub body: String,
    /// The workflow record the notification is about.
    pub entity: EntityRef,
}

// ─── Collaborator Trait ─────────────────────────────────────────────

/// Delivery failure reported by the collaborator.
#[derive(Error, Debug)]
#[error("notification dispatch failed: {0}")]
pub struct NotifyError(pub String);

/// The external notification collaborator.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification, best effort.
    async fn notify(&self, note: Notification) -> Result<(), NotifyError>;
}

/// A no-op collaborator for wiring and tests.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _note: Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_core::ThesisId;

    #[tokio::test]
    async fn test_null_notifier_accepts_everything() {
        let notifier = NullNotifier;
        let note = Notification {
            recipient: Recipient::Student(StudentId::new()),
            kind: NotificationKind::ThesisCompleted,
            title: "Thesis completed".to_string(),
            body: "Final grade recorded.".to_string(),
            entity: EntityRef::Thesis(ThesisId::new()),
        };
        assert!(notifier.notify(note).await.is_ok());
    }

    #[test]
    fn test_kind_display_matches_serde() {
        let kind = NotificationKind::DefenseScheduled;
        let json = serde_json::to_value(kind).unwrap();
        assert_eq!(json, serde_json::Value::String(kind.to_string()));
    }
}
