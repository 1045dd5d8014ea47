//! # Defense Session
//!
//! The scheduled event at which a thesis is orally examined. Exactly one
//! session exists per thesis; the engine enforces the uniqueness and the
//! strictly-in-the-future rule at scheduling time.
//!
//! ## States
//!
//! ```text
//! Scheduled ──▶ Completed  (terminal; thesis moves to defense_completed)
//!     │
//!     └──▶ Cancelled (terminal; follows thesis cancellation)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aula_core::{ThesisId, TransitionError};

/// Status of a defense session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefenseStatus {
    /// The session is on the calendar.
    Scheduled,
    /// The defense has been held (terminal).
    Completed,
    /// The session was cancelled (terminal).
    Cancelled,
}

impl DefenseStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for DefenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A scheduled thesis defense session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefenseSession {
    /// Row identifier.
    pub id: Uuid,
    /// The defended thesis. One session per thesis.
    pub thesis_id: ThesisId,
    /// When the defense takes place.
    pub scheduled_at: DateTime<Utc>,
    /// Room or venue, if known.
    pub room: Option<String>,
    /// Free-form scheduling notes.
    pub notes: Option<String>,
    /// Session status.
    pub status: DefenseStatus,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl DefenseSession {
    const ENTITY: &'static str = "defense_session";

    /// Create a new scheduled session.
    pub fn new(
        thesis_id: ThesisId,
        scheduled_at: DateTime<Utc>,
        room: Option<String>,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            thesis_id,
            scheduled_at,
            room,
            notes,
            status: DefenseStatus::Scheduled,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move the session to a new time, optionally updating room and notes.
    ///
    /// Only a scheduled session can be rescheduled. The new time must
    /// already be validated as strictly in the future.
    pub fn reschedule(
        &mut self,
        scheduled_at: DateTime<Utc>,
        room: Option<String>,
        notes: Option<String>,
    ) -> Result<(), TransitionError> {
        self.require_scheduled(DefenseStatus::Scheduled)?;
        self.scheduled_at = scheduled_at;
        if room.is_some() {
            self.room = room;
        }
        if notes.is_some() {
            self.notes = notes;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Mark the defense as held (SCHEDULED → COMPLETED).
    pub fn complete(&mut self) -> Result<(), TransitionError> {
        self.require_scheduled(DefenseStatus::Completed)?;
        self.status = DefenseStatus::Completed;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Cancel the session (SCHEDULED → CANCELLED).
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        self.require_scheduled(DefenseStatus::Cancelled)?;
        self.status = DefenseStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn require_scheduled(&self, target: DefenseStatus) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal {
                entity: Self::ENTITY,
                state: self.status.to_string(),
            });
        }
        if self.status != DefenseStatus::Scheduled {
            return Err(TransitionError::Invalid {
                entity: Self::ENTITY,
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_session() -> DefenseSession {
        DefenseSession::new(
            ThesisId::new(),
            Utc::now() + Duration::days(14),
            Some("B-204".to_string()),
            None,
        )
    }

    #[test]
    fn test_new_session_is_scheduled() {
        let s = make_session();
        assert_eq!(s.status, DefenseStatus::Scheduled);
        assert_eq!(s.room.as_deref(), Some("B-204"));
    }

    #[test]
    fn test_reschedule_updates_time_and_room() {
        let mut s = make_session();
        let new_time = Utc::now() + Duration::days(21);
        s.reschedule(new_time, Some("A-101".to_string()), None).unwrap();
        assert_eq!(s.scheduled_at, new_time);
        assert_eq!(s.room.as_deref(), Some("A-101"));
    }

    #[test]
    fn test_reschedule_keeps_room_when_not_given() {
        let mut s = make_session();
        s.reschedule(Utc::now() + Duration::days(7), None, None).unwrap();
        assert_eq!(s.room.as_deref(), Some("B-204"));
    }

    #[test]
    fn test_complete() {
        let mut s = make_session();
        s.complete().unwrap();
        assert_eq!(s.status, DefenseStatus::Completed);
    }

    #[test]
    fn test_completed_cannot_be_rescheduled() {
        let mut s = make_session();
        s.complete().unwrap();
        let err = s
            .reschedule(Utc::now() + Duration::days(1), None, None)
            .unwrap_err();
        assert!(matches!(err, TransitionError::Terminal { .. }));
    }

    #[test]
    fn test_cancelled_cannot_be_completed() {
        let mut s = make_session();
        s.cancel().unwrap();
        assert!(s.complete().is_err());
    }
}
