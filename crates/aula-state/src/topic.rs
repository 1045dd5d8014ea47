//! Pre-thesis topic intake record.
//!
//! Topics are authored by teachers and opened for student applications.
//! Slot accounting against `max_slots` happens in the engine, which counts
//! accepted applications under the same transaction that accepts one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aula_core::{SemesterId, TeacherId, TopicId, TransitionError};

/// Intake status of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicStatus {
    /// Accepting applications.
    Open,
    /// Closed to new applications.
    Closed,
}

impl std::fmt::Display for TopicStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// A teacher-authored pre-thesis topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    /// Unique topic identifier.
    pub id: TopicId,
    /// The authoring teacher.
    pub teacher_id: TeacherId,
    /// The semester the topic is offered in.
    pub semester_id: SemesterId,
    /// Topic title.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Maximum number of accepted applications.
    pub max_slots: i32,
    /// Current intake status.
    pub status: TopicStatus,
    /// When the topic was created.
    pub created_at: DateTime<Utc>,
}

impl Topic {
    const ENTITY: &'static str = "topic";

    /// Create a new open topic.
    pub fn new(
        teacher_id: TeacherId,
        semester_id: SemesterId,
        title: String,
        description: Option<String>,
        max_slots: i32,
    ) -> Self {
        Self {
            id: TopicId::new(),
            teacher_id,
            semester_id,
            title,
            description,
            max_slots,
            status: TopicStatus::Open,
            created_at: Utc::now(),
        }
    }

    /// Whether the topic accepts new applications.
    pub fn is_open(&self) -> bool {
        self.status == TopicStatus::Open
    }

    /// Close the topic to new applications.
    pub fn close(&mut self) -> Result<(), TransitionError> {
        if self.status != TopicStatus::Open {
            return Err(TransitionError::Invalid {
                entity: Self::ENTITY,
                from: self.status.to_string(),
                to: TopicStatus::Closed.to_string(),
            });
        }
        self.status = TopicStatus::Closed;
        Ok(())
    }

    /// Reopen a closed topic.
    pub fn reopen(&mut self) -> Result<(), TransitionError> {
        if self.status != TopicStatus::Closed {
            return Err(TransitionError::Invalid {
                entity: Self::ENTITY,
                from: self.status.to_string(),
                to: TopicStatus::Open.to_string(),
            });
        }
        self.status = TopicStatus::Open;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_topic() -> Topic {
        Topic::new(
            TeacherId::new(),
            SemesterId::new(),
            "Distributed consensus".to_string(),
            None,
            3,
        )
    }

    #[test]
    fn test_new_topic_is_open() {
        let t = make_topic();
        assert_eq!(t.status, TopicStatus::Open);
        assert!(t.is_open());
    }

    #[test]
    fn test_close_and_reopen() {
        let mut t = make_topic();
        t.close().unwrap();
        assert!(!t.is_open());
        t.reopen().unwrap();
        assert!(t.is_open());
    }

    #[test]
    fn test_double_close_rejected() {
        let mut t = make_topic();
        t.close().unwrap();
        assert!(t.close().is_err());
    }

    #[test]
    fn test_reopen_open_topic_rejected() {
        let mut t = make_topic();
        assert!(t.reopen().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(TopicStatus::Open).unwrap(),
            serde_json::Value::String("open".to_string())
        );
    }
}
