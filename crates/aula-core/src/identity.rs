//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the actor and scope identifiers of the supervision
//! workflow. These prevent accidental identifier confusion: you cannot pass
//! a `TeacherId` where a `StudentId` is expected, and a `SemesterId` can
//! never be mistaken for a topic.
//!
//! Row-level primary keys of workflow records (applications, registrations,
//! evaluations, ...) stay plain `Uuid`; only identifiers that cross entity
//! boundaries get a newtype.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentId(pub Uuid);

/// Unique identifier for a teacher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeacherId(pub Uuid);

/// Unique identifier for an academic semester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SemesterId(pub Uuid);

/// Unique identifier for a pre-thesis topic authored by a teacher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicId(pub Uuid);

/// Unique identifier for a thesis execution record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThesisId(pub Uuid);

/// Unique identifier for a platform user account.
///
/// Teachers and students are users too; the request layer resolves a
/// `UserId` into the typed actor identifier before calling the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl StudentId {
    /// Generate a new random student identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl TeacherId {
    /// Generate a new random teacher identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl SemesterId {
    /// Generate a new random semester identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl TopicId {
    /// Generate a new random topic identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl ThesisId {
    /// Generate a new random thesis identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl UserId {
    /// Generate a new random user identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for StudentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for TeacherId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for SemesterId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for TopicId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ThesisId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StudentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "student:{}", self.0)
    }
}

impl std::fmt::Display for TeacherId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "teacher:{}", self.0)
    }
}

impl std::fmt::Display for SemesterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "semester:{}", self.0)
    }
}

impl std::fmt::Display for TopicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "topic:{}", self.0)
    }
}

impl std::fmt::Display for ThesisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "thesis:{}", self.0)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        let id = Uuid::new_v4();
        assert_eq!(StudentId(id).to_string(), format!("student:{id}"));
        assert_eq!(TeacherId(id).to_string(), format!("teacher:{id}"));
        assert_eq!(SemesterId(id).to_string(), format!("semester:{id}"));
        assert_eq!(TopicId(id).to_string(), format!("topic:{id}"));
        assert_eq!(ThesisId(id).to_string(), format!("thesis:{id}"));
        assert_eq!(UserId(id).to_string(), format!("user:{id}"));
    }

    #[test]
    fn test_newtypes_are_distinct() {
        // Compile-time property; the assertion just keeps the test honest.
        let student = StudentId::new();
        let teacher = TeacherId::new();
        assert_ne!(student.as_uuid(), teacher.as_uuid());
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = ThesisId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: ThesisId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
