//! # Entity References
//!
//! A tagged union over the workflow entity kinds. Notifications, audit
//! lines, and any other outward pointer at "the record this is about"
//! carry an [`EntityRef`] instead of a free-form `(kind, id)` string pair,
//! so resolution sites are forced to handle every kind exhaustively.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::{ThesisId, TopicId};

/// A typed reference to one workflow entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    /// A pre-thesis topic.
    Topic(TopicId),
    /// A student's application to a topic.
    TopicApplication(Uuid),
    /// A pre-thesis execution record.
    PreThesis(Uuid),
    /// A student's thesis supervision proposal.
    ThesisProposal(Uuid),
    /// A thesis registration awaiting or past approval.
    ThesisRegistration(Uuid),
    /// A thesis execution record.
    Thesis(ThesisId),
    /// A scheduled thesis defense session.
    DefenseSession(Uuid),
    /// A single evaluator's thesis evaluation.
    Evaluation(Uuid),
}

impl EntityRef {
    /// The entity kind as a stable snake_case tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Topic(_) => "topic",
            Self::TopicApplication(_) => "topic_application",
            Self::PreThesis(_) => "pre_thesis",
            Self::ThesisProposal(_) => "thesis_proposal",
            Self::ThesisRegistration(_) => "thesis_registration",
            Self::Thesis(_) => "thesis",
            Self::DefenseSession(_) => "defense_session",
            Self::Evaluation(_) => "evaluation",
        }
    }

    /// The referenced row identifier.
    pub fn id(&self) -> Uuid {
        match self {
            Self::Topic(id) => id.0,
            Self::TopicApplication(id) => *id,
            Self::PreThesis(id) => *id,
            Self::ThesisProposal(id) => *id,
            Self::ThesisRegistration(id) => *id,
            Self::Thesis(id) => id.0,
            Self::DefenseSession(id) => *id,
            Self::Evaluation(id) => *id,
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_kind_colon_id() {
        let id = Uuid::new_v4();
        let r = EntityRef::ThesisRegistration(id);
        assert_eq!(r.to_string(), format!("thesis_registration:{id}"));
    }

    #[test]
    fn test_kind_and_id_accessors() {
        let thesis = ThesisId::new();
        let r = EntityRef::Thesis(thesis);
        assert_eq!(r.kind(), "thesis");
        assert_eq!(r.id(), thesis.0);
    }

    #[test]
    fn test_serde_shape() {
        let id = Uuid::new_v4();
        let r = EntityRef::DefenseSession(id);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["kind"], "defense_session");
        assert_eq!(json["id"], id.to_string());

        let parsed: EntityRef = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, r);
    }
}
