//! # aula-state — Supervision Workflow State Machines
//!
//! Implements the state machines of the academic supervision workflow as
//! plain data plus validated transitions. Each record owns its status enum;
//! transition methods reject unreachable status changes with structured
//! errors and stamp decision timestamps. Invalid transitions are runtime
//! errors carrying the current state, the attempted target, and the entity
//! kind.
//!
//! ## State Machines
//!
//! - **Topic** (`topic.rs`): teacher-authored pre-thesis topic, `open ⇄ closed`.
//!
//! - **TopicApplication** (`application.rs`): a student's commitment to a
//!   topic, `pending → {accepted, rejected, cancelled}`, with cancellation
//!   of an accepted application permitted for withdrawal.
//!
//! - **ThesisProposal** (`proposal.rs`): a student's request for full thesis
//!   supervision, `submitted → {accepted, rejected, cancelled}`.
//!
//! - **ThesisRegistration** (`registration.rs`): the approvable record
//!   derived from an accepted proposal,
//!   `pending_approval → {approved, rejected, cancelled}`.
//!
//! - **PreThesis** (`prethesis.rs`): pre-thesis execution record with
//!   threshold-based grading, `in_progress → {completed, cancelled}`.
//!
//! - **Thesis** (`thesis.rs`): multi-stage thesis execution record,
//!   `draft|in_progress → defense_scheduled → defense_completed →
//!   completed`, cancellable from any non-terminal state, with an
//!   append-only transition log.
//!
//! - **DefenseSession** (`defense.rs`): the scheduled oral examination,
//!   `scheduled → {completed, cancelled}`, reschedulable while scheduled.
//!
//! - **ThesisAssignment** (`assignment.rs`): a teacher's committee role on
//!   a thesis, with explicit `active` soft-delete and reactivation.
//!
//! - **Evaluation rules** (`evaluation.rs`): per-role evaluations and the
//!   completeness rule deciding when a final grade exists.
//!
//! ## Design
//!
//! These machines validate *local* transitions only. Cross-entity
//! invariants (exclusive commitments, capacity accounting, cascades) live
//! in `aula-engine`, which applies these transitions inside transactions.
//! Cascade side effects are explicit engine procedures, never implicit
//! hooks on attribute mutation.

pub mod application;
pub mod assignment;
pub mod defense;
pub mod evaluation;
pub mod prethesis;
pub mod proposal;
pub mod registration;
pub mod thesis;
pub mod topic;

// ─── Topic re-exports ───────────────────────────────────────────────

pub use topic::{Topic, TopicStatus};

// ─── Application / proposal re-exports ──────────────────────────────

pub use application::{ApplicationStatus, TopicApplication, SUPERSEDED_REASON};
pub use proposal::{ProposalStatus, ThesisProposal};

// ─── Registration re-exports ────────────────────────────────────────

pub use registration::{RegistrationStatus, ThesisRegistration, CASCADE_CANCEL_REASON};

// ─── Supervision record re-exports ──────────────────────────────────

pub use prethesis::{PreThesis, PreThesisStatus};
pub use thesis::{Thesis, ThesisStatus, TransitionRecord};

// ─── Defense / assignment / evaluation re-exports ───────────────────

pub use assignment::{AssignmentRole, ThesisAssignment};
pub use defense::{DefenseSession, DefenseStatus};
pub use evaluation::{
    final_grade, missing_roles, required_roles, ThesisEvaluation, ThesisFinalGrade,
};
