//! # aula-core — Foundational Types
//!
//! Shared vocabulary for the Aula academic supervision stack:
//!
//! - **Identity newtypes** (`identity.rs`): `StudentId`, `TeacherId`,
//!   `SemesterId`, `TopicId`, `ThesisId`, `UserId`. Type-level separation
//!   of identifier namespaces prevents passing a teacher where a student
//!   is expected.
//!
//! - **Entity references** (`reference.rs`): `EntityRef`, a sum type over
//!   the workflow entity kinds. Anything that needs to point at "the thing
//!   this notification is about" carries an `EntityRef`, and the compiler
//!   enforces exhaustive handling wherever one is resolved.
//!
//! - **Grading scale** (`grading.rs`): `GradingScale` with configurable
//!   bounds and passing threshold, score validation, and the two-decimal
//!   mean used for final grades.
//!
//! - **Errors** (`error.rs`): `WorkflowError`, the single error taxonomy
//!   surfaced at the engine boundary, and `TransitionError`, the rejection
//!   type shared by the pure state machines.

pub mod error;
pub mod grading;
pub mod identity;
pub mod reference;

// ─── Re-exports ─────────────────────────────────────────────────────

pub use error::{TransitionError, WorkflowError};
pub use grading::{mean_score, round2, GradingScale};
pub use identity::{SemesterId, StudentId, TeacherId, ThesisId, TopicId, UserId};
pub use reference::EntityRef;
