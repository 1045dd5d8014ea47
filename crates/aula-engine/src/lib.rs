//! # aula-engine — Academic Supervision Workflow Engine
//!
//! The transactional core of the Aula stack. Every inbound decision
//! (apply, accept, approve, assign, schedule, evaluate) enters one of the
//! operation modules, which opens a single Postgres transaction, loads the
//! contended rows with `FOR UPDATE`, applies the pure state-machine
//! transitions from `aula-state`, performs any cascade writes, and commits.
//! Notifications are composed inside the operation but dispatched only
//! after commit; their failure never rolls back a workflow transition.
//!
//! ## Modules
//!
//! - `db` — row mapping and query helpers per entity, plus pool/migration
//!   bootstrap. All helpers take `&mut PgConnection` so they compose inside
//!   transactions.
//! - `capacity` — the per-teacher, per-semester capacity ledger.
//! - `ops` — the workflow operations, grouped per surface.
//! - `notify` — the outbound notification collaborator boundary.
//! - `error` — mapping from store errors to the workflow error taxonomy.
//!
//! ## Concurrency
//!
//! The engine is called from independent request workers. Cross-entity
//! invariants (exclusive commitments, capacity non-negativity, cascade
//! atomicity) hold under arbitrary interleaving because each multi-step
//! mutation runs in one transaction and the contended rows (the ledger row
//! and the student's semester-scoped decision rows) are locked before the
//! checks. Store-detected races surface as the retryable `CONFLICT` error.

use std::sync::Arc;

use sqlx::PgPool;

use aula_core::GradingScale;

pub mod capacity;
pub mod db;
pub mod error;
pub mod notify;
pub mod ops;

pub use capacity::{CapacitySnapshot, Track};
pub use notify::{Notification, NotificationKind, Notifier, NotifyError, NullNotifier, Recipient};

/// The workflow engine. Cheap to clone; holds the connection pool, the
/// notification collaborator, and the deployment's grading scale.
#[derive(Clone)]
pub struct SupervisionEngine {
    pool: PgPool,
    notifier: Arc<dyn Notifier>,
    scale: GradingScale,
}

impl SupervisionEngine {
    /// Create an engine with the default grading scale (0 to 10, 5.0
    /// passing).
    pub fn new(pool: PgPool, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_scale(pool, notifier, GradingScale::default())
    }

    /// Create an engine grading on a custom scale.
    pub fn with_scale(pool: PgPool, notifier: Arc<dyn Notifier>, scale: GradingScale) -> Self {
        Self {
            pool,
            notifier,
            scale,
        }
    }

    /// The backing connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The grading scale in force.
    pub fn scale(&self) -> GradingScale {
        self.scale
    }

    /// Dispatch notifications after a committed transaction.
    ///
    /// Best effort: failures are logged and swallowed, never propagated.
    pub(crate) async fn dispatch(&self, notes: Vec<Notification>) {
        for note in notes {
            if let Err(e) = self.notifier.notify(note.clone()).await {
                tracing::warn!(
                    recipient = %note.recipient,
                    kind = %note.kind,
                    entity = %note.entity,
                    error = %e,
                    "notification dispatch failed"
                );
            }
        }
    }
}
