//! Topic application persistence operations.
//!
//! The application rows are the contended resource of the pre-thesis
//! track: exclusivity checks lock the student's accepted row, and the
//! auto-reject cascade runs as a single guarded UPDATE.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use aula_core::{SemesterId, StudentId, TopicId};
use aula_state::{ApplicationStatus, TopicApplication};

use super::parse_status;

const COLUMNS: &str = "id, topic_id, student_id, semester_id, message, status, \
                       applied_at, decided_at, decision_reason";

/// Insert a new application.
pub async fn insert(
    conn: &mut PgConnection,
    app: &TopicApplication,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO topic_applications
         (id, topic_id, student_id, semester_id, message, status, applied_at, decided_at, decision_reason)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(app.id)
    .bind(app.topic_id.0)
    .bind(app.student_id.0)
    .bind(app.semester_id.0)
    .bind(&app.message)
    .bind(app.status.to_string())
    .bind(app.applied_at)
    .bind(app.decided_at)
    .bind(&app.decision_reason)
    .execute(conn)
    .await?;

    Ok(())
}

/// Fetch an application by ID.
pub async fn get_by_id(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<TopicApplication>, sqlx::Error> {
    let row = sqlx::query_as::<_, ApplicationRow>(&format!(
        "SELECT {COLUMNS} FROM topic_applications WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    row.map(ApplicationRow::into_record).transpose()
}

/// Fetch an application by ID, locking the row for the transaction.
pub async fn get_by_id_for_update(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<TopicApplication>, sqlx::Error> {
    let row = sqlx::query_as::<_, ApplicationRow>(&format!(
        "SELECT {COLUMNS} FROM topic_applications WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    row.map(ApplicationRow::into_record).transpose()
}

/// Persist a decision (status, decided_at, decision_reason).
pub async fn update_decision(
    conn: &mut PgConnection,
    app: &TopicApplication,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE topic_applications
         SET status = $1, decided_at = $2, decision_reason = $3 WHERE id = $4",
    )
    .bind(app.status.to_string())
    .bind(app.decided_at)
    .bind(&app.decision_reason)
    .bind(app.id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// The id of an application that blocks a re-application to the topic:
/// a pending or accepted row for the same (topic, student) pair.
pub async fn find_blocking(
    conn: &mut PgConnection,
    topic: TopicId,
    student: StudentId,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT id FROM topic_applications
         WHERE topic_id = $1 AND student_id = $2 AND status IN ('pending', 'accepted')",
    )
    .bind(topic.0)
    .bind(student.0)
    .fetch_optional(conn)
    .await
}

/// The student's accepted application anywhere in the system, locked.
///
/// Locking the accepted row serializes two concurrent accepts racing on
/// the same student.
pub async fn find_accepted_by_student(
    conn: &mut PgConnection,
    student: StudentId,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT id FROM topic_applications
         WHERE student_id = $1 AND status = 'accepted' FOR UPDATE",
    )
    .bind(student.0)
    .fetch_optional(conn)
    .await
}

/// Count accepted applications for a topic.
pub async fn count_accepted_for_topic(
    conn: &mut PgConnection,
    topic: TopicId,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM topic_applications WHERE topic_id = $1 AND status = 'accepted'",
    )
    .bind(topic.0)
    .fetch_one(conn)
    .await
}

/// Auto-reject the student's other pending applications, returning the
/// affected ids.
pub async fn reject_other_pending(
    conn: &mut PgConnection,
    student: StudentId,
    except: Uuid,
    reason: &str,
    decided_at: DateTime<Utc>,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let ids = sqlx::query_scalar(
        "UPDATE topic_applications
         SET status = 'rejected', decision_reason = $1, decided_at = $2
         WHERE student_id = $3 AND status = 'pending' AND id <> $4
         RETURNING id",
    )
    .bind(reason)
    .bind(decided_at)
    .bind(student.0)
    .bind(except)
    .fetch_all(conn)
    .await?;

    Ok(ids)
}

/// List applications for a topic, newest first.
pub async fn list_by_topic(
    conn: &mut PgConnection,
    topic: TopicId,
    limit: i64,
    offset: i64,
) -> Result<Vec<TopicApplication>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
        "SELECT {COLUMNS} FROM topic_applications WHERE topic_id = $1
         ORDER BY applied_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(topic.0)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(ApplicationRow::into_record).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: Uuid,
    topic_id: Uuid,
    student_id: Uuid,
    semester_id: Uuid,
    message: Option<String>,
    status: String,
    applied_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
    decision_reason: Option<String>,
}

impl ApplicationRow {
    fn into_record(self) -> Result<TopicApplication, sqlx::Error> {
        let status: ApplicationStatus = parse_status("topic_application", &self.status)?;
        Ok(TopicApplication {
            id: self.id,
            topic_id: TopicId(self.topic_id),
            student_id: StudentId(self.student_id),
            semester_id: SemesterId(self.semester_id),
            message: self.message,
            status,
            applied_at: self.applied_at,
            decided_at: self.decided_at,
            decision_reason: self.decision_reason,
        })
    }
}
