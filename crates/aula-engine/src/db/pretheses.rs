//! Pre-thesis persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use aula_core::{SemesterId, StudentId, TeacherId, TopicId};
use aula_state::{PreThesis, PreThesisStatus};

use super::parse_status;

const COLUMNS: &str = "id, application_id, topic_id, student_id, teacher_id, semester_id, \
                       title, status, final_score, created_at, closed_at, cancel_reason";

/// Insert a new pre-thesis.
pub async fn insert(conn: &mut PgConnection, p: &PreThesis) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO pre_theses
         (id, application_id, topic_id, student_id, teacher_id, semester_id,
          title, status, final_score, created_at, closed_at, cancel_reason)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(p.id)
    .bind(p.application_id)
    .bind(p.topic_id.0)
    .bind(p.student_id.0)
    .bind(p.teacher_id.0)
    .bind(p.semester_id.0)
    .bind(&p.title)
    .bind(p.status.to_string())
    .bind(p.final_score)
    .bind(p.created_at)
    .bind(p.closed_at)
    .bind(&p.cancel_reason)
    .execute(conn)
    .await?;

    Ok(())
}

/// Fetch a pre-thesis by ID, locking the row for the transaction.
pub async fn get_by_id_for_update(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<PreThesis>, sqlx::Error> {
    let row = sqlx::query_as::<_, PreThesisRow>(&format!(
        "SELECT {COLUMNS} FROM pre_theses WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    row.map(PreThesisRow::into_record).transpose()
}

/// Fetch a pre-thesis by the accepted application that spawned it, locked.
pub async fn find_by_application_for_update(
    conn: &mut PgConnection,
    application_id: Uuid,
) -> Result<Option<PreThesis>, sqlx::Error> {
    let row = sqlx::query_as::<_, PreThesisRow>(&format!(
        "SELECT {COLUMNS} FROM pre_theses WHERE application_id = $1 FOR UPDATE"
    ))
    .bind(application_id)
    .fetch_optional(conn)
    .await?;

    row.map(PreThesisRow::into_record).transpose()
}

/// Persist status, grade, and closure fields.
pub async fn update(conn: &mut PgConnection, p: &PreThesis) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE pre_theses
         SET status = $1, final_score = $2, closed_at = $3, cancel_reason = $4
         WHERE id = $5",
    )
    .bind(p.status.to_string())
    .bind(p.final_score)
    .bind(p.closed_at)
    .bind(&p.cancel_reason)
    .bind(p.id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// List a teacher's supervised pre-theses for a semester, newest first.
pub async fn list_by_teacher(
    conn: &mut PgConnection,
    teacher: TeacherId,
    semester: SemesterId,
    limit: i64,
    offset: i64,
) -> Result<Vec<PreThesis>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PreThesisRow>(&format!(
        "SELECT {COLUMNS} FROM pre_theses
         WHERE teacher_id = $1 AND semester_id = $2
         ORDER BY created_at DESC LIMIT $3 OFFSET $4"
    ))
    .bind(teacher.0)
    .bind(semester.0)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(PreThesisRow::into_record).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct PreThesisRow {
    id: Uuid,
    application_id: Uuid,
    topic_id: Uuid,
    student_id: Uuid,
    teacher_id: Uuid,
    semester_id: Uuid,
    title: String,
    status: String,
    final_score: Option<f64>,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    cancel_reason: Option<String>,
}

impl PreThesisRow {
    fn into_record(self) -> Result<PreThesis, sqlx::Error> {
        let status: PreThesisStatus = parse_status("pre_thesis", &self.status)?;
        Ok(PreThesis {
            id: self.id,
            application_id: self.application_id,
            topic_id: TopicId(self.topic_id),
            student_id: StudentId(self.student_id),
            teacher_id: TeacherId(self.teacher_id),
            semester_id: SemesterId(self.semester_id),
            title: self.title,
            status,
            final_score: self.final_score,
            created_at: self.created_at,
            closed_at: self.closed_at,
            cancel_reason: self.cancel_reason,
        })
    }
}
