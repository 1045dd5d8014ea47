//! Thesis proposal persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use aula_core::{SemesterId, StudentId, TeacherId};
use aula_state::{ProposalStatus, ThesisProposal};

use super::parse_status;

const COLUMNS: &str = "id, student_id, teacher_id, semester_id, title, description, keywords, \
                       status, submitted_at, decided_at, decision_reason";

/// Insert a new proposal.
pub async fn insert(conn: &mut PgConnection, p: &ThesisProposal) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO thesis_proposals
         (id, student_id, teacher_id, semester_id, title, description, keywords,
          status, submitted_at, decided_at, decision_reason)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(p.id)
    .bind(p.student_id.0)
    .bind(p.teacher_id.0)
    .bind(p.semester_id.0)
    .bind(&p.title)
    .bind(&p.description)
    .bind(&p.keywords)
    .bind(p.status.to_string())
    .bind(p.submitted_at)
    .bind(p.decided_at)
    .bind(&p.decision_reason)
    .execute(conn)
    .await?;

    Ok(())
}

/// Fetch a proposal by ID.
pub async fn get_by_id(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<ThesisProposal>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProposalRow>(&format!(
        "SELECT {COLUMNS} FROM thesis_proposals WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    row.map(ProposalRow::into_record).transpose()
}

/// Fetch a proposal by ID, locking the row for the transaction.
pub async fn get_by_id_for_update(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<ThesisProposal>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProposalRow>(&format!(
        "SELECT {COLUMNS} FROM thesis_proposals WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    row.map(ProposalRow::into_record).transpose()
}

/// Persist a decision (status, decided_at, decision_reason).
pub async fn update_decision(
    conn: &mut PgConnection,
    p: &ThesisProposal,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE thesis_proposals
         SET status = $1, decided_at = $2, decision_reason = $3 WHERE id = $4",
    )
    .bind(p.status.to_string())
    .bind(p.decided_at)
    .bind(&p.decision_reason)
    .bind(p.id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Whether the student already holds an active (submitted or accepted)
/// proposal for the semester.
pub async fn exists_active(
    conn: &mut PgConnection,
    student: StudentId,
    semester: SemesterId,
) -> Result<bool, sqlx::Error> {
    let id: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM thesis_proposals
         WHERE student_id = $1 AND semester_id = $2 AND status IN ('submitted', 'accepted')
         LIMIT 1",
    )
    .bind(student.0)
    .bind(semester.0)
    .fetch_optional(conn)
    .await?;

    Ok(id.is_some())
}

/// The student's accepted proposal for the semester, locked.
pub async fn find_accepted(
    conn: &mut PgConnection,
    student: StudentId,
    semester: SemesterId,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT id FROM thesis_proposals
         WHERE student_id = $1 AND semester_id = $2 AND status = 'accepted' FOR UPDATE",
    )
    .bind(student.0)
    .bind(semester.0)
    .fetch_optional(conn)
    .await
}

/// List proposals submitted to a teacher for a semester, newest first.
pub async fn list_by_teacher(
    conn: &mut PgConnection,
    teacher: TeacherId,
    semester: SemesterId,
    limit: i64,
    offset: i64,
) -> Result<Vec<ThesisProposal>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ProposalRow>(&format!(
        "SELECT {COLUMNS} FROM thesis_proposals
         WHERE teacher_id = $1 AND semester_id = $2
         ORDER BY submitted_at DESC LIMIT $3 OFFSET $4"
    ))
    .bind(teacher.0)
    .bind(semester.0)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(ProposalRow::into_record).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ProposalRow {
    id: Uuid,
    student_id: Uuid,
    teacher_id: Uuid,
    semester_id: Uuid,
    title: String,
    description: String,
    keywords: Option<String>,
    status: String,
    submitted_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
    decision_reason: Option<String>,
}

impl ProposalRow {
    fn into_record(self) -> Result<ThesisProposal, sqlx::Error> {
        let status: ProposalStatus = parse_status("thesis_proposal", &self.status)?;
        Ok(ThesisProposal {
            id: self.id,
            student_id: StudentId(self.student_id),
            teacher_id: TeacherId(self.teacher_id),
            semester_id: SemesterId(self.semester_id),
            title: self.title,
            description: self.description,
            keywords: self.keywords,
            status,
            submitted_at: self.submitted_at,
            decided_at: self.decided_at,
            decision_reason: self.decision_reason,
        })
    }
}
