//! Evaluation and final grade persistence operations.
//!
//! Evaluations upsert on (thesis, evaluator, role): resubmitting replaces
//! the prior score and comments. The final grade upserts on thesis.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use aula_core::{TeacherId, ThesisId};
use aula_state::{AssignmentRole, ThesisEvaluation, ThesisFinalGrade};

use super::parse_status;

/// Upsert an evaluation on its (thesis, evaluator, role) key.
pub async fn upsert(conn: &mut PgConnection, e: &ThesisEvaluation) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO thesis_evaluations
         (id, thesis_id, evaluator_id, role, score, comments, submitted_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (thesis_id, evaluator_id, role) DO UPDATE SET
            score = EXCLUDED.score,
            comments = EXCLUDED.comments,
            submitted_at = EXCLUDED.submitted_at",
    )
    .bind(e.id)
    .bind(e.thesis_id.0)
    .bind(e.evaluator_id.0)
    .bind(e.role.to_string())
    .bind(e.score)
    .bind(&e.comments)
    .bind(e.submitted_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// List all evaluations for a thesis.
pub async fn list_by_thesis(
    conn: &mut PgConnection,
    thesis: ThesisId,
) -> Result<Vec<ThesisEvaluation>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EvaluationRow>(
        "SELECT id, thesis_id, evaluator_id, role, score, comments, submitted_at
         FROM thesis_evaluations WHERE thesis_id = $1 ORDER BY submitted_at",
    )
    .bind(thesis.0)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(EvaluationRow::into_record).collect()
}

/// Upsert the final grade for a thesis.
pub async fn upsert_final_grade(
    conn: &mut PgConnection,
    grade: &ThesisFinalGrade,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO thesis_final_grades (thesis_id, final_score, computed_at)
         VALUES ($1, $2, $3)
         ON CONFLICT (thesis_id) DO UPDATE SET
            final_score = EXCLUDED.final_score,
            computed_at = EXCLUDED.computed_at",
    )
    .bind(grade.thesis_id.0)
    .bind(grade.final_score)
    .bind(grade.computed_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Fetch the final grade for a thesis, if computed.
pub async fn get_final_grade(
    conn: &mut PgConnection,
    thesis: ThesisId,
) -> Result<Option<ThesisFinalGrade>, sqlx::Error> {
    let row = sqlx::query_as::<_, FinalGradeRow>(
        "SELECT thesis_id, final_score, computed_at
         FROM thesis_final_grades WHERE thesis_id = $1",
    )
    .bind(thesis.0)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(|r| ThesisFinalGrade {
        thesis_id: ThesisId(r.thesis_id),
        final_score: r.final_score,
        computed_at: r.computed_at,
    }))
}

/// Internal row types for SQLx mapping.
#[derive(sqlx::FromRow)]
struct EvaluationRow {
    id: Uuid,
    thesis_id: Uuid,
    evaluator_id: Uuid,
    role: String,
    score: f64,
    comments: Option<String>,
    submitted_at: DateTime<Utc>,
}

impl EvaluationRow {
    fn into_record(self) -> Result<ThesisEvaluation, sqlx::Error> {
        let role: AssignmentRole = parse_status("thesis_evaluation", &self.role)?;
        Ok(ThesisEvaluation {
            id: self.id,
            thesis_id: ThesisId(self.thesis_id),
            evaluator_id: TeacherId(self.evaluator_id),
            role,
            score: self.score,
            comments: self.comments,
            submitted_at: self.submitted_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FinalGradeRow {
    thesis_id: Uuid,
    final_score: f64,
    computed_at: DateTime<Utc>,
}
