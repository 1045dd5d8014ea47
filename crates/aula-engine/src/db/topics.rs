//! Topic persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use aula_core::{SemesterId, TeacherId, TopicId};
use aula_state::{Topic, TopicStatus};

use super::parse_status;

/// Insert a new topic.
pub async fn insert(conn: &mut PgConnection, topic: &Topic) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO topics (id, teacher_id, semester_id, title, description, max_slots, status, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(topic.id.0)
    .bind(topic.teacher_id.0)
    .bind(topic.semester_id.0)
    .bind(&topic.title)
    .bind(&topic.description)
    .bind(topic.max_slots)
    .bind(topic.status.to_string())
    .bind(topic.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Fetch a topic by ID.
pub async fn get_by_id(
    conn: &mut PgConnection,
    id: TopicId,
) -> Result<Option<Topic>, sqlx::Error> {
    let row = sqlx::query_as::<_, TopicRow>(
        "SELECT id, teacher_id, semester_id, title, description, max_slots, status, created_at
         FROM topics WHERE id = $1",
    )
    .bind(id.0)
    .fetch_optional(conn)
    .await?;

    row.map(TopicRow::into_record).transpose()
}

/// Fetch a topic by ID, locking the row for the transaction.
///
/// Accepting an application locks the topic so two concurrent accepts
/// cannot both pass the `max_slots` count check.
pub async fn get_by_id_for_update(
    conn: &mut PgConnection,
    id: TopicId,
) -> Result<Option<Topic>, sqlx::Error> {
    let row = sqlx::query_as::<_, TopicRow>(
        "SELECT id, teacher_id, semester_id, title, description, max_slots, status, created_at
         FROM topics WHERE id = $1 FOR UPDATE",
    )
    .bind(id.0)
    .fetch_optional(conn)
    .await?;

    row.map(TopicRow::into_record).transpose()
}

/// Update a topic's intake status.
pub async fn update_status(conn: &mut PgConnection, topic: &Topic) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE topics SET status = $1 WHERE id = $2")
        .bind(topic.status.to_string())
        .bind(topic.id.0)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// List a teacher's topics for a semester, newest first.
pub async fn list_by_teacher(
    conn: &mut PgConnection,
    teacher: TeacherId,
    semester: SemesterId,
    limit: i64,
    offset: i64,
) -> Result<Vec<Topic>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TopicRow>(
        "SELECT id, teacher_id, semester_id, title, description, max_slots, status, created_at
         FROM topics WHERE teacher_id = $1 AND semester_id = $2
         ORDER BY created_at DESC LIMIT $3 OFFSET $4",
    )
    .bind(teacher.0)
    .bind(semester.0)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(TopicRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct TopicRow {
    id: Uuid,
    teacher_id: Uuid,
    semester_id: Uuid,
    title: String,
    description: Option<String>,
    max_slots: i32,
    status: String,
    created_at: DateTime<Utc>,
}

impl TopicRow {
    fn into_record(self) -> Result<Topic, sqlx::Error> {
        let status: TopicStatus = parse_status("topic", &self.status)?;
        Ok(Topic {
            id: TopicId(self.id),
            teacher_id: TeacherId(self.teacher_id),
            semester_id: SemesterId(self.semester_id),
            title: self.title,
            description: self.description,
            max_slots: self.max_slots,
            status,
            created_at: self.created_at,
        })
    }
}
