//! Topic intake: creation, closing, reopening.

use aula_core::{SemesterId, TeacherId, TopicId, WorkflowError};
use aula_state::Topic;

use crate::db;
use crate::error::map_db_err;
use crate::SupervisionEngine;

use super::{require_active_semester, require_field};

impl SupervisionEngine {
    /// Create an open topic for the semester.
    pub async fn create_topic(
        &self,
        teacher: TeacherId,
        semester: SemesterId,
        title: String,
        description: Option<String>,
        max_slots: i32,
    ) -> Result<Topic, WorkflowError> {
        require_field(&title, "title")?;
        if max_slots < 1 {
            return Err(WorkflowError::Validation(format!(
                "max_slots must be at least 1, got {max_slots}"
            )));
        }

        let mut tx = self.pool().begin().await.map_err(map_db_err)?;
        require_active_semester(&mut tx, semester).await?;

        let topic = Topic::new(teacher, semester, title, description, max_slots);
        db::topics::insert(&mut tx, &topic)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;
        Ok(topic)
    }

    /// Close a topic to new applications, as its owner.
    pub async fn close_topic(
        &self,
        actor: TeacherId,
        topic_id: TopicId,
    ) -> Result<Topic, WorkflowError> {
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut topic = db::topics::get_by_id_for_update(&mut tx, topic_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("topic", topic_id))?;
        if topic.teacher_id != actor {
            return Err(WorkflowError::Unauthorized(format!(
                "{actor} does not own {topic_id}"
            )));
        }

        topic.close()?;
        db::topics::update_status(&mut tx, &topic)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;
        Ok(topic)
    }

    /// Reopen a closed topic, as its owner.
    pub async fn reopen_topic(
        &self,
        actor: TeacherId,
        topic_id: TopicId,
    ) -> Result<Topic, WorkflowError> {
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut topic = db::topics::get_by_id_for_update(&mut tx, topic_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("topic", topic_id))?;
        if topic.teacher_id != actor {
            return Err(WorkflowError::Unauthorized(format!(
                "{actor} does not own {topic_id}"
            )));
        }

        topic.reopen()?;
        db::topics::update_status(&mut tx, &topic)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;
        Ok(topic)
    }
}
