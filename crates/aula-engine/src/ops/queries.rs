//! Read accessors: listings and snapshots for display.
//!
//! These queries are not linearizable with concurrent workflow writes and
//! take no row locks.

use uuid::Uuid;

use aula_core::{SemesterId, TeacherId, ThesisId, TopicId, WorkflowError};
use aula_state::{
    PreThesis, Thesis, ThesisAssignment, ThesisEvaluation, ThesisFinalGrade, ThesisProposal,
    ThesisRegistration, Topic, TopicApplication,
};

use crate::capacity::{self, CapacitySnapshot};
use crate::db;
use crate::error::map_db_err;
use crate::SupervisionEngine;

impl SupervisionEngine {
    /// Fetch a thesis.
    pub async fn get_thesis(&self, thesis_id: ThesisId) -> Result<Thesis, WorkflowError> {
        let mut conn = self.pool().acquire().await.map_err(map_db_err)?;
        db::theses::get_by_id(&mut conn, thesis_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("thesis", thesis_id))
    }

    /// Fetch the final grade of a thesis, if computed.
    pub async fn get_final_grade(
        &self,
        thesis_id: ThesisId,
    ) -> Result<Option<ThesisFinalGrade>, WorkflowError> {
        let mut conn = self.pool().acquire().await.map_err(map_db_err)?;
        db::evaluations::get_final_grade(&mut conn, thesis_id)
            .await
            .map_err(map_db_err)
    }

    /// The active committee and submitted evaluations of a thesis.
    pub async fn get_thesis_committee(
        &self,
        thesis_id: ThesisId,
    ) -> Result<(Vec<ThesisAssignment>, Vec<ThesisEvaluation>), WorkflowError> {
        let mut conn = self.pool().acquire().await.map_err(map_db_err)?;
        let assignments = db::assignments::list_active(&mut conn, thesis_id)
            .await
            .map_err(map_db_err)?;
        let evaluations = db::evaluations::list_by_thesis(&mut conn, thesis_id)
            .await
            .map_err(map_db_err)?;
        Ok((assignments, evaluations))
    }

    /// A teacher's remaining capacity for a semester, for display.
    pub async fn teacher_capacity(
        &self,
        teacher: TeacherId,
        semester: SemesterId,
    ) -> Result<Option<CapacitySnapshot>, WorkflowError> {
        let mut conn = self.pool().acquire().await.map_err(map_db_err)?;
        capacity::snapshot(&mut conn, teacher, semester)
            .await
            .map_err(map_db_err)
    }

    /// List a teacher's topics for a semester.
    pub async fn list_topics(
        &self,
        teacher: TeacherId,
        semester: SemesterId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Topic>, WorkflowError> {
        let mut conn = self.pool().acquire().await.map_err(map_db_err)?;
        db::topics::list_by_teacher(&mut conn, teacher, semester, limit, offset)
            .await
            .map_err(map_db_err)
    }

    /// List applications to a topic.
    pub async fn list_topic_applications(
        &self,
        topic: TopicId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TopicApplication>, WorkflowError> {
        let mut conn = self.pool().acquire().await.map_err(map_db_err)?;
        db::applications::list_by_topic(&mut conn, topic, limit, offset)
            .await
            .map_err(map_db_err)
    }

    /// List proposals submitted to a teacher for a semester.
    pub async fn list_proposals(
        &self,
        teacher: TeacherId,
        semester: SemesterId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ThesisProposal>, WorkflowError> {
        let mut conn = self.pool().acquire().await.map_err(map_db_err)?;
        db::proposals::list_by_teacher(&mut conn, teacher, semester, limit, offset)
            .await
            .map_err(map_db_err)
    }

    /// The approval queue: pending registrations for a semester, oldest
    /// first.
    pub async fn list_pending_registrations(
        &self,
        semester: SemesterId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ThesisRegistration>, WorkflowError> {
        let mut conn = self.pool().acquire().await.map_err(map_db_err)?;
        db::registrations::list_pending(&mut conn, semester, limit, offset)
            .await
            .map_err(map_db_err)
    }

    /// Fetch an application.
    pub async fn get_application(
        &self,
        application_id: Uuid,
    ) -> Result<TopicApplication, WorkflowError> {
        let mut conn = self.pool().acquire().await.map_err(map_db_err)?;
        db::applications::get_by_id(&mut conn, application_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("topic_application", application_id))
    }

    /// List theses supervised by a teacher for a semester.
    pub async fn list_theses(
        &self,
        supervisor: TeacherId,
        semester: SemesterId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Thesis>, WorkflowError> {
        let mut conn = self.pool().acquire().await.map_err(map_db_err)?;
        db::theses::list_by_supervisor(&mut conn, supervisor, semester, limit, offset)
            .await
            .map_err(map_db_err)
    }

    /// List pre-theses supervised by a teacher for a semester.
    pub async fn list_pre_theses(
        &self,
        teacher: TeacherId,
        semester: SemesterId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PreThesis>, WorkflowError> {
        let mut conn = self.pool().acquire().await.map_err(map_db_err)?;
        db::pretheses::list_by_teacher(&mut conn, teacher, semester, limit, offset)
            .await
            .map_err(map_db_err)
    }

    /// Fetch a registration.
    pub async fn get_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<ThesisRegistration, WorkflowError> {
        let mut conn = self.pool().acquire().await.map_err(map_db_err)?;
        db::registrations::get_by_id(&mut conn, registration_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("thesis_registration", registration_id))
    }
}
