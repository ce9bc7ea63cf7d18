use async_trait::async_trait;
use tracing::debug;

use super::errors::RepositoryError;
use super::storage;
use crate::database::Database;
use crate::models::doctor_feedback::{DoctorFeedback, NewDoctorFeedback};
use crate::subscription::{ChangeCallback, ChangeEvent, ChangeHub, Subscription};

/// Repository trait for doctor feedback entries
#[async_trait]
pub trait DoctorFeedbackRepositoryTrait: Send + Sync {
    /// Persist a new feedback entry and return it with its assigned id
    async fn insert(&self, feedback: NewDoctorFeedback) -> Result<DoctorFeedback, RepositoryError>;

    /// Point lookup; `None` when the id is unknown
    async fn get_by_id(&self, id: i64) -> Result<Option<DoctorFeedback>, RepositoryError>;

    /// All feedback addressed to an elder, newest first
    async fn list_for_elder(&self, elder_id: i64) -> Result<Vec<DoctorFeedback>, RepositoryError>;

    /// All feedback written by a doctor, newest first
    async fn list_for_doctor(&self, doctor_id: i64)
        -> Result<Vec<DoctorFeedback>, RepositoryError>;

    /// Set the read flag. Idempotent: already-read and unknown ids are
    /// silent no-ops.
    async fn mark_read(&self, id: i64) -> Result<(), RepositoryError>;

    /// Number of unread entries addressed to an elder
    async fn unread_count(&self, elder_id: i64) -> Result<usize, RepositoryError>;

    /// Number of abnormal-flagged entries written by a doctor
    async fn abnormal_count(&self, doctor_id: i64) -> Result<usize, RepositoryError>;

    /// Observe committed mutations to this store
    fn subscribe(&self, callback: ChangeCallback) -> Subscription;
}

/// SQLite-backed repository for doctor feedback
#[derive(Debug, Clone)]
pub struct SqliteDoctorFeedbackRepository {
    db: Database,
    changes: ChangeHub,
}

impl SqliteDoctorFeedbackRepository {
    /// Create a repository over an injected database handle
    pub fn new(db: Database) -> Self {
        Self {
            db,
            changes: ChangeHub::new(),
        }
    }

    fn query_list(
        &self,
        sql: &str,
        key: i64,
    ) -> Result<Vec<DoctorFeedback>, RepositoryError> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([key], storage::feedback_from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

#[async_trait]
impl DoctorFeedbackRepositoryTrait for SqliteDoctorFeedbackRepository {
    async fn insert(&self, feedback: NewDoctorFeedback) -> Result<DoctorFeedback, RepositoryError> {
        let conn = self.db.connection()?;

        conn.execute(
            "INSERT INTO doctor_feedback
             (elder_id, health_record_id, doctor_id, comment, timestamp, is_read, is_abnormal, abnormal_type)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7)",
            (
                feedback.elder_id,
                feedback.health_record_id,
                feedback.doctor_id,
                &feedback.comment,
                feedback.timestamp_millis,
                feedback.is_abnormal as i64,
                &feedback.abnormal_type,
            ),
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, elder_id = feedback.elder_id, "stored doctor feedback");

        let stored = conn.query_row(
            &format!(
                "SELECT {} FROM doctor_feedback WHERE id = ?1",
                storage::FEEDBACK_COLUMNS
            ),
            [id],
            storage::feedback_from_row,
        )?;

        self.changes.publish(&ChangeEvent::Feedback {
            elder_id: stored.elder_id,
            doctor_id: stored.doctor_id,
        });
        Ok(stored)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<DoctorFeedback>, RepositoryError> {
        let conn = self.db.connection()?;
        let entry = conn
            .query_row(
                &format!(
                    "SELECT {} FROM doctor_feedback WHERE id = ?1",
                    storage::FEEDBACK_COLUMNS
                ),
                [id],
                storage::feedback_from_row,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        Ok(entry)
    }

    async fn list_for_elder(&self, elder_id: i64) -> Result<Vec<DoctorFeedback>, RepositoryError> {
        self.query_list(
            &format!(
                "SELECT {} FROM doctor_feedback WHERE elder_id = ?1 ORDER BY timestamp DESC",
                storage::FEEDBACK_COLUMNS
            ),
            elder_id,
        )
    }

    async fn list_for_doctor(
        &self,
        doctor_id: i64,
    ) -> Result<Vec<DoctorFeedback>, RepositoryError> {
        self.query_list(
            &format!(
                "SELECT {} FROM doctor_feedback WHERE doctor_id = ?1 ORDER BY timestamp DESC",
                storage::FEEDBACK_COLUMNS
            ),
            doctor_id,
        )
    }

    async fn mark_read(&self, id: i64) -> Result<(), RepositoryError> {
        let conn = self.db.connection()?;

        // The is_read = 0 guard makes the transition one-way and keeps the
        // second call from re-notifying observers.
        let updated = conn.execute(
            "UPDATE doctor_feedback SET is_read = 1 WHERE id = ?1 AND is_read = 0",
            [id],
        )?;

        if updated > 0 {
            let (elder_id, doctor_id): (i64, i64) = conn.query_row(
                "SELECT elder_id, doctor_id FROM doctor_feedback WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            self.changes.publish(&ChangeEvent::Feedback { elder_id, doctor_id });
        }

        Ok(())
    }

    async fn unread_count(&self, elder_id: i64) -> Result<usize, RepositoryError> {
        let conn = self.db.connection()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM doctor_feedback WHERE elder_id = ?1 AND is_read = 0",
            [elder_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn abnormal_count(&self, doctor_id: i64) -> Result<usize, RepositoryError> {
        let conn = self.db.connection()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM doctor_feedback WHERE doctor_id = ?1 AND is_abnormal = 1",
            [doctor_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn subscribe(&self, callback: ChangeCallback) -> Subscription {
        self.changes.subscribe(callback)
    }
}
