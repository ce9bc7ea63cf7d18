use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error};
use validator::Validate;

use crate::entities::conversions;
use crate::entities::feedback::{CreateFeedbackRequest, DoctorFeedback};
use crate::services::evaluation::{evaluate, EvaluationConfig};
use health_manage_center_data::models::doctor_feedback::NewDoctorFeedback;
use health_manage_center_data::repository::{
    DoctorFeedbackRepositoryTrait, HealthRecordRepositoryTrait, RepositoryError,
};
use health_manage_center_data::subscription::{ChangeCallback, Subscription};

/// Feedback service errors
#[derive(Debug, Error)]
pub enum FeedbackServiceError {
    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The referenced health record does not exist
    #[error("Health record not found: {0}")]
    RecordNotFound(i64),

    /// Repository error
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

/// Service owning the doctor-feedback lifecycle: creation against an existing
/// record, one-way read tracking, live lists and aggregate counts.
pub struct FeedbackService<F, H>
where
    F: DoctorFeedbackRepositoryTrait,
    H: HealthRecordRepositoryTrait,
{
    feedback: F,
    records: H,
    evaluation: EvaluationConfig,
}

impl<F, H> FeedbackService<F, H>
where
    F: DoctorFeedbackRepositoryTrait,
    H: HealthRecordRepositoryTrait,
{
    /// Create a new feedback service
    pub fn new(feedback: F, records: H) -> Self {
        Self {
            feedback,
            records,
            evaluation: EvaluationConfig::default(),
        }
    }

    /// Override the evaluator configuration
    pub fn with_evaluation_config(mut self, evaluation: EvaluationConfig) -> Self {
        self.evaluation = evaluation;
        self
    }

    /// Map repository errors to service errors
    fn map_repo_error(&self, err: RepositoryError) -> FeedbackServiceError {
        match err {
            RepositoryError::Validation(msg) => FeedbackServiceError::ValidationError(msg),
            _ => FeedbackServiceError::RepositoryError(err.to_string()),
        }
    }

    /// Create a feedback entry for an existing health record.
    ///
    /// The abnormality verdict is computed from the referenced record and
    /// copied onto the entry. Fails without persisting anything when the
    /// comment is blank or the record does not exist.
    pub async fn create_feedback(
        &self,
        request: CreateFeedbackRequest,
    ) -> Result<DoctorFeedback, FeedbackServiceError> {
        if let Err(validation_errors) = request.validate() {
            return Err(FeedbackServiceError::ValidationError(
                validation_errors.to_string(),
            ));
        }
        if request.comment.trim().is_empty() {
            return Err(FeedbackServiceError::ValidationError(
                "Comment must not be empty".to_string(),
            ));
        }

        let record = self
            .records
            .get_by_id(request.health_record_id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or(FeedbackServiceError::RecordNotFound(
                request.health_record_id,
            ))?;

        let verdict = evaluate(
            &conversions::convert_to_domain_record(record),
            &self.evaluation,
        );

        let entry = NewDoctorFeedback {
            elder_id: request.elder_id,
            health_record_id: request.health_record_id,
            doctor_id: request.doctor_id,
            comment: request.comment,
            timestamp_millis: Utc::now().timestamp_millis(),
            is_abnormal: verdict.is_abnormal,
            abnormal_type: verdict.abnormal_type(),
        };

        let stored = self
            .feedback
            .insert(entry)
            .await
            .map_err(|e| {
                error!("failed to store doctor feedback: {}", e);
                self.map_repo_error(e)
            })?;
        debug!(id = stored.id, elder_id = stored.elder_id, "created doctor feedback");

        Ok(conversions::convert_to_domain_feedback(stored))
    }

    /// Mark a feedback entry as read.
    ///
    /// Idempotent: already-read entries and unknown ids are silent no-ops.
    pub async fn mark_read(&self, feedback_id: i64) -> Result<(), FeedbackServiceError> {
        self.feedback
            .mark_read(feedback_id)
            .await
            .map_err(|e| self.map_repo_error(e))
    }

    /// All feedback addressed to an elder, newest first
    pub async fn list_for_elder(
        &self,
        elder_id: i64,
    ) -> Result<Vec<DoctorFeedback>, FeedbackServiceError> {
        let entries = self
            .feedback
            .list_for_elder(elder_id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok(entries
            .into_iter()
            .map(conversions::convert_to_domain_feedback)
            .collect())
    }

    /// All feedback written by a doctor, newest first
    pub async fn list_for_doctor(
        &self,
        doctor_id: i64,
    ) -> Result<Vec<DoctorFeedback>, FeedbackServiceError> {
        let entries = self
            .feedback
            .list_for_doctor(doctor_id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok(entries
            .into_iter()
            .map(conversions::convert_to_domain_feedback)
            .collect())
    }

    /// Number of unread entries addressed to an elder
    pub async fn unread_count(&self, elder_id: i64) -> Result<usize, FeedbackServiceError> {
        self.feedback
            .unread_count(elder_id)
            .await
            .map_err(|e| self.map_repo_error(e))
    }

    /// Number of abnormal-flagged entries written by a doctor
    pub async fn abnormal_count(&self, doctor_id: i64) -> Result<usize, FeedbackServiceError> {
        self.feedback
            .abnormal_count(doctor_id)
            .await
            .map_err(|e| self.map_repo_error(e))
    }

    /// Observe committed mutations to the feedback store; lists and counts
    /// should be re-read on every notification
    pub fn subscribe(&self, callback: ChangeCallback) -> Subscription {
        self.feedback.subscribe(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_manage_center_data::models::health_record::NewHealthRecord;
    use health_manage_center_data::repository::{
        InMemoryDoctorFeedbackRepository, InMemoryHealthRecordRepository,
    };

    const DAY: i64 = 86_400_000;

    fn service() -> (
        FeedbackService<InMemoryDoctorFeedbackRepository, InMemoryHealthRecordRepository>,
        InMemoryHealthRecordRepository,
    ) {
        let records = InMemoryHealthRecordRepository::new();
        let service = FeedbackService::new(InMemoryDoctorFeedbackRepository::new(), records.clone());
        (service, records)
    }

    async fn store_record(
        records: &InMemoryHealthRecordRepository,
        user_id: i64,
        heart_rate: Option<i32>,
    ) -> i64 {
        records
            .upsert_for_day(
                NewHealthRecord {
                    user_id,
                    timestamp_millis: 1_000,
                    weight_kg: None,
                    height_cm: None,
                    heart_rate_bpm: heart_rate,
                    systolic: None,
                    diastolic: None,
                    sleep_hours: None,
                    analyzed: true,
                },
                0,
                DAY,
            )
            .await
            .unwrap()
            .record_id
    }

    fn request(record_id: i64, comment: &str) -> CreateFeedbackRequest {
        CreateFeedbackRequest {
            elder_id: 1,
            doctor_id: 2,
            health_record_id: record_id,
            comment: comment.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_feedback_inherits_verdict_from_record() {
        let (service, records) = service();
        let record_id = store_record(&records, 1, Some(45)).await;

        let feedback = service
            .create_feedback(request(record_id, "Please see me this week"))
            .await
            .unwrap();

        assert!(feedback.is_abnormal);
        assert_eq!(feedback.abnormal_type.as_deref(), Some("Abnormal Heart Rate"));
        assert!(!feedback.is_read);
        assert_eq!(service.unread_count(1).await.unwrap(), 1);
        assert_eq!(service.abnormal_count(2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_feedback_on_normal_record_is_not_flagged() {
        let (service, records) = service();
        let record_id = store_record(&records, 1, Some(72)).await;

        let feedback = service
            .create_feedback(request(record_id, "Looking good"))
            .await
            .unwrap();

        assert!(!feedback.is_abnormal);
        assert_eq!(feedback.abnormal_type, None);
        assert_eq!(service.abnormal_count(2).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_feedback_against_missing_record_persists_nothing() {
        let (service, _records) = service();

        let result = service.create_feedback(request(999, "hello")).await;
        assert!(matches!(
            result,
            Err(FeedbackServiceError::RecordNotFound(999))
        ));

        assert!(service.list_for_elder(1).await.unwrap().is_empty());
        assert_eq!(service.unread_count(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blank_comment_is_rejected_before_persistence() {
        let (service, records) = service();
        let record_id = store_record(&records, 1, Some(72)).await;

        for comment in ["", "   "] {
            let result = service.create_feedback(request(record_id, comment)).await;
            assert!(matches!(
                result,
                Err(FeedbackServiceError::ValidationError(_))
            ));
        }
        assert!(service.list_for_elder(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent_and_one_way() {
        let (service, records) = service();
        let record_id = store_record(&records, 1, Some(72)).await;

        let feedback = service
            .create_feedback(request(record_id, "note"))
            .await
            .unwrap();

        service.mark_read(feedback.id).await.unwrap();
        service.mark_read(feedback.id).await.unwrap();
        service.mark_read(12_345).await.unwrap();

        assert_eq!(service.unread_count(1).await.unwrap(), 0);
        let listed = service.list_for_elder(1).await.unwrap();
        assert!(listed[0].is_read);
    }

    #[tokio::test]
    async fn test_lists_are_newest_first() {
        let (service, records) = service();
        let record_id = store_record(&records, 1, Some(72)).await;

        service
            .create_feedback(request(record_id, "first"))
            .await
            .unwrap();
        service
            .create_feedback(request(record_id, "second"))
            .await
            .unwrap();

        let listed = service.list_for_doctor(2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].timestamp_millis >= listed[1].timestamp_millis);
    }

    #[tokio::test]
    async fn test_subscribers_observe_creation() {
        let (service, records) = service();
        let record_id = store_record(&records, 1, Some(72)).await;

        let seen = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen_clone = std::sync::Arc::clone(&seen);
        let _sub = service.subscribe(Box::new(move |_| {
            seen_clone.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }));

        service
            .create_feedback(request(record_id, "observed"))
            .await
            .unwrap();

        assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
