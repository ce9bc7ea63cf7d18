use chrono::{DateTime, Duration, Local, NaiveTime};
use thiserror::Error;
use tracing::debug;

use crate::entities::conversions;
use crate::entities::health_record::{AnalyzedRecord, DailyVitalsInput, HealthRecord};
use crate::services::evaluation::{evaluate, wellness_score, EvaluationConfig};
use health_manage_center_data::models::health_record::NewHealthRecord;
use health_manage_center_data::repository::{
    HealthRecordRepositoryTrait, RepositoryError, SortOrder,
};
use health_manage_center_data::subscription::{ChangeCallback, Subscription};

/// Health record service errors
#[derive(Debug, Error)]
pub enum HealthRecordServiceError {
    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Repository error
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

/// Service owning the daily-vitals entry flow: upsert-by-day persistence plus
/// evaluation of the saved record.
pub struct HealthRecordService<R: HealthRecordRepositoryTrait> {
    repository: R,
    evaluation: EvaluationConfig,
}

impl<R: HealthRecordRepositoryTrait> HealthRecordService<R> {
    /// Create a new health record service
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            evaluation: EvaluationConfig::default(),
        }
    }

    /// Override the evaluator configuration
    pub fn with_evaluation_config(mut self, evaluation: EvaluationConfig) -> Self {
        self.evaluation = evaluation;
        self
    }

    /// Map repository errors to service errors
    fn map_repo_error(&self, err: RepositoryError) -> HealthRecordServiceError {
        match err {
            RepositoryError::Validation(msg) => HealthRecordServiceError::ValidationError(msg),
            _ => HealthRecordServiceError::RepositoryError(err.to_string()),
        }
    }

    /// Save today's vitals, replacing any record already stored for the
    /// current local day, and return the stored record with its evaluation.
    pub async fn save_today(
        &self,
        input: DailyVitalsInput,
    ) -> Result<AnalyzedRecord, HealthRecordServiceError> {
        let now = Local::now();
        let (day_start, day_end) = local_day_bounds(now);

        let record = NewHealthRecord {
            user_id: input.user_id,
            timestamp_millis: now.timestamp_millis(),
            weight_kg: input.weight_kg,
            height_cm: input.height_cm,
            heart_rate_bpm: input.heart_rate_bpm,
            systolic: input.systolic,
            diastolic: input.diastolic,
            sleep_hours: input.sleep_hours,
            analyzed: true,
        };

        let stored = self
            .repository
            .upsert_for_day(record, day_start, day_end)
            .await
            .map_err(|e| self.map_repo_error(e))?;
        debug!(record_id = stored.record_id, user_id = stored.user_id, "saved daily vitals");

        Ok(self.analyze(conversions::convert_to_domain_record(stored)))
    }

    /// The record stored for the current local day, if any
    pub async fn today_record(
        &self,
        user_id: i64,
    ) -> Result<Option<HealthRecord>, HealthRecordServiceError> {
        let (day_start, day_end) = local_day_bounds(Local::now());

        let record = self
            .repository
            .get_by_day(user_id, day_start, day_end)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok(record.map(conversions::convert_to_domain_record))
    }

    /// The most recent record, if any; used for dashboard summaries
    pub async fn latest(
        &self,
        user_id: i64,
    ) -> Result<Option<HealthRecord>, HealthRecordServiceError> {
        let record = self
            .repository
            .get_latest(user_id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok(record.map(conversions::convert_to_domain_record))
    }

    /// Records of the trailing `days`-day window, oldest first; feeds the
    /// trend view
    pub async fn history(
        &self,
        user_id: i64,
        days: u32,
    ) -> Result<Vec<HealthRecord>, HealthRecordServiceError> {
        let now_millis = Local::now().timestamp_millis();
        let start_millis = now_millis - i64::from(days) * 86_400_000;

        let records = self
            .repository
            .get_range(user_id, start_millis, now_millis + 1, SortOrder::Ascending)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok(records
            .into_iter()
            .map(conversions::convert_to_domain_record)
            .collect())
    }

    /// Run the evaluator over a record
    pub fn analyze(&self, record: HealthRecord) -> AnalyzedRecord {
        let verdict = evaluate(&record, &self.evaluation);
        let score = wellness_score(&verdict);
        AnalyzedRecord {
            record,
            verdict,
            score,
        }
    }

    /// Observe committed mutations to the record store
    pub fn subscribe(&self, callback: ChangeCallback) -> Subscription {
        self.repository.subscribe(callback)
    }
}

/// The `[start, end)` epoch-millisecond window of the local calendar day
/// containing `now`
fn local_day_bounds(now: DateTime<Local>) -> (i64, i64) {
    let day_start = now.date_naive().and_time(NaiveTime::MIN);
    let day_end = day_start + Duration::days(1);

    (
        conversions::local_naive_to_millis(day_start),
        conversions::local_naive_to_millis(day_end),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_manage_center_data::repository::InMemoryHealthRecordRepository;

    fn service() -> HealthRecordService<InMemoryHealthRecordRepository> {
        HealthRecordService::new(InMemoryHealthRecordRepository::new())
    }

    fn vitals(user_id: i64, heart_rate: Option<i32>) -> DailyVitalsInput {
        DailyVitalsInput {
            user_id,
            heart_rate_bpm: heart_rate,
            ..DailyVitalsInput::default()
        }
    }

    #[tokio::test]
    async fn test_save_today_twice_replaces_the_day_record() {
        let service = service();

        let first = service.save_today(vitals(1, Some(72))).await.unwrap();
        let second = service.save_today(vitals(1, Some(95))).await.unwrap();

        assert_eq!(first.record.id, second.record.id);
        assert_eq!(second.record.heart_rate_bpm, Some(95));

        let today = service.today_record(1).await.unwrap().unwrap();
        assert_eq!(today.heart_rate_bpm, Some(95));
    }

    #[tokio::test]
    async fn test_save_today_evaluates_the_record() {
        let service = service();

        let analyzed = service.save_today(vitals(1, Some(45))).await.unwrap();
        assert!(analyzed.verdict.is_abnormal);
        assert_eq!(analyzed.score, 85);
        assert!(analyzed.record.analyzed);

        let healthy = service.save_today(vitals(2, Some(72))).await.unwrap();
        assert!(!healthy.verdict.is_abnormal);
        assert_eq!(healthy.score, 100);
    }

    #[tokio::test]
    async fn test_today_record_is_none_before_first_save() {
        let service = service();
        assert!(service.today_record(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_and_history_see_saved_records() {
        let service = service();
        service.save_today(vitals(1, Some(72))).await.unwrap();

        let latest = service.latest(1).await.unwrap().unwrap();
        assert_eq!(latest.heart_rate_bpm, Some(72));

        let history = service.history(1, 7).await.unwrap();
        assert_eq!(history.len(), 1);

        assert!(service.latest(2).await.unwrap().is_none());
    }

    #[test]
    fn test_local_day_bounds_cover_exactly_one_day() {
        let now = Local::now();
        let (start, end) = local_day_bounds(now);

        assert!(start <= now.timestamp_millis());
        assert!(now.timestamp_millis() < end);
        // A calendar day is 24h up to a DST shift of one hour
        let span = end - start;
        assert!((82_800_000..=90_000_000).contains(&span), "span was {}", span);
    }
}
