use thiserror::Error;

use crate::entities::conversions;
use crate::entities::user::ElderBrief;
use crate::services::evaluation::{evaluate, EvaluationConfig};
use health_manage_center_data::repository::{
    HealthRecordRepositoryTrait, RepositoryError, UserRepositoryTrait,
};

/// Marker shown when an elder has no records yet
pub const NO_RECORDS: &str = "No records yet";

/// Marker shown when no health status can be derived
pub const NO_DATA: &str = "No data";

/// Status shown for an unremarkable latest record
pub const STATUS_NORMAL: &str = "Normal";

/// Dashboard service errors
#[derive(Debug, Error)]
pub enum DashboardServiceError {
    /// Repository error
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<RepositoryError> for DashboardServiceError {
    fn from(err: RepositoryError) -> Self {
        DashboardServiceError::RepositoryError(err.to_string())
    }
}

/// Doctor-facing overview of assigned elders and their latest evaluation.
pub struct DoctorDashboardService<U, H>
where
    U: UserRepositoryTrait,
    H: HealthRecordRepositoryTrait,
{
    users: U,
    records: H,
    evaluation: EvaluationConfig,
}

impl<U, H> DoctorDashboardService<U, H>
where
    U: UserRepositoryTrait,
    H: HealthRecordRepositoryTrait,
{
    /// Create a new dashboard service
    pub fn new(users: U, records: H) -> Self {
        Self {
            users,
            records,
            evaluation: EvaluationConfig::default(),
        }
    }

    /// Override the evaluator configuration
    pub fn with_evaluation_config(mut self, evaluation: EvaluationConfig) -> Self {
        self.evaluation = evaluation;
        self
    }

    /// One brief per elder assigned to the doctor: latest record time plus a
    /// health-status string derived from the evaluator.
    pub async fn elder_overview(
        &self,
        doctor_id: i64,
    ) -> Result<Vec<ElderBrief>, DashboardServiceError> {
        let elders = self.users.get_elders_by_doctor(doctor_id).await?;

        let mut briefs = Vec::with_capacity(elders.len());
        for elder in elders {
            let latest = self.records.get_latest(elder.user_id).await?;

            let (last_record_time, health_status) = match latest {
                Some(record) => {
                    let formatted =
                        conversions::format_timestamp_millis(record.timestamp_millis);
                    let verdict = evaluate(
                        &conversions::convert_to_domain_record(record),
                        &self.evaluation,
                    );
                    let status = verdict
                        .abnormal_type()
                        .unwrap_or_else(|| STATUS_NORMAL.to_string());
                    (formatted, status)
                }
                None => (NO_RECORDS.to_string(), NO_DATA.to_string()),
            };

            briefs.push(ElderBrief {
                user_id: elder.user_id,
                name: elder.name,
                phone: elder.phone,
                last_record_time,
                health_status,
            });
        }

        Ok(briefs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_manage_center_data::models::health_record::NewHealthRecord;
    use health_manage_center_data::models::user::{NewUser, UserRole};
    use health_manage_center_data::repository::{
        InMemoryHealthRecordRepository, InMemoryUserRepository,
    };

    const DAY: i64 = 86_400_000;

    fn new_user(name: &str, role: UserRole, doctor_id: Option<i64>) -> NewUser {
        NewUser {
            name: name.to_string(),
            phone: "555-0100".to_string(),
            role,
            password: "secret".to_string(),
            email: String::new(),
            date_of_birth_millis: 0,
            gender: "female".to_string(),
            doctor_id,
        }
    }

    #[tokio::test]
    async fn test_elder_overview_reports_status_per_elder() {
        let users = InMemoryUserRepository::new();
        let records = InMemoryHealthRecordRepository::new();
        let service = DoctorDashboardService::new(users.clone(), records.clone());

        let doctor = users
            .insert(new_user("Chen", UserRole::Doctor, None))
            .await
            .unwrap();
        let abnormal_elder = users
            .insert(new_user("Wang", UserRole::Elder, Some(doctor.user_id)))
            .await
            .unwrap();
        users
            .insert(new_user("Li", UserRole::Elder, Some(doctor.user_id)))
            .await
            .unwrap();

        records
            .upsert_for_day(
                NewHealthRecord {
                    user_id: abnormal_elder.user_id,
                    timestamp_millis: 1_000,
                    weight_kg: None,
                    height_cm: None,
                    heart_rate_bpm: Some(130),
                    systolic: None,
                    diastolic: None,
                    sleep_hours: None,
                    analyzed: true,
                },
                0,
                DAY,
            )
            .await
            .unwrap();

        let briefs = service.elder_overview(doctor.user_id).await.unwrap();
        assert_eq!(briefs.len(), 2);

        let wang = briefs.iter().find(|b| b.name == "Wang").unwrap();
        assert_eq!(wang.health_status, "Abnormal Heart Rate");
        assert_ne!(wang.last_record_time, NO_RECORDS);

        let li = briefs.iter().find(|b| b.name == "Li").unwrap();
        assert_eq!(li.health_status, NO_DATA);
        assert_eq!(li.last_record_time, NO_RECORDS);
    }

    #[tokio::test]
    async fn test_elder_overview_normal_status() {
        let users = InMemoryUserRepository::new();
        let records = InMemoryHealthRecordRepository::new();
        let service = DoctorDashboardService::new(users.clone(), records.clone());

        let doctor = users
            .insert(new_user("Chen", UserRole::Doctor, None))
            .await
            .unwrap();
        let elder = users
            .insert(new_user("Zhao", UserRole::Elder, Some(doctor.user_id)))
            .await
            .unwrap();

        records
            .upsert_for_day(
                NewHealthRecord {
                    user_id: elder.user_id,
                    timestamp_millis: 1_000,
                    weight_kg: Some(60.0),
                    height_cm: Some(165.0),
                    heart_rate_bpm: Some(72),
                    systolic: Some(120),
                    diastolic: Some(80),
                    sleep_hours: Some(8.0),
                    analyzed: true,
                },
                0,
                DAY,
            )
            .await
            .unwrap();

        let briefs = service.elder_overview(doctor.user_id).await.unwrap();
        assert_eq!(briefs[0].health_status, STATUS_NORMAL);
    }

    #[tokio::test]
    async fn test_overview_is_empty_for_doctor_without_elders() {
        let users = InMemoryUserRepository::new();
        let records = InMemoryHealthRecordRepository::new();
        let service = DoctorDashboardService::new(users, records);

        assert!(service.elder_overview(42).await.unwrap().is_empty());
    }
}
