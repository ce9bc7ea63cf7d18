//! Medication reminder scheduling.
//!
//! Each "HH:mm" entry of a reminder is an independent daily recurring timer.
//! Nothing about past firings is persisted: every add or update recomputes
//! each entry's next occurrence from wall-clock now and registers a
//! wake-capable alarm with the platform collaborator.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use validator::Validate;

use crate::entities::conversions;
use crate::entities::reminder::{CreateReminderRequest, MedicationReminder};
use health_manage_center_data::models::medication_reminder::NewMedicationReminder;
use health_manage_center_data::repository::{
    MedicationReminderRepositoryTrait, RepositoryError,
};
use health_manage_center_data::subscription::{ChangeCallback, Subscription};

/// Time-of-day format used by reminder entries
pub const TIME_FORMAT: &str = "%H:%M";

/// Errors reported by the alarm-scheduling collaborator
#[derive(Debug, Error)]
pub enum SchedulingError {
    /// Registering the alarm with the platform failed
    #[error("Alarm registration failed: {0}")]
    Registration(String),

    /// Cancelling a previously registered alarm failed
    #[error("Alarm cancellation failed: {0}")]
    Cancellation(String),
}

/// Reminder service errors
#[derive(Debug, Error)]
pub enum ReminderServiceError {
    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The reminder does not exist
    #[error("Reminder not found: {0}")]
    NotFound(i64),

    /// Repository error
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// Alarm scheduling error; the reminder row itself was persisted
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
}

/// Stable identity of one scheduled alarm, derived from the reminder id and
/// the exact time string. Recomputing the key always matches the previously
/// registered alarm, so no handle table is needed for cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlarmKey {
    reminder_id: i64,
    time: String,
}

impl AlarmKey {
    /// Derive the key for one (reminder, time entry) pair
    pub fn new(reminder_id: i64, time: &str) -> Self {
        Self {
            reminder_id,
            time: time.to_string(),
        }
    }

    /// The owning reminder id
    pub fn reminder_id(&self) -> i64 {
        self.reminder_id
    }

    /// The "HH:mm" entry this alarm belongs to
    pub fn time(&self) -> &str {
        &self.time
    }
}

/// Denormalized payload carried by every alarm. Rendering "take {name} at
/// {time}: {instructions}" needs no further lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmPayload {
    /// Owning reminder id
    pub reminder_id: i64,

    /// Medication name
    pub medication_name: String,

    /// Intake instructions
    pub instructions: String,

    /// The "HH:mm" entry that produced this alarm
    pub time: String,
}

/// Platform collaborator that fires a callback at an instant.
///
/// Delivery is at-least-once while the device is powered on; the renderer
/// must tolerate duplicates.
#[async_trait]
pub trait AlarmScheduler: Send + Sync {
    /// Whether the platform currently grants the wake-alarm capability
    fn can_schedule(&self) -> bool;

    /// Register a one-shot wake-capable alarm
    async fn register(
        &self,
        key: AlarmKey,
        fire_at_millis: i64,
        payload: AlarmPayload,
    ) -> Result<(), SchedulingError>;

    /// Cancel a previously registered alarm; unknown keys are a no-op
    async fn cancel(&self, key: AlarmKey) -> Result<(), SchedulingError>;
}

#[async_trait]
impl<T: AlarmScheduler + ?Sized> AlarmScheduler for std::sync::Arc<T> {
    fn can_schedule(&self) -> bool {
        (**self).can_schedule()
    }

    async fn register(
        &self,
        key: AlarmKey,
        fire_at_millis: i64,
        payload: AlarmPayload,
    ) -> Result<(), SchedulingError> {
        (**self).register(key, fire_at_millis, payload).await
    }

    async fn cancel(&self, key: AlarmKey) -> Result<(), SchedulingError> {
        (**self).cancel(key).await
    }
}

/// Whether alarms were registered for a persisted reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingStatus {
    /// Every time entry has a registered alarm
    Scheduled,
    /// The platform denied the capability; the row was persisted but no
    /// alarms exist
    Degraded,
}

/// A persisted reminder together with its scheduling outcome
#[derive(Debug, Clone)]
pub struct SavedReminder {
    /// The persisted definition
    pub reminder: MedicationReminder,

    /// Whether alarms were registered
    pub scheduling: SchedulingStatus,
}

/// Next occurrence of a time-of-day: today at `time` if that moment is still
/// ahead of `now`, otherwise tomorrow at `time`
pub fn next_occurrence(time: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(time);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Service owning the reminder lifecycle: validated persistence plus the
/// cancel-then-reschedule alarm choreography.
pub struct ReminderService<R, S>
where
    R: MedicationReminderRepositoryTrait,
    S: AlarmScheduler,
{
    repository: R,
    scheduler: S,
}

impl<R, S> ReminderService<R, S>
where
    R: MedicationReminderRepositoryTrait,
    S: AlarmScheduler,
{
    /// Create a new reminder service
    pub fn new(repository: R, scheduler: S) -> Self {
        Self {
            repository,
            scheduler,
        }
    }

    /// Map repository errors to service errors
    fn map_repo_error(&self, err: RepositoryError) -> ReminderServiceError {
        match err {
            RepositoryError::Validation(msg) => ReminderServiceError::ValidationError(msg),
            RepositoryError::NotFound(msg) => {
                ReminderServiceError::RepositoryError(format!("not found: {}", msg))
            }
            _ => ReminderServiceError::RepositoryError(err.to_string()),
        }
    }

    /// Persist a new reminder and register one daily alarm per time entry.
    ///
    /// When the platform denies the wake-alarm capability the row is still
    /// persisted and the outcome is reported as degraded.
    pub async fn add_reminder(
        &self,
        request: CreateReminderRequest,
    ) -> Result<SavedReminder, ReminderServiceError> {
        if let Err(validation_errors) = request.validate() {
            return Err(ReminderServiceError::ValidationError(
                validation_errors.to_string(),
            ));
        }
        let time_list =
            validate_reminder_fields(&request.name, &request.instructions, &request.time_list)?;

        let stored = self
            .repository
            .insert(NewMedicationReminder {
                name: request.name,
                instructions: request.instructions,
                time_list,
            })
            .await
            .map_err(|e| self.map_repo_error(e))?;
        debug!(reminder_id = stored.reminder_id, "added medication reminder");

        let scheduling = self
            .schedule_alarms(
                stored.reminder_id,
                &stored.name,
                &stored.instructions,
                &stored.time_list,
            )
            .await?;

        Ok(SavedReminder {
            reminder: conversions::convert_to_domain_reminder(stored),
            scheduling,
        })
    }

    /// Replace a reminder definition and its alarms.
    ///
    /// Alarms for the *stored* time list are cancelled before anything is
    /// registered for the new list, so a stale alarm can never fire with old
    /// content.
    pub async fn update_reminder(
        &self,
        reminder: MedicationReminder,
    ) -> Result<SavedReminder, ReminderServiceError> {
        let time_list =
            validate_reminder_fields(&reminder.name, &reminder.instructions, &reminder.time_list)?;

        let previous = self
            .repository
            .get_by_id(reminder.id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or(ReminderServiceError::NotFound(reminder.id))?;

        self.cancel_alarms(previous.reminder_id, &previous.time_list)
            .await?;

        let updated = MedicationReminder {
            time_list,
            ..reminder
        };
        let data_reminder = conversions::convert_to_data_reminder(&updated);
        self.repository
            .update(&data_reminder)
            .await
            .map_err(|e| self.map_repo_error(e))?;
        debug!(reminder_id = updated.id, "updated medication reminder");

        let scheduling = self
            .schedule_alarms(
                updated.id,
                &updated.name,
                &updated.instructions,
                &updated.time_list,
            )
            .await?;

        Ok(SavedReminder {
            reminder: updated,
            scheduling,
        })
    }

    /// Cancel a reminder's alarms (using the stored time list) and remove the
    /// row. Unknown ids are a no-op.
    pub async fn delete_reminder(&self, reminder_id: i64) -> Result<(), ReminderServiceError> {
        let stored = self
            .repository
            .get_by_id(reminder_id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        let Some(stored) = stored else {
            return Ok(());
        };

        self.cancel_alarms(stored.reminder_id, &stored.time_list)
            .await?;
        self.repository
            .delete(stored.reminder_id)
            .await
            .map_err(|e| self.map_repo_error(e))?;
        debug!(reminder_id, "deleted medication reminder");

        Ok(())
    }

    /// Point lookup of a reminder definition
    pub async fn get_reminder(
        &self,
        reminder_id: i64,
    ) -> Result<Option<MedicationReminder>, ReminderServiceError> {
        let stored = self
            .repository
            .get_by_id(reminder_id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok(stored.map(conversions::convert_to_domain_reminder))
    }

    /// All reminder definitions
    pub async fn list_reminders(&self) -> Result<Vec<MedicationReminder>, ReminderServiceError> {
        let stored = self
            .repository
            .list_all()
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok(stored
            .into_iter()
            .map(conversions::convert_to_domain_reminder)
            .collect())
    }

    /// Observe committed mutations to the reminder store
    pub fn subscribe(&self, callback: ChangeCallback) -> Subscription {
        self.repository.subscribe(callback)
    }

    async fn schedule_alarms(
        &self,
        reminder_id: i64,
        name: &str,
        instructions: &str,
        time_list: &[String],
    ) -> Result<SchedulingStatus, ReminderServiceError> {
        if !self.scheduler.can_schedule() {
            warn!(
                reminder_id,
                "wake-alarm capability unavailable, reminder persisted without alarms"
            );
            return Ok(SchedulingStatus::Degraded);
        }

        let now = Local::now().naive_local();
        for time_str in time_list {
            let time = parse_time_entry(time_str)?;
            let fire_at = conversions::local_naive_to_millis(next_occurrence(time, now));

            let payload = AlarmPayload {
                reminder_id,
                medication_name: name.to_string(),
                instructions: instructions.to_string(),
                time: time_str.clone(),
            };

            // A registration failure is surfaced once; no silent retry loop
            self.scheduler
                .register(AlarmKey::new(reminder_id, time_str), fire_at, payload)
                .await?;
            debug!(reminder_id, time = %time_str, fire_at, "registered reminder alarm");
        }

        Ok(SchedulingStatus::Scheduled)
    }

    async fn cancel_alarms(
        &self,
        reminder_id: i64,
        time_list: &[String],
    ) -> Result<(), ReminderServiceError> {
        for time_str in time_list {
            self.scheduler
                .cancel(AlarmKey::new(reminder_id, time_str))
                .await?;
            debug!(reminder_id, time = %time_str, "cancelled reminder alarm");
        }
        Ok(())
    }
}

/// Check name, instructions and time entries; returns the deduplicated time
/// list with order and exact strings preserved
fn validate_reminder_fields(
    name: &str,
    instructions: &str,
    time_list: &[String],
) -> Result<Vec<String>, ReminderServiceError> {
    if name.trim().is_empty() {
        return Err(ReminderServiceError::ValidationError(
            "Medication name must not be empty".to_string(),
        ));
    }
    if instructions.trim().is_empty() {
        return Err(ReminderServiceError::ValidationError(
            "Instructions must not be empty".to_string(),
        ));
    }
    if time_list.is_empty() {
        return Err(ReminderServiceError::ValidationError(
            "At least one reminder time is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut deduplicated = Vec::with_capacity(time_list.len());
    for entry in time_list {
        parse_time_entry(entry)?;
        if seen.insert(entry.clone()) {
            deduplicated.push(entry.clone());
        }
    }

    Ok(deduplicated)
}

fn parse_time_entry(entry: &str) -> Result<NaiveTime, ReminderServiceError> {
    NaiveTime::parse_from_str(entry, TIME_FORMAT).map_err(|_| {
        ReminderServiceError::ValidationError(format!(
            "Invalid time entry '{}', expected HH:mm",
            entry
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn on(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_time(at(hour, minute))
    }

    #[test]
    fn test_next_occurrence_later_today() {
        // Added at 09:00: the 20:00 entry fires today
        assert_eq!(next_occurrence(at(20, 0), on(1, 9, 0)), on(1, 20, 0));
    }

    #[test]
    fn test_next_occurrence_already_passed_rolls_to_tomorrow() {
        // Added at 09:00: the 08:00 entry fires tomorrow
        assert_eq!(next_occurrence(at(8, 0), on(1, 9, 0)), on(2, 8, 0));
    }

    #[test]
    fn test_next_occurrence_at_the_exact_minute_rolls_over() {
        // "Still in the future" is strict: now itself is not schedulable
        assert_eq!(next_occurrence(at(9, 0), on(1, 9, 0)), on(2, 9, 0));
    }

    #[test]
    fn test_validate_rejects_blank_fields_and_empty_list() {
        let times = vec!["08:00".to_string()];

        assert!(validate_reminder_fields(" ", "after meal", &times).is_err());
        assert!(validate_reminder_fields("Aspirin", "", &times).is_err());
        assert!(validate_reminder_fields("Aspirin", "after meal", &[]).is_err());
    }

    #[test]
    fn test_validate_rejects_malformed_time_entries() {
        for bad in ["8am", "25:00", "08:60", "0800", ""] {
            let result = validate_reminder_fields(
                "Aspirin",
                "after meal",
                &[bad.to_string()],
            );
            assert!(result.is_err(), "'{}' should be rejected", bad);
        }
    }

    #[test]
    fn test_validate_deduplicates_preserving_order_and_strings() {
        let times = vec![
            "20:00".to_string(),
            "08:00".to_string(),
            "20:00".to_string(),
        ];
        let deduplicated =
            validate_reminder_fields("Aspirin", "after meal", &times).unwrap();
        assert_eq!(deduplicated, vec!["20:00", "08:00"]);
    }

    #[test]
    fn test_alarm_key_is_stable_and_value_equal() {
        assert_eq!(AlarmKey::new(7, "08:00"), AlarmKey::new(7, "08:00"));
        assert_ne!(AlarmKey::new(7, "08:00"), AlarmKey::new(7, "09:00"));
        assert_ne!(AlarmKey::new(7, "08:00"), AlarmKey::new(8, "08:00"));
    }
}
