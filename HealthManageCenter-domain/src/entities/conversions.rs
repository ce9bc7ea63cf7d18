//! Conversion functions between domain entities and data models, plus the
//! local-time helpers shared by the services.

use chrono::{Duration, Local, LocalResult, NaiveDateTime, TimeZone};

use crate::entities::feedback::DoctorFeedback;
use crate::entities::health_record::HealthRecord;
use crate::entities::reminder::MedicationReminder;

/// Convert from data model to domain entity for a health record
pub fn convert_to_domain_record(
    data_record: health_manage_center_data::models::health_record::HealthRecord,
) -> HealthRecord {
    HealthRecord {
        id: data_record.record_id,
        user_id: data_record.user_id,
        timestamp_millis: data_record.timestamp_millis,
        weight_kg: data_record.weight_kg,
        height_cm: data_record.height_cm,
        heart_rate_bpm: data_record.heart_rate_bpm,
        systolic: data_record.systolic,
        diastolic: data_record.diastolic,
        sleep_hours: data_record.sleep_hours,
        analyzed: data_record.analyzed,
    }
}

/// Convert from data model to domain entity for a feedback entry
pub fn convert_to_domain_feedback(
    data_feedback: health_manage_center_data::models::doctor_feedback::DoctorFeedback,
) -> DoctorFeedback {
    DoctorFeedback {
        id: data_feedback.id,
        elder_id: data_feedback.elder_id,
        health_record_id: data_feedback.health_record_id,
        doctor_id: data_feedback.doctor_id,
        comment: data_feedback.comment,
        timestamp_millis: data_feedback.timestamp_millis,
        is_read: data_feedback.is_read,
        is_abnormal: data_feedback.is_abnormal,
        abnormal_type: data_feedback.abnormal_type,
    }
}

/// Convert from data model to domain entity for a reminder definition
pub fn convert_to_domain_reminder(
    data_reminder: health_manage_center_data::models::medication_reminder::MedicationReminder,
) -> MedicationReminder {
    MedicationReminder {
        id: data_reminder.reminder_id,
        name: data_reminder.name,
        instructions: data_reminder.instructions,
        time_list: data_reminder.time_list,
    }
}

/// Convert from domain entity to data model for a reminder definition
pub fn convert_to_data_reminder(
    domain_reminder: &MedicationReminder,
) -> health_manage_center_data::models::medication_reminder::MedicationReminder {
    health_manage_center_data::models::medication_reminder::MedicationReminder {
        reminder_id: domain_reminder.id,
        name: domain_reminder.name.clone(),
        instructions: domain_reminder.instructions.clone(),
        time_list: domain_reminder.time_list.clone(),
    }
}

/// Format an epoch-millisecond timestamp as a local "YYYY-MM-DD HH:MM" string
pub fn format_timestamp_millis(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis) {
        LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        _ => millis.to_string(),
    }
}

/// Resolve a local wall-clock instant to epoch milliseconds.
///
/// Ambiguous instants (clocks rolled back) take the earlier mapping; instants
/// inside a spring-forward gap resolve to the following hour.
pub fn local_naive_to_millis(naive: NaiveDateTime) -> i64 {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.timestamp_millis(),
        LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            match Local.from_local_datetime(&shifted) {
                LocalResult::Single(dt) => dt.timestamp_millis(),
                LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
                // Interpreting as UTC is the last resort for exotic offsets
                LocalResult::None => naive.and_utc().timestamp_millis(),
            }
        }
    }
}
