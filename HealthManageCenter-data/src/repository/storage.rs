//! Row-mapping helpers shared by the SQLite repositories.

use rusqlite::Row;

use crate::models::doctor_feedback::DoctorFeedback;
use crate::models::health_record::HealthRecord;
use crate::models::medication_reminder::MedicationReminder;
use crate::models::user::{User, UserRole};

/// Column list matching [`health_record_from_row`]
pub(super) const HEALTH_RECORD_COLUMNS: &str =
    "record_id, user_id, timestamp, weight, height, heart_rate, systolic, diastolic, sleep_hours, analyzed";

pub(super) fn health_record_from_row(row: &Row<'_>) -> rusqlite::Result<HealthRecord> {
    Ok(HealthRecord {
        record_id: row.get(0)?,
        user_id: row.get(1)?,
        timestamp_millis: row.get(2)?,
        weight_kg: row.get(3)?,
        height_cm: row.get(4)?,
        heart_rate_bpm: row.get(5)?,
        systolic: row.get(6)?,
        diastolic: row.get(7)?,
        sleep_hours: row.get(8)?,
        analyzed: row.get::<_, i64>(9)? != 0,
    })
}

/// Column list matching [`feedback_from_row`]
pub(super) const FEEDBACK_COLUMNS: &str =
    "id, elder_id, health_record_id, doctor_id, comment, timestamp, is_read, is_abnormal, abnormal_type";

pub(super) fn feedback_from_row(row: &Row<'_>) -> rusqlite::Result<DoctorFeedback> {
    Ok(DoctorFeedback {
        id: row.get(0)?,
        elder_id: row.get(1)?,
        health_record_id: row.get(2)?,
        doctor_id: row.get(3)?,
        comment: row.get(4)?,
        timestamp_millis: row.get(5)?,
        is_read: row.get::<_, i64>(6)? != 0,
        is_abnormal: row.get::<_, i64>(7)? != 0,
        abnormal_type: row.get(8)?,
    })
}

/// Column list matching [`reminder_from_row`]
pub(super) const REMINDER_COLUMNS: &str = "reminder_id, name, instructions, time_list";

/// The `time_list` column holds JSON text; deserialization errors surface as
/// a rusqlite conversion failure at the column index.
pub(super) fn reminder_from_row(row: &Row<'_>) -> rusqlite::Result<MedicationReminder> {
    let raw: String = row.get(3)?;
    let time_list: Vec<String> = serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })?;

    Ok(MedicationReminder {
        reminder_id: row.get(0)?,
        name: row.get(1)?,
        instructions: row.get(2)?,
        time_list,
    })
}

/// Column list matching [`user_from_row`]
pub(super) const USER_COLUMNS: &str =
    "user_id, name, phone, role, password, email, date_of_birth, gender, doctor_id";

pub(super) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role_raw: String = row.get(3)?;
    let role = UserRole::parse(&role_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown role: {}", role_raw).into(),
        )
    })?;

    Ok(User {
        user_id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        role,
        password: row.get(4)?,
        email: row.get(5)?,
        date_of_birth_millis: row.get(6)?,
        gender: row.get(7)?,
        doctor_id: row.get(8)?,
    })
}
