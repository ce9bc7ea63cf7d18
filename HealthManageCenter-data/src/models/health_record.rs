use serde::{Deserialize, Serialize};

/// Storage model for one day's vital-sign record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Unique identifier, assigned by the store on creation
    pub record_id: i64,

    /// Owner of the record
    pub user_id: i64,

    /// Epoch milliseconds at which the record was last saved
    pub timestamp_millis: i64,

    /// Body weight in kilograms
    pub weight_kg: Option<f32>,

    /// Height in centimeters
    pub height_cm: Option<f32>,

    /// Heart rate in beats per minute
    pub heart_rate_bpm: Option<i32>,

    /// Systolic blood pressure (the higher number)
    pub systolic: Option<i32>,

    /// Diastolic blood pressure (the lower number)
    pub diastolic: Option<i32>,

    /// Hours slept the preceding night
    pub sleep_hours: Option<f32>,

    /// Whether the record has been run through the evaluator
    pub analyzed: bool,
}

/// Input data for creating or replacing a day's record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHealthRecord {
    /// Owner of the record
    pub user_id: i64,

    /// Epoch milliseconds of the save
    pub timestamp_millis: i64,

    /// Body weight in kilograms
    pub weight_kg: Option<f32>,

    /// Height in centimeters
    pub height_cm: Option<f32>,

    /// Heart rate in beats per minute
    pub heart_rate_bpm: Option<i32>,

    /// Systolic blood pressure
    pub systolic: Option<i32>,

    /// Diastolic blood pressure
    pub diastolic: Option<i32>,

    /// Hours slept the preceding night
    pub sleep_hours: Option<f32>,

    /// Whether the record has been run through the evaluator
    pub analyzed: bool,
}
