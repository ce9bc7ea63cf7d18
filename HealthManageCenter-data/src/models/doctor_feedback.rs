use serde::{Deserialize, Serialize};

/// Storage model for a doctor's commentary on one health record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorFeedback {
    /// Unique identifier, assigned by the store on creation
    pub id: i64,

    /// Elder the feedback is addressed to
    pub elder_id: i64,

    /// Record the commentary refers to
    pub health_record_id: i64,

    /// Author of the commentary
    pub doctor_id: i64,

    /// Free-text commentary, never blank
    pub comment: String,

    /// Creation time in epoch milliseconds, immutable
    pub timestamp_millis: i64,

    /// Read flag; transitions false to true only
    pub is_read: bool,

    /// Abnormality verdict copied from the evaluator at creation time
    pub is_abnormal: bool,

    /// Joined abnormality reason tags, when abnormal
    pub abnormal_type: Option<String>,
}

/// Input data for creating a feedback entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDoctorFeedback {
    /// Elder the feedback is addressed to
    pub elder_id: i64,

    /// Record the commentary refers to
    pub health_record_id: i64,

    /// Author of the commentary
    pub doctor_id: i64,

    /// Free-text commentary
    pub comment: String,

    /// Creation time in epoch milliseconds
    pub timestamp_millis: i64,

    /// Abnormality verdict copied from the evaluator
    pub is_abnormal: bool,

    /// Joined abnormality reason tags, when abnormal
    pub abnormal_type: Option<String>,
}
