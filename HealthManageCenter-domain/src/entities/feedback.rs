use serde::{Deserialize, Serialize};
use validator::Validate;

/// A doctor's commentary on one health record
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

    /// Free-text commentary
    pub comment: String,

    /// Creation time in epoch milliseconds, immutable
    pub timestamp_millis: i64,

    /// Read flag; set by the elder, transitions false to true only
    pub is_read: bool,

    /// Abnormality verdict inherited from the evaluator at creation time
    pub is_abnormal: bool,

    /// Joined abnormality reason tags, when abnormal
    pub abnormal_type: Option<String>,
}

/// Input for creating a feedback entry
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct CreateFeedbackRequest {
    /// Elder the feedback is addressed to
    pub elder_id: i64,

    /// Author of the commentary
    pub doctor_id: i64,

    /// Record the commentary refers to; must exist at creation time
    pub health_record_id: i64,

    /// Free-text commentary
    #[validate(length(min = 1, message = "Comment must not be empty"))]
    pub comment: String,
}
