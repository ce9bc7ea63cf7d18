use serde::{Deserialize, Serialize};

/// Doctor-facing summary of one assigned elder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElderBrief {
    /// The elder's user id
    pub user_id: i64,

    /// Display name
    pub name: String,

    /// Contact phone number
    pub phone: String,

    /// Formatted time of the latest record, or a no-records marker
    pub last_record_time: String,

    /// Evaluation of the latest record: joined abnormal tags, "Normal",
    /// or a no-data marker
    pub health_status: String,
}
