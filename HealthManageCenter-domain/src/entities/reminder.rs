use serde::{Deserialize, Serialize};
use validator::Validate;

/// One medication schedule definition.
///
/// Each entry of `time_list` is an "HH:mm" string standing for one recurring
/// daily alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationReminder {
    /// Unique identifier, assigned by the store on creation
    pub id: i64,

    /// Medication name
    pub name: String,

    /// Intake instructions shown with every firing
    pub instructions: String,

    /// Ordered, deduplicated "HH:mm" entries
    pub time_list: Vec<String>,
}

/// Input for creating a reminder definition
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct CreateReminderRequest {
    /// Medication name
    #[validate(length(min = 1, message = "Medication name must not be empty"))]
    pub name: String,

    /// Intake instructions
    #[validate(length(min = 1, message = "Instructions must not be empty"))]
    pub instructions: String,

    /// "HH:mm" entries, one daily alarm each
    #[validate(length(min = 1, message = "At least one reminder time is required"))]
    pub time_list: Vec<String>,
}
