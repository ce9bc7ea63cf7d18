use serde::{Deserialize, Serialize};

/// Storage model for one medication schedule definition.
///
/// `time_list` is an ordered, deduplicated list of "HH:mm" strings; each entry
/// stands for one daily recurrence. The store persists the list as JSON text
/// and must round-trip the exact strings (no reformatting).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationReminder {
    /// Unique identifier, assigned by the store on creation
    pub reminder_id: i64,

    /// Medication name, never blank
    pub name: String,

    /// Intake instructions shown with every firing
    pub instructions: String,

    /// Ordered "HH:mm" entries, one daily alarm each
    pub time_list: Vec<String>,
}

/// Input data for creating a reminder definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedicationReminder {
    /// Medication name
    pub name: String,

    /// Intake instructions
    pub instructions: String,

    /// Ordered "HH:mm" entries
    pub time_list: Vec<String>,
}
