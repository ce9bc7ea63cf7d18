use serde::{Deserialize, Serialize};

/// Role of an account in the system
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Clinician reviewing elder records and writing feedback
    Doctor,
    /// Patient logging vitals and receiving feedback and reminders
    Elder,
}

impl UserRole {
    /// Stable string form used in the `users.role` column
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Doctor => "doctor",
            UserRole::Elder => "elder",
        }
    }

    /// Parse the stored string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "doctor" => Some(UserRole::Doctor),
            "elder" => Some(UserRole::Elder),
            _ => None,
        }
    }
}

/// Storage model for one account in the user roster.
///
/// Credential checking is out of scope for this crate; the password field is
/// carried only because the schema owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier, assigned by the store on creation
    pub user_id: i64,

    /// Display name
    pub name: String,

    /// Contact phone number
    pub phone: String,

    /// Account role
    pub role: UserRole,

    /// Stored credential, opaque to this crate
    pub password: String,

    /// Contact email
    pub email: String,

    /// Date of birth in epoch milliseconds
    pub date_of_birth_millis: i64,

    /// Self-reported gender
    pub gender: String,

    /// Assigned doctor, for elders only
    pub doctor_id: Option<i64>,
}

/// Input data for creating an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Display name
    pub name: String,

    /// Contact phone number
    pub phone: String,

    /// Account role
    pub role: UserRole,

    /// Stored credential, opaque to this crate
    pub password: String,

    /// Contact email
    pub email: String,

    /// Date of birth in epoch milliseconds
    pub date_of_birth_millis: i64,

    /// Self-reported gender
    pub gender: String,

    /// Assigned doctor, for elders only
    pub doctor_id: Option<i64>,
}
