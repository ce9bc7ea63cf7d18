// Domain entities and value objects
pub mod conversions;
pub mod feedback;
pub mod health_record;
pub mod notification;
pub mod reminder;
pub mod user;

// Re-export common types for easier imports
pub use feedback::{CreateFeedbackRequest, DoctorFeedback};
pub use health_record::{AbnormalityVerdict, AnalyzedRecord, DailyVitalsInput, HealthRecord};
pub use notification::{NotificationFeed, NotificationItem, NotificationKind};
pub use reminder::{CreateReminderRequest, MedicationReminder};
pub use user::ElderBrief;
