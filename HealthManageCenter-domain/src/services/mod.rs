// Domain services
// This module contains business logic implementations.

pub mod dashboard;
pub mod evaluation;
pub mod feedback;
pub mod health_record;
pub mod notifications;
pub mod reminder;


// Re-export service types
pub use dashboard::DoctorDashboardService;
pub use evaluation::{evaluate, wellness_score, EvaluationConfig};
pub use feedback::FeedbackService;
pub use health_record::HealthRecordService;
pub use notifications::NotificationService;
pub use reminder::{AlarmKey, AlarmPayload, AlarmScheduler, ReminderService, SchedulingStatus};
