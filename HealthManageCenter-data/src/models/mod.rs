// Data storage models
pub mod doctor_feedback;
pub mod health_record;
pub mod medication_reminder;
pub mod user;
