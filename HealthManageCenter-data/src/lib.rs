// HealthManageCenter Data
// This crate handles persistence for health records, doctor feedback,
// medication reminders and the user roster

// Database connection management
pub mod database;

// Repository implementations for data access
pub mod repository;

// Data storage models
pub mod models;

// Change notification for live queries
pub mod subscription;
