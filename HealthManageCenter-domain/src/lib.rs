// HealthManageCenter Domain
// This crate contains the business logic for the HealthManageCenter
// application: vital-sign evaluation, the doctor-feedback workflow,
// medication reminder scheduling and the notification feed

// Services that implement business logic
pub mod services;

// Domain entities
pub mod entities;

// Re-export the database module from the data layer for convenience
pub use health_manage_center_data::database;

// Testing utilities - available in tests and with the mock feature
#[cfg(any(test, feature = "mock"))]
pub mod testing;
