//! Database connection management for the HealthManageCenter application
//!
//! The [`Database`] handle wraps an SQLite connection pool. It is constructed
//! explicitly by the caller and injected into each repository; there is no
//! process-wide singleton pool.

use std::path::Path;
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use super::migrations;
use super::DatabaseError;

/// Injectable handle to the application database.
///
/// Cloning is cheap; clones share the same underlying pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl Database {
    /// Open (or create) the database file at `path` and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let manager = SqliteConnectionManager::file(path.as_ref());
        let pool = Pool::builder()
            .build(manager)
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        let db = Self { pool: Arc::new(pool) };
        db.apply_migrations()?;

        info!(path = %path.as_ref().display(), "opened health database");
        Ok(db)
    }

    /// Open a transient in-memory database.
    ///
    /// The pool is capped at a single connection: every SQLite `:memory:`
    /// connection is its own database, so one shared connection keeps all
    /// callers on the same store.
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        let db = Self { pool: Arc::new(pool) };
        db.apply_migrations()?;

        info!("opened in-memory health database");
        Ok(db)
    }

    /// Check out a pooled connection.
    pub fn connection(
        &self,
    ) -> Result<PooledConnection<SqliteConnectionManager>, DatabaseError> {
        self.pool
            .get()
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))
    }

    fn apply_migrations(&self) -> Result<(), DatabaseError> {
        let conn = self.connection()?;
        migrations::run_sqlite_migrations(&conn)
            .map_err(DatabaseError::MigrationError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Initialize tracing once for all tests
    static INIT: std::sync::Once = std::sync::Once::new();
    fn initialize() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter("info")
                .with_test_writer()
                .try_init();
        });
    }

    #[test]
    fn test_in_memory_database_opens_and_migrates() {
        initialize();

        let db = Database::in_memory().unwrap();
        let conn = db.connection().unwrap();

        // All four tables must exist after migration
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('users', 'health_records', 'doctor_feedback', 'medication_reminders')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 4);
    }

    #[test]
    fn test_open_creates_database_file() {
        initialize();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("health.db");

        let db = Database::open(&path).unwrap();
        drop(db);

        assert!(path.exists());

        // Re-opening an existing file must succeed (migrations are idempotent)
        Database::open(&path).unwrap();
    }
}
