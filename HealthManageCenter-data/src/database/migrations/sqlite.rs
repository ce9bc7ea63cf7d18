use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_users_table(conn)?;
    create_health_records_table(conn)?;
    create_doctor_feedback_table(conn)?;
    create_medication_reminders_table(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the user roster table
fn create_users_table(conn: &Connection) -> Result<(), String> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            role TEXT NOT NULL,
            password TEXT NOT NULL,
            email TEXT NOT NULL DEFAULT '',
            date_of_birth INTEGER NOT NULL DEFAULT 0,
            gender TEXT NOT NULL DEFAULT 'male',
            doctor_id INTEGER REFERENCES users (user_id)
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the daily vitals table, one row per (user, calendar day)
fn create_health_records_table(conn: &Connection) -> Result<(), String> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS health_records (
            record_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users (user_id),
            timestamp INTEGER NOT NULL,
            weight REAL,
            height REAL,
            heart_rate INTEGER,
            systolic INTEGER,
            diastolic INTEGER,
            sleep_hours REAL,
            analyzed INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    // Day-bounded lookups and range queries both filter on (user, time)
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_health_records_user_time
         ON health_records (user_id, timestamp)",
        [],
    )
    .map_err(|e| format!("Failed to create index: {}", e))?;

    Ok(())
}

/// Create the doctor feedback table
fn create_doctor_feedback_table(conn: &Connection) -> Result<(), String> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS doctor_feedback (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            elder_id INTEGER NOT NULL REFERENCES users (user_id),
            health_record_id INTEGER NOT NULL REFERENCES health_records (record_id),
            doctor_id INTEGER NOT NULL REFERENCES users (user_id),
            comment TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            is_read INTEGER NOT NULL DEFAULT 0,
            is_abnormal INTEGER NOT NULL DEFAULT 0,
            abnormal_type TEXT
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_doctor_feedback_elder
         ON doctor_feedback (elder_id, timestamp DESC)",
        [],
    )
    .map_err(|e| format!("Failed to create index: {}", e))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_doctor_feedback_doctor
         ON doctor_feedback (doctor_id, timestamp DESC)",
        [],
    )
    .map_err(|e| format!("Failed to create index: {}", e))?;

    Ok(())
}

/// Create the medication reminders table.
/// `time_list` holds the ordered "HH:mm" entries serialized as JSON text.
fn create_medication_reminders_table(conn: &Connection) -> Result<(), String> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS medication_reminders (
            reminder_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            instructions TEXT NOT NULL,
            time_list TEXT NOT NULL
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    Ok(())
}
