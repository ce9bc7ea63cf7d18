use async_trait::async_trait;
use tracing::debug;

use super::errors::RepositoryError;
use super::storage;
use crate::database::Database;
use crate::models::medication_reminder::{MedicationReminder, NewMedicationReminder};
use crate::subscription::{ChangeCallback, ChangeEvent, ChangeHub, Subscription};

/// Repository trait for medication reminder definitions
#[async_trait]
pub trait MedicationReminderRepositoryTrait: Send + Sync {
    /// Persist a new reminder and return it with its assigned id
    async fn insert(
        &self,
        reminder: NewMedicationReminder,
    ) -> Result<MedicationReminder, RepositoryError>;

    /// Replace name, instructions and time list of an existing reminder
    async fn update(&self, reminder: &MedicationReminder) -> Result<(), RepositoryError>;

    /// Remove a reminder definition
    async fn delete(&self, reminder_id: i64) -> Result<(), RepositoryError>;

    /// Point lookup; `None` when the id is unknown
    async fn get_by_id(&self, reminder_id: i64)
        -> Result<Option<MedicationReminder>, RepositoryError>;

    /// All reminder definitions
    async fn list_all(&self) -> Result<Vec<MedicationReminder>, RepositoryError>;

    /// Observe committed mutations to this store
    fn subscribe(&self, callback: ChangeCallback) -> Subscription;
}

/// SQLite-backed repository for medication reminders.
///
/// The time list column stores the "HH:mm" entries as JSON text, preserving
/// order and the exact strings.
#[derive(Debug, Clone)]
pub struct SqliteMedicationReminderRepository {
    db: Database,
    changes: ChangeHub,
}

impl SqliteMedicationReminderRepository {
    /// Create a repository over an injected database handle
    pub fn new(db: Database) -> Self {
        Self {
            db,
            changes: ChangeHub::new(),
        }
    }
}

#[async_trait]
impl MedicationReminderRepositoryTrait for SqliteMedicationReminderRepository {
    async fn insert(
        &self,
        reminder: NewMedicationReminder,
    ) -> Result<MedicationReminder, RepositoryError> {
        let time_list = serde_json::to_string(&reminder.time_list)?;

        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO medication_reminders (name, instructions, time_list)
             VALUES (?1, ?2, ?3)",
            (&reminder.name, &reminder.instructions, &time_list),
        )?;
        let reminder_id = conn.last_insert_rowid();
        debug!(reminder_id, name = %reminder.name, "stored medication reminder");

        let stored = MedicationReminder {
            reminder_id,
            name: reminder.name,
            instructions: reminder.instructions,
            time_list: reminder.time_list,
        };

        self.changes
            .publish(&ChangeEvent::Reminders { reminder_id });
        Ok(stored)
    }

    async fn update(&self, reminder: &MedicationReminder) -> Result<(), RepositoryError> {
        let time_list = serde_json::to_string(&reminder.time_list)?;

        let conn = self.db.connection()?;
        let updated = conn.execute(
            "UPDATE medication_reminders SET name = ?1, instructions = ?2, time_list = ?3
             WHERE reminder_id = ?4",
            (
                &reminder.name,
                &reminder.instructions,
                &time_list,
                reminder.reminder_id,
            ),
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound(format!(
                "medication reminder {}",
                reminder.reminder_id
            )));
        }

        self.changes.publish(&ChangeEvent::Reminders {
            reminder_id: reminder.reminder_id,
        });
        Ok(())
    }

    async fn delete(&self, reminder_id: i64) -> Result<(), RepositoryError> {
        let conn = self.db.connection()?;
        let deleted = conn.execute(
            "DELETE FROM medication_reminders WHERE reminder_id = ?1",
            [reminder_id],
        )?;

        if deleted > 0 {
            debug!(reminder_id, "deleted medication reminder");
            self.changes
                .publish(&ChangeEvent::Reminders { reminder_id });
        }
        Ok(())
    }

    async fn get_by_id(
        &self,
        reminder_id: i64,
    ) -> Result<Option<MedicationReminder>, RepositoryError> {
        let conn = self.db.connection()?;
        let reminder = conn
            .query_row(
                &format!(
                    "SELECT {} FROM medication_reminders WHERE reminder_id = ?1",
                    storage::REMINDER_COLUMNS
                ),
                [reminder_id],
                storage::reminder_from_row,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        Ok(reminder)
    }

    async fn list_all(&self) -> Result<Vec<MedicationReminder>, RepositoryError> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM medication_reminders ORDER BY reminder_id",
            storage::REMINDER_COLUMNS
        ))?;
        let rows = stmt.query_map([], storage::reminder_from_row)?;

        let mut reminders = Vec::new();
        for row in rows {
            reminders.push(row?);
        }
        Ok(reminders)
    }

    fn subscribe(&self, callback: ChangeCallback) -> Subscription {
        self.changes.subscribe(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository() -> SqliteMedicationReminderRepository {
        SqliteMedicationReminderRepository::new(Database::in_memory().unwrap())
    }

    fn aspirin() -> NewMedicationReminder {
        NewMedicationReminder {
            name: "Aspirin".to_string(),
            instructions: "after meal".to_string(),
            time_list: vec!["08:00".to_string(), "20:00".to_string()],
        }
    }

    #[test]
    fn test_time_list_round_trips_exact_strings_in_order() {
        let repo = repository();

        tokio_test::block_on(async {
            let stored = repo.insert(aspirin()).await.unwrap();

            let loaded = repo.get_by_id(stored.reminder_id).await.unwrap().unwrap();
            assert_eq!(loaded.time_list, vec!["08:00", "20:00"]);
        });
    }

    #[test]
    fn test_update_replaces_time_list() {
        let repo = repository();

        tokio_test::block_on(async {
            let mut stored = repo.insert(aspirin()).await.unwrap();
            stored.time_list = vec!["09:00".to_string()];

            repo.update(&stored).await.unwrap();

            let loaded = repo.get_by_id(stored.reminder_id).await.unwrap().unwrap();
            assert_eq!(loaded.time_list, vec!["09:00"]);
        });
    }

    #[test]
    fn test_update_unknown_reminder_is_not_found() {
        let repo = repository();

        tokio_test::block_on(async {
            let ghost = MedicationReminder {
                reminder_id: 42,
                name: "Aspirin".to_string(),
                instructions: "after meal".to_string(),
                time_list: vec!["08:00".to_string()],
            };

            let result = repo.update(&ghost).await;
            assert!(matches!(result, Err(RepositoryError::NotFound(_))));
        });
    }

    #[test]
    fn test_delete_removes_row() {
        let repo = repository();

        tokio_test::block_on(async {
            let stored = repo.insert(aspirin()).await.unwrap();
            repo.delete(stored.reminder_id).await.unwrap();

            assert!(repo.get_by_id(stored.reminder_id).await.unwrap().is_none());
            assert!(repo.list_all().await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_mutations_notify_subscribers() {
        let repo = repository();
        let seen = std::sync::Arc::new(std::sync::Mutex::new(0usize));

        let seen_clone = std::sync::Arc::clone(&seen);
        let _sub = repo.subscribe(Box::new(move |_| {
            *seen_clone.lock().unwrap() += 1;
        }));

        tokio_test::block_on(async {
            let mut stored = repo.insert(aspirin()).await.unwrap();
            stored.time_list = vec!["12:00".to_string()];
            repo.update(&stored).await.unwrap();
            repo.delete(stored.reminder_id).await.unwrap();

            // Deleting an already-deleted row publishes nothing
            repo.delete(stored.reminder_id).await.unwrap();
        });

        assert_eq!(*seen.lock().unwrap(), 3);
    }
}
