use async_trait::async_trait;
use tracing::debug;

use super::errors::RepositoryError;
use super::storage;
use super::SortOrder;
use crate::database::Database;
use crate::models::health_record::{HealthRecord, NewHealthRecord};
use crate::subscription::{ChangeCallback, ChangeEvent, ChangeHub, Subscription};

/// Repository trait for daily vital-sign records.
///
/// Day boundaries are supplied by the caller as `[day_start, day_end)` epoch
/// millisecond windows; the store itself is time-zone agnostic.
#[async_trait]
pub trait HealthRecordRepositoryTrait: Send + Sync {
    /// Insert the record, or replace the existing row for the same user
    /// inside the given day window. Never creates a second row for a day.
    async fn upsert_for_day(
        &self,
        record: NewHealthRecord,
        day_start_millis: i64,
        day_end_millis: i64,
    ) -> Result<HealthRecord, RepositoryError>;

    /// Get the record inside the given day window, if any
    async fn get_by_day(
        &self,
        user_id: i64,
        day_start_millis: i64,
        day_end_millis: i64,
    ) -> Result<Option<HealthRecord>, RepositoryError>;

    /// Get the records in `[start, end)`, ordered by time
    async fn get_range(
        &self,
        user_id: i64,
        start_millis: i64,
        end_millis: i64,
        order: SortOrder,
    ) -> Result<Vec<HealthRecord>, RepositoryError>;

    /// Get the most recent record, if any
    async fn get_latest(&self, user_id: i64) -> Result<Option<HealthRecord>, RepositoryError>;

    /// Point lookup; `None` (not an error) when the id is unknown
    async fn get_by_id(&self, record_id: i64) -> Result<Option<HealthRecord>, RepositoryError>;

    /// Observe committed mutations to this store
    fn subscribe(&self, callback: ChangeCallback) -> Subscription;
}

/// SQLite-backed repository for health records
#[derive(Debug, Clone)]
pub struct SqliteHealthRecordRepository {
    db: Database,
    changes: ChangeHub,
}

impl SqliteHealthRecordRepository {
    /// Create a repository over an injected database handle
    pub fn new(db: Database) -> Self {
        Self {
            db,
            changes: ChangeHub::new(),
        }
    }
}

#[async_trait]
impl HealthRecordRepositoryTrait for SqliteHealthRecordRepository {
    async fn upsert_for_day(
        &self,
        record: NewHealthRecord,
        day_start_millis: i64,
        day_end_millis: i64,
    ) -> Result<HealthRecord, RepositoryError> {
        let mut conn = self.db.connection()?;
        let tx = conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT record_id FROM health_records
                 WHERE user_id = ?1 AND timestamp >= ?2 AND timestamp < ?3",
                (record.user_id, day_start_millis, day_end_millis),
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        let record_id = match existing {
            Some(record_id) => {
                debug!(record_id, user_id = record.user_id, "replacing today's health record");
                tx.execute(
                    "UPDATE health_records
                     SET timestamp = ?1, weight = ?2, height = ?3, heart_rate = ?4,
                         systolic = ?5, diastolic = ?6, sleep_hours = ?7, analyzed = ?8
                     WHERE record_id = ?9",
                    (
                        record.timestamp_millis,
                        record.weight_kg,
                        record.height_cm,
                        record.heart_rate_bpm,
                        record.systolic,
                        record.diastolic,
                        record.sleep_hours,
                        record.analyzed as i64,
                        record_id,
                    ),
                )?;
                record_id
            }
            None => {
                debug!(user_id = record.user_id, "inserting first health record of the day");
                tx.execute(
                    "INSERT INTO health_records
                     (user_id, timestamp, weight, height, heart_rate, systolic, diastolic, sleep_hours, analyzed)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    (
                        record.user_id,
                        record.timestamp_millis,
                        record.weight_kg,
                        record.height_cm,
                        record.heart_rate_bpm,
                        record.systolic,
                        record.diastolic,
                        record.sleep_hours,
                        record.analyzed as i64,
                    ),
                )?;
                tx.last_insert_rowid()
            }
        };

        let stored = tx.query_row(
            &format!(
                "SELECT {} FROM health_records WHERE record_id = ?1",
                storage::HEALTH_RECORD_COLUMNS
            ),
            [record_id],
            storage::health_record_from_row,
        )?;

        tx.commit()?;

        self.changes.publish(&ChangeEvent::HealthRecords {
            user_id: stored.user_id,
        });
        Ok(stored)
    }

    async fn get_by_day(
        &self,
        user_id: i64,
        day_start_millis: i64,
        day_end_millis: i64,
    ) -> Result<Option<HealthRecord>, RepositoryError> {
        let conn = self.db.connection()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM health_records
                     WHERE user_id = ?1 AND timestamp >= ?2 AND timestamp < ?3",
                    storage::HEALTH_RECORD_COLUMNS
                ),
                (user_id, day_start_millis, day_end_millis),
                storage::health_record_from_row,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        Ok(record)
    }

    async fn get_range(
        &self,
        user_id: i64,
        start_millis: i64,
        end_millis: i64,
        order: SortOrder,
    ) -> Result<Vec<HealthRecord>, RepositoryError> {
        let conn = self.db.connection()?;

        let sql = format!(
            "SELECT {} FROM health_records
             WHERE user_id = ?1 AND timestamp >= ?2 AND timestamp < ?3
             ORDER BY timestamp {}",
            storage::HEALTH_RECORD_COLUMNS,
            match order {
                SortOrder::Ascending => "ASC",
                SortOrder::Descending => "DESC",
            }
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            (user_id, start_millis, end_millis),
            storage::health_record_from_row,
        )?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    async fn get_latest(&self, user_id: i64) -> Result<Option<HealthRecord>, RepositoryError> {
        let conn = self.db.connection()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM health_records
                     WHERE user_id = ?1 ORDER BY timestamp DESC LIMIT 1",
                    storage::HEALTH_RECORD_COLUMNS
                ),
                [user_id],
                storage::health_record_from_row,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        Ok(record)
    }

    async fn get_by_id(&self, record_id: i64) -> Result<Option<HealthRecord>, RepositoryError> {
        let conn = self.db.connection()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM health_records WHERE record_id = ?1",
                    storage::HEALTH_RECORD_COLUMNS
                ),
                [record_id],
                storage::health_record_from_row,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        Ok(record)
    }

    fn subscribe(&self, callback: ChangeCallback) -> Subscription {
        self.changes.subscribe(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_record(user_id: i64, timestamp_millis: i64, heart_rate: i32) -> NewHealthRecord {
        NewHealthRecord {
            user_id,
            timestamp_millis,
            weight_kg: Some(64.0),
            height_cm: Some(170.0),
            heart_rate_bpm: Some(heart_rate),
            systolic: Some(120),
            diastolic: Some(80),
            sleep_hours: Some(7.5),
            analyzed: true,
        }
    }

    fn repository() -> SqliteHealthRecordRepository {
        SqliteHealthRecordRepository::new(Database::in_memory().unwrap())
    }

    const DAY: i64 = 86_400_000;

    #[test]
    fn test_upsert_twice_same_day_keeps_one_row_with_second_values() {
        let repo = repository();

        tokio_test::block_on(async {
            let first = repo
                .upsert_for_day(new_record(1, 1_000, 72), 0, DAY)
                .await
                .unwrap();
            let second = repo
                .upsert_for_day(new_record(1, 2_000, 90), 0, DAY)
                .await
                .unwrap();

            // Same row, replaced values
            assert_eq!(first.record_id, second.record_id);
            assert_eq!(second.heart_rate_bpm, Some(90));
            assert_eq!(second.timestamp_millis, 2_000);

            let stored = repo.get_by_day(1, 0, DAY).await.unwrap().unwrap();
            assert_eq!(stored.heart_rate_bpm, Some(90));
        });
    }

    #[test]
    fn test_upsert_on_next_day_creates_new_row() {
        let repo = repository();

        tokio_test::block_on(async {
            let today = repo
                .upsert_for_day(new_record(1, 1_000, 72), 0, DAY)
                .await
                .unwrap();
            let tomorrow = repo
                .upsert_for_day(new_record(1, DAY + 1_000, 75), DAY, 2 * DAY)
                .await
                .unwrap();

            assert_ne!(today.record_id, tomorrow.record_id);
        });
    }

    #[test]
    fn test_get_by_id_returns_none_for_unknown_record() {
        let repo = repository();

        tokio_test::block_on(async {
            assert!(repo.get_by_id(999).await.unwrap().is_none());
        });
    }

    #[test]
    fn test_get_latest_picks_most_recent_timestamp() {
        let repo = repository();

        tokio_test::block_on(async {
            repo.upsert_for_day(new_record(1, 1_000, 72), 0, DAY)
                .await
                .unwrap();
            repo.upsert_for_day(new_record(1, DAY + 5_000, 88), DAY, 2 * DAY)
                .await
                .unwrap();

            let latest = repo.get_latest(1).await.unwrap().unwrap();
            assert_eq!(latest.timestamp_millis, DAY + 5_000);
            assert_eq!(latest.heart_rate_bpm, Some(88));
        });
    }

    #[test]
    fn test_get_range_respects_bounds_and_order() {
        let repo = repository();

        tokio_test::block_on(async {
            for day in 0..3 {
                repo.upsert_for_day(
                    new_record(1, day * DAY + 1_000, 70 + day as i32),
                    day * DAY,
                    (day + 1) * DAY,
                )
                .await
                .unwrap();
            }

            let ascending = repo
                .get_range(1, 0, 3 * DAY, SortOrder::Ascending)
                .await
                .unwrap();
            assert_eq!(ascending.len(), 3);
            assert!(ascending[0].timestamp_millis < ascending[2].timestamp_millis);

            let window = repo
                .get_range(1, DAY, 2 * DAY, SortOrder::Descending)
                .await
                .unwrap();
            assert_eq!(window.len(), 1);

            // Records of other users are never visible
            let other = repo
                .get_range(2, 0, 3 * DAY, SortOrder::Ascending)
                .await
                .unwrap();
            assert!(other.is_empty());
        });
    }

    #[test]
    fn test_upsert_notifies_subscribers() {
        let repo = repository();
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));

        let seen_clone = std::sync::Arc::clone(&seen);
        let _sub = repo.subscribe(Box::new(move |event| {
            seen_clone.lock().unwrap().push(event.clone());
        }));

        tokio_test::block_on(async {
            repo.upsert_for_day(new_record(3, 1_000, 72), 0, DAY)
                .await
                .unwrap();
        });

        let events = seen.lock().unwrap();
        assert_eq!(events.as_slice(), [ChangeEvent::HealthRecords { user_id: 3 }]);
    }
}
