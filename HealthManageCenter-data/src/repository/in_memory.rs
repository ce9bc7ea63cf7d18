//! In-memory repository implementations.
//!
//! Functionally equivalent to the SQLite repositories but backed by plain
//! maps. Used as the non-durable backend and as test doubles for the domain
//! layer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::errors::RepositoryError;
use super::SortOrder;
use crate::models::doctor_feedback::{DoctorFeedback, NewDoctorFeedback};
use crate::models::health_record::{HealthRecord, NewHealthRecord};
use crate::models::medication_reminder::{MedicationReminder, NewMedicationReminder};
use crate::models::user::{NewUser, User, UserRole};
use crate::subscription::{ChangeCallback, ChangeEvent, ChangeHub, Subscription};

use super::doctor_feedback::DoctorFeedbackRepositoryTrait;
use super::health_record::HealthRecordRepositoryTrait;
use super::medication_reminder::MedicationReminderRepositoryTrait;
use super::user::UserRepositoryTrait;

/// In-memory health record store
#[derive(Debug, Clone)]
pub struct InMemoryHealthRecordRepository {
    records: Arc<Mutex<HashMap<i64, HealthRecord>>>,
    next_id: Arc<AtomicI64>,
    changes: ChangeHub,
}

impl Default for InMemoryHealthRecordRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHealthRecordRepository {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            changes: ChangeHub::new(),
        }
    }
}

#[async_trait]
impl HealthRecordRepositoryTrait for InMemoryHealthRecordRepository {
    async fn upsert_for_day(
        &self,
        record: NewHealthRecord,
        day_start_millis: i64,
        day_end_millis: i64,
    ) -> Result<HealthRecord, RepositoryError> {
        let stored = {
            let mut records = self.records.lock()?;

            let existing_id = records
                .values()
                .find(|r| {
                    r.user_id == record.user_id
                        && r.timestamp_millis >= day_start_millis
                        && r.timestamp_millis < day_end_millis
                })
                .map(|r| r.record_id);

            let record_id =
                existing_id.unwrap_or_else(|| self.next_id.fetch_add(1, Ordering::SeqCst));

            let stored = HealthRecord {
                record_id,
                user_id: record.user_id,
                timestamp_millis: record.timestamp_millis,
                weight_kg: record.weight_kg,
                height_cm: record.height_cm,
                heart_rate_bpm: record.heart_rate_bpm,
                systolic: record.systolic,
                diastolic: record.diastolic,
                sleep_hours: record.sleep_hours,
                analyzed: record.analyzed,
            };
            records.insert(record_id, stored.clone());
            stored
        };

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
        let records = self.records.lock()?;
        Ok(records
            .values()
            .find(|r| {
                r.user_id == user_id
                    && r.timestamp_millis >= day_start_millis
                    && r.timestamp_millis < day_end_millis
            })
            .cloned())
    }

    async fn get_range(
        &self,
        user_id: i64,
        start_millis: i64,
        end_millis: i64,
        order: SortOrder,
    ) -> Result<Vec<HealthRecord>, RepositoryError> {
        let records = self.records.lock()?;
        let mut matching: Vec<HealthRecord> = records
            .values()
            .filter(|r| {
                r.user_id == user_id
                    && r.timestamp_millis >= start_millis
                    && r.timestamp_millis < end_millis
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let cmp = a.timestamp_millis.cmp(&b.timestamp_millis);
            match order {
                SortOrder::Ascending => cmp,
                SortOrder::Descending => cmp.reverse(),
            }
        });

        Ok(matching)
    }

    async fn get_latest(&self, user_id: i64) -> Result<Option<HealthRecord>, RepositoryError> {
        let records = self.records.lock()?;
        Ok(records
            .values()
            .filter(|r| r.user_id == user_id)
            .max_by_key(|r| r.timestamp_millis)
            .cloned())
    }

    async fn get_by_id(&self, record_id: i64) -> Result<Option<HealthRecord>, RepositoryError> {
        let records = self.records.lock()?;
        Ok(records.get(&record_id).cloned())
    }

    fn subscribe(&self, callback: ChangeCallback) -> Subscription {
        self.changes.subscribe(callback)
    }
}

/// In-memory doctor feedback store
#[derive(Debug, Clone)]
pub struct InMemoryDoctorFeedbackRepository {
    entries: Arc<Mutex<HashMap<i64, DoctorFeedback>>>,
    next_id: Arc<AtomicI64>,
    changes: ChangeHub,
}

impl Default for InMemoryDoctorFeedbackRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDoctorFeedbackRepository {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            changes: ChangeHub::new(),
        }
    }

    fn list_sorted(
        &self,
        filter: impl Fn(&DoctorFeedback) -> bool,
    ) -> Result<Vec<DoctorFeedback>, RepositoryError> {
        let entries = self.entries.lock()?;
        let mut matching: Vec<DoctorFeedback> =
            entries.values().filter(|f| filter(f)).cloned().collect();
        matching.sort_by(|a, b| b.timestamp_millis.cmp(&a.timestamp_millis));
        Ok(matching)
    }
}

#[async_trait]
impl DoctorFeedbackRepositoryTrait for InMemoryDoctorFeedbackRepository {
    async fn insert(&self, feedback: NewDoctorFeedback) -> Result<DoctorFeedback, RepositoryError> {
        let stored = {
            let mut entries = self.entries.lock()?;
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);

            let stored = DoctorFeedback {
                id,
                elder_id: feedback.elder_id,
                health_record_id: feedback.health_record_id,
                doctor_id: feedback.doctor_id,
                comment: feedback.comment,
                timestamp_millis: feedback.timestamp_millis,
                is_read: false,
                is_abnormal: feedback.is_abnormal,
                abnormal_type: feedback.abnormal_type,
            };
            entries.insert(id, stored.clone());
            stored
        };

        self.changes.publish(&ChangeEvent::Feedback {
            elder_id: stored.elder_id,
            doctor_id: stored.doctor_id,
        });
        Ok(stored)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<DoctorFeedback>, RepositoryError> {
        let entries = self.entries.lock()?;
        Ok(entries.get(&id).cloned())
    }

    async fn list_for_elder(&self, elder_id: i64) -> Result<Vec<DoctorFeedback>, RepositoryError> {
        self.list_sorted(|f| f.elder_id == elder_id)
    }

    async fn list_for_doctor(
        &self,
        doctor_id: i64,
    ) -> Result<Vec<DoctorFeedback>, RepositoryError> {
        self.list_sorted(|f| f.doctor_id == doctor_id)
    }

    async fn mark_read(&self, id: i64) -> Result<(), RepositoryError> {
        let transitioned = {
            let mut entries = self.entries.lock()?;
            match entries.get_mut(&id) {
                Some(entry) if !entry.is_read => {
                    entry.is_read = true;
                    Some((entry.elder_id, entry.doctor_id))
                }
                _ => None,
            }
        };

        if let Some((elder_id, doctor_id)) = transitioned {
            self.changes
                .publish(&ChangeEvent::Feedback { elder_id, doctor_id });
        }
        Ok(())
    }

    async fn unread_count(&self, elder_id: i64) -> Result<usize, RepositoryError> {
        let entries = self.entries.lock()?;
        Ok(entries
            .values()
            .filter(|f| f.elder_id == elder_id && !f.is_read)
            .count())
    }

    async fn abnormal_count(&self, doctor_id: i64) -> Result<usize, RepositoryError> {
        let entries = self.entries.lock()?;
        Ok(entries
            .values()
            .filter(|f| f.doctor_id == doctor_id && f.is_abnormal)
            .count())
    }

    fn subscribe(&self, callback: ChangeCallback) -> Subscription {
        self.changes.subscribe(callback)
    }
}

/// In-memory medication reminder store
#[derive(Debug, Clone)]
pub struct InMemoryMedicationReminderRepository {
    reminders: Arc<Mutex<HashMap<i64, MedicationReminder>>>,
    next_id: Arc<AtomicI64>,
    changes: ChangeHub,
}

impl Default for InMemoryMedicationReminderRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMedicationReminderRepository {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            reminders: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            changes: ChangeHub::new(),
        }
    }
}

#[async_trait]
impl MedicationReminderRepositoryTrait for InMemoryMedicationReminderRepository {
    async fn insert(
        &self,
        reminder: NewMedicationReminder,
    ) -> Result<MedicationReminder, RepositoryError> {
        let stored = {
            let mut reminders = self.reminders.lock()?;
            let reminder_id = self.next_id.fetch_add(1, Ordering::SeqCst);

            let stored = MedicationReminder {
                reminder_id,
                name: reminder.name,
                instructions: reminder.instructions,
                time_list: reminder.time_list,
            };
            reminders.insert(reminder_id, stored.clone());
            stored
        };

        self.changes.publish(&ChangeEvent::Reminders {
            reminder_id: stored.reminder_id,
        });
        Ok(stored)
    }

    async fn update(&self, reminder: &MedicationReminder) -> Result<(), RepositoryError> {
        {
            let mut reminders = self.reminders.lock()?;
            if !reminders.contains_key(&reminder.reminder_id) {
                return Err(RepositoryError::NotFound(format!(
                    "medication reminder {}",
                    reminder.reminder_id
                )));
            }
            reminders.insert(reminder.reminder_id, reminder.clone());
        }

        self.changes.publish(&ChangeEvent::Reminders {
            reminder_id: reminder.reminder_id,
        });
        Ok(())
    }

    async fn delete(&self, reminder_id: i64) -> Result<(), RepositoryError> {
        let removed = {
            let mut reminders = self.reminders.lock()?;
            reminders.remove(&reminder_id).is_some()
        };

        if removed {
            self.changes
                .publish(&ChangeEvent::Reminders { reminder_id });
        }
        Ok(())
    }

    async fn get_by_id(
        &self,
        reminder_id: i64,
    ) -> Result<Option<MedicationReminder>, RepositoryError> {
        let reminders = self.reminders.lock()?;
        Ok(reminders.get(&reminder_id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<MedicationReminder>, RepositoryError> {
        let reminders = self.reminders.lock()?;
        let mut all: Vec<MedicationReminder> = reminders.values().cloned().collect();
        all.sort_by_key(|r| r.reminder_id);
        Ok(all)
    }

    fn subscribe(&self, callback: ChangeCallback) -> Subscription {
        self.changes.subscribe(callback)
    }
}

/// In-memory user roster
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<HashMap<i64, User>>>,
    next_id: Arc<AtomicI64>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    /// Create an empty roster
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

#[async_trait]
impl UserRepositoryTrait for InMemoryUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut users = self.users.lock()?;
        let user_id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let stored = User {
            user_id,
            name: user.name,
            phone: user.phone,
            role: user.role,
            password: user.password,
            email: user.email,
            date_of_birth_millis: user.date_of_birth_millis,
            gender: user.gender,
            doctor_id: user.doctor_id,
        };
        users.insert(user_id, stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, user_id: i64) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock()?;
        Ok(users.get(&user_id).cloned())
    }

    async fn get_all_doctors(&self) -> Result<Vec<User>, RepositoryError> {
        let users = self.users.lock()?;
        let mut doctors: Vec<User> = users
            .values()
            .filter(|u| u.role == UserRole::Doctor)
            .cloned()
            .collect();
        doctors.sort_by_key(|u| u.user_id);
        Ok(doctors)
    }

    async fn get_elders_by_doctor(&self, doctor_id: i64) -> Result<Vec<User>, RepositoryError> {
        let users = self.users.lock()?;
        let mut elders: Vec<User> = users
            .values()
            .filter(|u| u.role == UserRole::Elder && u.doctor_id == Some(doctor_id))
            .cloned()
            .collect();
        elders.sort_by_key(|u| u.user_id);
        Ok(elders)
    }
}
