// Testing utilities and mock implementations for the domain layer
// Available in tests and when the "mock" feature is enabled

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::services::reminder::{AlarmKey, AlarmPayload, AlarmScheduler, SchedulingError};

// Re-export useful test doubles from the data layer
pub use health_manage_center_data::repository::{
    InMemoryDoctorFeedbackRepository, InMemoryHealthRecordRepository,
    InMemoryMedicationReminderRepository, InMemoryUserRepository,
};

/// One call made against the [`RecordingAlarmScheduler`], in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmOp {
    /// A register call
    Register(AlarmKey),
    /// A cancel call
    Cancel(AlarmKey),
}

/// [`AlarmScheduler`] double that records every call and tracks the set of
/// currently registered alarms.
pub struct RecordingAlarmScheduler {
    available: AtomicBool,
    ops: Mutex<Vec<AlarmOp>>,
    active: Mutex<HashMap<AlarmKey, (i64, AlarmPayload)>>,
}

impl Default for RecordingAlarmScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingAlarmScheduler {
    /// Scheduler with the wake-alarm capability granted
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            ops: Mutex::new(Vec::new()),
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Scheduler reporting the wake-alarm capability as denied
    pub fn unavailable() -> Self {
        let scheduler = Self::new();
        scheduler.available.store(false, Ordering::SeqCst);
        scheduler
    }

    /// Flip the capability at runtime
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Every call made so far, in order
    pub fn ops(&self) -> Vec<AlarmOp> {
        self.ops.lock().unwrap().clone()
    }

    /// Keys of the currently registered alarms, sorted
    pub fn active_keys(&self) -> Vec<AlarmKey> {
        let mut keys: Vec<AlarmKey> = self.active.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Fire instant and payload of a registered alarm
    pub fn registered(&self, key: &AlarmKey) -> Option<(i64, AlarmPayload)> {
        self.active.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl AlarmScheduler for RecordingAlarmScheduler {
    fn can_schedule(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn register(
        &self,
        key: AlarmKey,
        fire_at_millis: i64,
        payload: AlarmPayload,
    ) -> Result<(), SchedulingError> {
        self.ops.lock().unwrap().push(AlarmOp::Register(key.clone()));
        self.active
            .lock()
            .unwrap()
            .insert(key, (fire_at_millis, payload));
        Ok(())
    }

    async fn cancel(&self, key: AlarmKey) -> Result<(), SchedulingError> {
        self.ops.lock().unwrap().push(AlarmOp::Cancel(key.clone()));
        self.active.lock().unwrap().remove(&key);
        Ok(())
    }
}
