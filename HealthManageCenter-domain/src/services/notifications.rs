use chrono::{Local, NaiveDateTime};
use thiserror::Error;

use crate::entities::conversions;
use crate::entities::notification::{NotificationFeed, NotificationItem, NotificationKind};
use crate::services::reminder::{next_occurrence, TIME_FORMAT};
use health_manage_center_data::models::medication_reminder::MedicationReminder;
use health_manage_center_data::repository::{
    DoctorFeedbackRepositoryTrait, MedicationReminderRepositoryTrait, RepositoryError,
};
use health_manage_center_data::subscription::{ChangeEvent, Subscription};

/// Title shown on feedback items
pub const FEEDBACK_TITLE: &str = "Doctor Feedback";

/// Title shown on reminder items
pub const REMINDER_TITLE: &str = "Medication Reminder";

/// Notification service errors
#[derive(Debug, Error)]
pub enum NotificationServiceError {
    /// Repository error
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<RepositoryError> for NotificationServiceError {
    fn from(err: RepositoryError) -> Self {
        NotificationServiceError::RepositoryError(err.to_string())
    }
}

/// Keeps a feed observer registered on both underlying stores.
///
/// Dropping the handle unsubscribes from both.
#[derive(Debug)]
pub struct FeedSubscription {
    _feedback: Subscription,
    _reminders: Subscription,
}

/// Service merging doctor feedback and medication reminders into one
/// time-descending feed per elder.
pub struct NotificationService<F, M>
where
    F: DoctorFeedbackRepositoryTrait,
    M: MedicationReminderRepositoryTrait,
{
    feedback: F,
    reminders: M,
}

impl<F, M> NotificationService<F, M>
where
    F: DoctorFeedbackRepositoryTrait,
    M: MedicationReminderRepositoryTrait,
{
    /// Create a new notification service
    pub fn new(feedback: F, reminders: M) -> Self {
        Self { feedback, reminders }
    }

    /// The merged feed for an elder, newest first.
    ///
    /// Items sort on the numeric timestamp: creation time for feedback, next
    /// upcoming occurrence for reminders.
    pub async fn feed(&self, elder_id: i64) -> Result<NotificationFeed, NotificationServiceError> {
        self.feed_at(elder_id, Local::now().naive_local()).await
    }

    /// `feed`, with the reference instant supplied by the caller
    pub async fn feed_at(
        &self,
        elder_id: i64,
        now: NaiveDateTime,
    ) -> Result<NotificationFeed, NotificationServiceError> {
        let feedback_entries = self.feedback.list_for_elder(elder_id).await?;
        let unread_feedback_count = self.feedback.unread_count(elder_id).await?;
        let reminders = self.reminders.list_all().await?;

        let mut items: Vec<NotificationItem> = feedback_entries
            .into_iter()
            .map(|entry| NotificationItem {
                id: entry.id,
                kind: NotificationKind::Feedback,
                title: FEEDBACK_TITLE.to_string(),
                body: entry.comment,
                timestamp_millis: entry.timestamp_millis,
                display_time: conversions::format_timestamp_millis(entry.timestamp_millis),
                is_read: entry.is_read,
            })
            .collect();

        items.extend(reminders.into_iter().map(|reminder| {
            let timestamp_millis = reminder_effective_millis(&reminder, now);
            NotificationItem {
                id: reminder.reminder_id,
                kind: NotificationKind::Reminder,
                title: REMINDER_TITLE.to_string(),
                body: format!("{} - {}", reminder.name, reminder.instructions),
                timestamp_millis,
                display_time: reminder.time_list.join(", "),
                // Reminder items are informational; only feedback carries a
                // persisted read flag
                is_read: true,
            }
        }));

        items.sort_by(|a, b| b.timestamp_millis.cmp(&a.timestamp_millis));

        Ok(NotificationFeed {
            items,
            unread_feedback_count,
        })
    }

    /// Mark a feed item as read. Only feedback items have persisted read
    /// state; reminder items are a no-op.
    pub async fn mark_read(
        &self,
        item: &NotificationItem,
    ) -> Result<(), NotificationServiceError> {
        if item.kind == NotificationKind::Feedback {
            self.feedback.mark_read(item.id).await?;
        }
        Ok(())
    }

    /// Observe committed mutations to either underlying store; the feed
    /// should be re-read on every notification
    pub fn subscribe(
        &self,
        callback: std::sync::Arc<dyn Fn(&ChangeEvent) + Send + Sync>,
    ) -> FeedSubscription {
        let feedback_callback = std::sync::Arc::clone(&callback);
        FeedSubscription {
            _feedback: self
                .feedback
                .subscribe(Box::new(move |event| feedback_callback(event))),
            _reminders: self
                .reminders
                .subscribe(Box::new(move |event| callback(event))),
        }
    }
}

/// Sort instant for a reminder: the soonest upcoming occurrence across its
/// time entries, as local epoch milliseconds
fn reminder_effective_millis(reminder: &MedicationReminder, now: NaiveDateTime) -> i64 {
    reminder
        .time_list
        .iter()
        .filter_map(|entry| chrono::NaiveTime::parse_from_str(entry, TIME_FORMAT).ok())
        .map(|time| conversions::local_naive_to_millis(next_occurrence(time, now)))
        .min()
        .unwrap_or_else(|| conversions::local_naive_to_millis(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_manage_center_data::models::doctor_feedback::NewDoctorFeedback;
    use health_manage_center_data::models::medication_reminder::NewMedicationReminder;
    use health_manage_center_data::repository::{
        InMemoryDoctorFeedbackRepository, InMemoryMedicationReminderRepository,
    };

    fn service() -> (
        NotificationService<InMemoryDoctorFeedbackRepository, InMemoryMedicationReminderRepository>,
        InMemoryDoctorFeedbackRepository,
        InMemoryMedicationReminderRepository,
    ) {
        let feedback = InMemoryDoctorFeedbackRepository::new();
        let reminders = InMemoryMedicationReminderRepository::new();
        (
            NotificationService::new(feedback.clone(), reminders.clone()),
            feedback,
            reminders,
        )
    }

    fn feedback_entry(elder_id: i64, timestamp_millis: i64, comment: &str) -> NewDoctorFeedback {
        NewDoctorFeedback {
            elder_id,
            health_record_id: 1,
            doctor_id: 2,
            comment: comment.to_string(),
            timestamp_millis,
            is_abnormal: false,
            abnormal_type: None,
        }
    }

    #[tokio::test]
    async fn test_feed_merges_and_sorts_by_numeric_timestamp() {
        let (service, feedback, reminders) = service();

        let now = Local::now().naive_local();
        let now_millis = conversions::local_naive_to_millis(now);

        // One feedback far in the past, one in the recent past
        feedback.insert(feedback_entry(1, 1_000, "old")).await.unwrap();
        feedback
            .insert(feedback_entry(1, now_millis - 60_000, "recent"))
            .await
            .unwrap();

        // The reminder's effective instant is its next occurrence, always in
        // the future, so it sorts first
        reminders
            .insert(NewMedicationReminder {
                name: "Aspirin".to_string(),
                instructions: "after meal".to_string(),
                time_list: vec!["08:00".to_string(), "20:00".to_string()],
            })
            .await
            .unwrap();

        let feed = service.feed(1).await.unwrap();
        assert_eq!(feed.items.len(), 3);
        assert_eq!(feed.items[0].kind, NotificationKind::Reminder);
        assert_eq!(feed.items[1].body, "recent");
        assert_eq!(feed.items[2].body, "old");
        assert_eq!(feed.unread_feedback_count, 2);

        // Reminder presentation
        assert_eq!(feed.items[0].title, REMINDER_TITLE);
        assert_eq!(feed.items[0].body, "Aspirin - after meal");
        assert_eq!(feed.items[0].display_time, "08:00, 20:00");
        assert!(feed.items[0].is_read);
    }

    #[tokio::test]
    async fn test_mark_read_delegates_for_feedback_only() {
        let (service, feedback, reminders) = service();

        feedback.insert(feedback_entry(1, 1_000, "note")).await.unwrap();
        reminders
            .insert(NewMedicationReminder {
                name: "Aspirin".to_string(),
                instructions: "after meal".to_string(),
                time_list: vec!["08:00".to_string()],
            })
            .await
            .unwrap();

        let feed = service.feed(1).await.unwrap();
        for item in &feed.items {
            service.mark_read(item).await.unwrap();
        }

        assert_eq!(feedback.unread_count(1).await.unwrap(), 0);
        let refreshed = service.feed(1).await.unwrap();
        assert_eq!(refreshed.unread_feedback_count, 0);
        assert!(refreshed.items.iter().all(|item| item.is_read));

        // Marking twice stays silent
        service.mark_read(&feed.items[0]).await.unwrap();
    }

    #[tokio::test]
    async fn test_subscription_observes_both_stores_until_dropped() {
        let (service, feedback, reminders) = service();
        let seen = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let seen_clone = std::sync::Arc::clone(&seen);
        let subscription = service.subscribe(std::sync::Arc::new(move |_| {
            seen_clone.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }));

        feedback.insert(feedback_entry(1, 1_000, "a")).await.unwrap();
        reminders
            .insert(NewMedicationReminder {
                name: "Aspirin".to_string(),
                instructions: "after meal".to_string(),
                time_list: vec!["08:00".to_string()],
            })
            .await
            .unwrap();
        assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 2);

        drop(subscription);
        feedback.insert(feedback_entry(1, 2_000, "b")).await.unwrap();
        assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reminder_effective_instant_is_soonest_entry() {
        use chrono::{NaiveDate, NaiveTime};

        let now = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap());

        let reminder = MedicationReminder {
            reminder_id: 1,
            name: "Aspirin".to_string(),
            instructions: "after meal".to_string(),
            time_list: vec!["08:00".to_string(), "20:00".to_string()],
        };

        // 20:00 today beats 08:00 tomorrow
        let expected = conversions::local_naive_to_millis(
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_time(NaiveTime::from_hms_opt(20, 0, 0).unwrap()),
        );
        assert_eq!(reminder_effective_millis(&reminder, now), expected);
    }
}
