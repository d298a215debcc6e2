//! In-memory repository implementations.
//!
//! Always compiled (not test-gated) so the engine and jobs crates can
//! build pipelines against them in their own tests without a live
//! database. Semantics mirror the Pg implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use remind_core::{
    CreateNotificationRequest, CreateReminderRequest, Error, Notification, NotificationRepository,
    Reminder, ReminderKind, ReminderRepository, ReminderStatus, Result, ScheduleDecision,
    ScheduleTime, ScheduleType, TriggeredLocation, TtsRecord,
};

/// In-memory ReminderRepository backed by a HashMap.
#[derive(Clone, Default)]
pub struct InMemoryReminderRepository {
    inner: Arc<RwLock<ReminderStore>>,
}

#[derive(Default)]
struct ReminderStore {
    items: HashMap<Uuid, Reminder>,
    // Insertion order, so listings are deterministic.
    order: Vec<Uuid>,
}

impl InMemoryReminderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a fully-formed reminder (test convenience).
    pub async fn seed(&self, reminder: Reminder) {
        let mut store = self.inner.write().await;
        store.order.push(reminder.id);
        store.items.insert(reminder.id, reminder);
    }
}

#[async_trait]
impl ReminderRepository for InMemoryReminderRepository {
    async fn insert(&self, req: CreateReminderRequest) -> Result<Uuid> {
        let req = req.normalized();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let reminder = Reminder {
            id,
            owner_id: req.owner_id,
            kind: req.kind,
            title: req.title,
            description: req.description,
            start_time: req.start_time,
            is_manual_schedule: req.is_manual_schedule,
            schedule_type: req.schedule_type,
            schedule_days: req.schedule_days,
            schedule_time: req.schedule_time,
            notification_minutes: req.notification_minutes,
            ai_suggested: false,
            ai_notification_line: None,
            last_triggered_at: None,
            triggered_location: None,
            status: ReminderStatus::Active,
            tts: None,
            is_completed: false,
            created_at: now,
            updated_at: now,
        };

        let mut store = self.inner.write().await;
        store.order.push(id);
        store.items.insert(id, reminder);
        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<Reminder> {
        self.inner
            .read()
            .await
            .items
            .get(&id)
            .cloned()
            .ok_or(Error::ReminderNotFound(id))
    }

    async fn fetch_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Reminder> {
        self.inner
            .read()
            .await
            .items
            .get(&id)
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .ok_or(Error::ReminderNotFound(id))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Reminder>> {
        let store = self.inner.read().await;
        Ok(store
            .order
            .iter()
            .filter_map(|id| store.items.get(id))
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn active_location_reminders(&self, owner_id: Uuid) -> Result<Vec<Reminder>> {
        let store = self.inner.read().await;
        Ok(store
            .order
            .iter()
            .filter_map(|id| store.items.get(id))
            .filter(|r| {
                r.owner_id == owner_id
                    && r.kind == ReminderKind::Location
                    && r.status == ReminderStatus::Active
                    && !r.is_completed
            })
            .cloned()
            .collect())
    }

    async fn scheduled_between(
        &self,
        owner_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Reminder>> {
        let store = self.inner.read().await;
        let mut hits: Vec<Reminder> = store
            .items
            .values()
            .filter(|r| {
                r.owner_id == owner_id
                    && matches!(r.kind, ReminderKind::Task | ReminderKind::Meeting)
                    && !r.is_completed
                    && r.start_time.is_some_and(|t| t >= from && t <= to)
            })
            .cloned()
            .collect();
        hits.sort_by_key(|r| r.start_time);
        Ok(hits)
    }

    async fn apply_schedule(&self, id: Uuid, decision: &ScheduleDecision) -> Result<()> {
        let mut store = self.inner.write().await;
        let reminder = store
            .items
            .get_mut(&id)
            .ok_or(Error::ReminderNotFound(id))?;

        reminder.start_time = decision.start_time;
        reminder.schedule_type = decision.schedule_type;
        reminder.schedule_days = decision.schedule_days.clone();
        reminder.schedule_time = ScheduleTime {
            minutes_before_start: (decision.schedule_type == ScheduleType::OneDay)
                .then_some(decision.lead_minutes),
            fixed_time: decision.fixed_time.clone(),
        };
        reminder.notification_minutes = Some(decision.lead_minutes);
        reminder.ai_suggested = true;
        reminder.updated_at = Utc::now();
        Ok(())
    }

    async fn set_notification_line(&self, id: Uuid, line: &str) -> Result<()> {
        let mut store = self.inner.write().await;
        let reminder = store
            .items
            .get_mut(&id)
            .ok_or(Error::ReminderNotFound(id))?;
        reminder.ai_notification_line = Some(line.to_string());
        reminder.updated_at = Utc::now();
        Ok(())
    }

    async fn set_tts(&self, id: Uuid, tts: &TtsRecord) -> Result<()> {
        let mut store = self.inner.write().await;
        let reminder = store
            .items
            .get_mut(&id)
            .ok_or(Error::ReminderNotFound(id))?;
        reminder.tts = Some(tts.clone());
        reminder.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_triggered(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        location: &TriggeredLocation,
    ) -> Result<()> {
        let mut store = self.inner.write().await;
        let reminder = store
            .items
            .get_mut(&id)
            .ok_or(Error::ReminderNotFound(id))?;
        reminder.last_triggered_at = Some(at);
        reminder.triggered_location = Some(location.clone());
        if reminder.status != ReminderStatus::Expired {
            reminder.status = ReminderStatus::Active;
        }
        reminder.updated_at = Utc::now();
        Ok(())
    }

    async fn set_completed(&self, id: Uuid, completed: bool) -> Result<()> {
        let mut store = self.inner.write().await;
        let reminder = store
            .items
            .get_mut(&id)
            .ok_or(Error::ReminderNotFound(id))?;
        reminder.is_completed = completed;
        reminder.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut store = self.inner.write().await;
        if store.items.remove(&id).is_none() {
            return Err(Error::ReminderNotFound(id));
        }
        store.order.retain(|&existing| existing != id);
        Ok(())
    }
}

/// In-memory NotificationRepository backed by a Vec.
#[derive(Clone, Default)]
pub struct InMemoryNotificationRepository {
    inner: Arc<RwLock<Vec<Notification>>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored notifications, in creation order (test convenience).
    pub async fn all(&self) -> Vec<Notification> {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert(&self, req: CreateNotificationRequest) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.inner.write().await.push(Notification {
            id,
            user_id: req.user_id,
            kind: req.kind,
            message: req.message,
            reminder_id: req.reminder_id,
            is_read: false,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>> {
        let store = self.inner.read().await;
        Ok(store
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, id: Uuid) -> Result<()> {
        let mut store = self.inner.write().await;
        let notification = store
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| Error::NotFound(format!("notification {}", id)))?;
        notification.is_read = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use remind_core::NotificationKind;

    fn task_request(owner: Uuid, title: &str, start: Option<DateTime<Utc>>) -> CreateReminderRequest {
        CreateReminderRequest {
            owner_id: owner,
            kind: ReminderKind::Task,
            title: title.to_string(),
            description: None,
            start_time: start,
            is_manual_schedule: start.is_some(),
            schedule_type: ScheduleType::OneDay,
            schedule_days: vec![],
            schedule_time: ScheduleTime::default(),
            notification_minutes: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let repo = InMemoryReminderRepository::new();
        let owner = Uuid::new_v4();
        let id = repo.insert(task_request(owner, "tea", None)).await.unwrap();

        let fetched = repo.fetch(id).await.unwrap();
        assert_eq!(fetched.title, "tea");
        assert_eq!(fetched.owner_id, owner);
        assert!(!fetched.ai_suggested);
    }

    #[tokio::test]
    async fn test_insert_normalizes_meeting_schedule_flags() {
        let repo = InMemoryReminderRepository::new();
        let owner = Uuid::new_v4();
        let mut req = task_request(owner, "standup", Some(Utc::now()));
        req.kind = ReminderKind::Meeting;
        req.is_manual_schedule = false;
        req.schedule_type = ScheduleType::Routine;
        req.schedule_days = vec![1, 3, 5];
        let id = repo.insert(req).await.unwrap();

        let stored = repo.fetch(id).await.unwrap();
        assert!(stored.is_manual_schedule);
        assert_eq!(stored.schedule_type, ScheduleType::OneDay);
        assert!(stored.schedule_days.is_empty());
        // A normalized meeting never authorizes the resolver.
        assert!(!stored.needs_schedule());
    }

    #[tokio::test]
    async fn test_fetch_owned_rejects_other_owner() {
        let repo = InMemoryReminderRepository::new();
        let owner = Uuid::new_v4();
        let id = repo.insert(task_request(owner, "tea", None)).await.unwrap();

        assert!(repo.fetch_owned(id, owner).await.is_ok());
        let err = repo.fetch_owned(id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::ReminderNotFound(_)));
    }

    #[tokio::test]
    async fn test_scheduled_between_inclusive_bounds() {
        let repo = InMemoryReminderRepository::new();
        let owner = Uuid::new_v4();
        let now = Utc::now();

        repo.insert(task_request(owner, "at-from", Some(now)))
            .await
            .unwrap();
        repo.insert(task_request(owner, "at-to", Some(now + Duration::days(7))))
            .await
            .unwrap();
        repo.insert(task_request(
            owner,
            "beyond",
            Some(now + Duration::days(7) + Duration::seconds(1)),
        ))
        .await
        .unwrap();

        let hits = repo
            .scheduled_between(owner, now, now + Duration::days(7))
            .await
            .unwrap();
        let titles: Vec<&str> = hits.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["at-from", "at-to"]);
    }

    #[tokio::test]
    async fn test_scheduled_between_skips_completed() {
        let repo = InMemoryReminderRepository::new();
        let owner = Uuid::new_v4();
        let now = Utc::now();
        let id = repo
            .insert(task_request(owner, "done", Some(now + Duration::hours(1))))
            .await
            .unwrap();
        repo.set_completed(id, true).await.unwrap();

        let hits = repo
            .scheduled_between(owner, now, now + Duration::days(7))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_apply_schedule_sets_ai_suggested() {
        let repo = InMemoryReminderRepository::new();
        let owner = Uuid::new_v4();
        let id = repo.insert(task_request(owner, "tea", None)).await.unwrap();
        let start = Utc::now() + Duration::days(2);

        repo.apply_schedule(
            id,
            &ScheduleDecision {
                schedule_type: ScheduleType::OneDay,
                start_time: Some(start),
                schedule_days: vec![],
                fixed_time: None,
                lead_minutes: 10,
                path: remind_core::SchedulePath::Ai,
            },
        )
        .await
        .unwrap();

        let reminder = repo.fetch(id).await.unwrap();
        assert_eq!(reminder.start_time, Some(start));
        assert!(reminder.ai_suggested);
        assert_eq!(reminder.schedule_time.minutes_before_start, Some(10));
        assert_eq!(reminder.notification_minutes, Some(10));
    }

    #[tokio::test]
    async fn test_mark_triggered_preserves_expired_status() {
        let repo = InMemoryReminderRepository::new();
        let owner = Uuid::new_v4();
        let mut reminder = Reminder {
            id: Uuid::new_v4(),
            owner_id: owner,
            kind: ReminderKind::Location,
            title: "pharmacy".to_string(),
            description: None,
            start_time: None,
            is_manual_schedule: true,
            schedule_type: ScheduleType::Routine,
            schedule_days: vec![],
            schedule_time: ScheduleTime::default(),
            notification_minutes: None,
            ai_suggested: false,
            ai_notification_line: None,
            last_triggered_at: None,
            triggered_location: None,
            status: ReminderStatus::Expired,
            tts: None,
            is_completed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let id = reminder.id;
        repo.seed(reminder.clone()).await;

        let location = TriggeredLocation {
            place_id: "p1".to_string(),
            name: "Pharmacy".to_string(),
            lat: 0.0,
            lng: 0.0,
            rating: None,
        };
        repo.mark_triggered(id, Utc::now(), &location).await.unwrap();
        assert_eq!(repo.fetch(id).await.unwrap().status, ReminderStatus::Expired);

        // A non-expired reminder is confirmed active.
        reminder.id = Uuid::new_v4();
        reminder.status = ReminderStatus::Active;
        let id2 = reminder.id;
        repo.seed(reminder).await;
        repo.mark_triggered(id2, Utc::now(), &location).await.unwrap();
        assert_eq!(repo.fetch(id2).await.unwrap().status, ReminderStatus::Active);
    }

    #[tokio::test]
    async fn test_active_location_reminders_filters() {
        let repo = InMemoryReminderRepository::new();
        let owner = Uuid::new_v4();

        let mut location_req = task_request(owner, "pharmacy", None);
        location_req.kind = ReminderKind::Location;
        let keep = repo.insert(location_req.clone()).await.unwrap();

        location_req.title = "completed one".to_string();
        let done = repo.insert(location_req).await.unwrap();
        repo.set_completed(done, true).await.unwrap();

        // A task never shows up.
        repo.insert(task_request(owner, "tea", None)).await.unwrap();

        let active = repo.active_location_reminders(owner).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, keep);
    }

    #[tokio::test]
    async fn test_delete_removes() {
        let repo = InMemoryReminderRepository::new();
        let owner = Uuid::new_v4();
        let id = repo.insert(task_request(owner, "tea", None)).await.unwrap();

        repo.delete(id).await.unwrap();
        assert!(repo.fetch(id).await.is_err());
        assert!(repo.delete(id).await.is_err());
    }

    #[tokio::test]
    async fn test_notifications_insert_list_mark_read() {
        let repo = InMemoryNotificationRepository::new();
        let user = Uuid::new_v4();

        let first = repo
            .insert(CreateNotificationRequest {
                user_id: user,
                kind: NotificationKind::Location,
                message: "near pharmacy".to_string(),
                reminder_id: None,
            })
            .await
            .unwrap();
        repo.insert(CreateNotificationRequest {
            user_id: user,
            kind: NotificationKind::Task,
            message: "tea".to_string(),
            reminder_id: None,
        })
        .await
        .unwrap();

        let listed = repo.list_for_user(user, 10).await.unwrap();
        assert_eq!(listed.len(), 2);
        // Newest first.
        assert_eq!(listed[0].message, "tea");

        repo.mark_read(first).await.unwrap();
        let listed = repo.list_for_user(user, 10).await.unwrap();
        assert!(listed.iter().find(|n| n.id == first).unwrap().is_read);
    }

    #[tokio::test]
    async fn test_notifications_list_respects_limit_and_user() {
        let repo = InMemoryNotificationRepository::new();
        let user = Uuid::new_v4();
        for i in 0..5 {
            repo.insert(CreateNotificationRequest {
                user_id: user,
                kind: NotificationKind::Task,
                message: format!("n{}", i),
                reminder_id: None,
            })
            .await
            .unwrap();
        }
        repo.insert(CreateNotificationRequest {
            user_id: Uuid::new_v4(),
            kind: NotificationKind::Task,
            message: "other".to_string(),
            reminder_id: None,
        })
        .await
        .unwrap();

        let listed = repo.list_for_user(user, 3).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.iter().all(|n| n.user_id == user));
    }
}
