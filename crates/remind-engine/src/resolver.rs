//! Schedule resolver for unscheduled tasks.
//!
//! A Task created without a start time and without a manual schedule is
//! eligible for automatic scheduling. The resolver first asks the AI
//! capability for a suggestion, validates it against the 7-day horizon,
//! and falls back to a deterministic hourly slot scan when the AI path
//! yields nothing usable. AI failures are never fatal here; persistence
//! failures are.

use std::sync::Arc;

use chrono::{DateTime, Duration, Timelike, Utc};
use tracing::{debug, warn};

use remind_core::{
    defaults, temporal, AiScheduleSuggestion, BusySlot, Reminder, Result, ScheduleDecision,
    ScheduleItem, SchedulePath, ScheduleSuggestionBackend, ScheduleType,
};
use remind_core::ReminderRepository;

/// Resolves schedules for reminders that authorize automatic scheduling.
pub struct ScheduleResolver {
    reminders: Arc<dyn ReminderRepository>,
    suggestions: Option<Arc<dyn ScheduleSuggestionBackend>>,
}

impl ScheduleResolver {
    pub fn new(
        reminders: Arc<dyn ReminderRepository>,
        suggestions: Option<Arc<dyn ScheduleSuggestionBackend>>,
    ) -> Self {
        Self {
            reminders,
            suggestions,
        }
    }

    /// Produce a schedule decision for the reminder, or `None` when the
    /// reminder does not authorize automatic scheduling or no slot
    /// exists inside the horizon.
    ///
    /// The decision is not persisted here; the caller applies it.
    pub async fn resolve(
        &self,
        reminder: &Reminder,
        now: DateTime<Utc>,
    ) -> Result<Option<ScheduleDecision>> {
        if !reminder.needs_schedule() {
            debug!(
                subsystem = "engine",
                op = "resolve",
                reminder_id = %reminder.id,
                "reminder does not authorize automatic scheduling"
            );
            return Ok(None);
        }

        let horizon = now + Duration::days(defaults::SCHEDULE_LOOKAHEAD_DAYS);
        let busy_reminders = self
            .reminders
            .scheduled_between(reminder.owner_id, now, horizon)
            .await?;
        let busy: Vec<BusySlot> = busy_reminders
            .iter()
            .filter_map(|r| {
                r.start_time.map(|start_time| BusySlot {
                    title: r.title.clone(),
                    start_time,
                })
            })
            .collect();

        if let Some(backend) = &self.suggestions {
            let item = ScheduleItem {
                title: reminder.title.clone(),
                description: reminder.description.clone(),
            };
            match backend
                .suggest_schedule(reminder.owner_id, now, &item, &busy)
                .await
            {
                Ok(Some(suggestion)) => {
                    if let Some(decision) = validate_suggestion(&suggestion, now, horizon) {
                        debug!(
                            subsystem = "engine",
                            op = "resolve",
                            reminder_id = %reminder.id,
                            path = %decision.path,
                            busy_count = busy.len(),
                            "accepted suggested schedule"
                        );
                        return Ok(Some(decision));
                    }
                    debug!(
                        subsystem = "engine",
                        op = "resolve",
                        reminder_id = %reminder.id,
                        "suggestion failed validation, using fallback"
                    );
                }
                Ok(None) => {
                    debug!(
                        subsystem = "engine",
                        op = "resolve",
                        reminder_id = %reminder.id,
                        "no usable suggestion, using fallback"
                    );
                }
                Err(e) => {
                    warn!(
                        subsystem = "engine",
                        op = "resolve",
                        reminder_id = %reminder.id,
                        error = %e,
                        "schedule suggestion failed, using fallback"
                    );
                }
            }
        }

        let busy_starts: Vec<DateTime<Utc>> = busy.iter().map(|slot| slot.start_time).collect();
        Ok(fallback_slot(now, horizon, &busy_starts).map(|start| ScheduleDecision {
            schedule_type: ScheduleType::OneDay,
            start_time: Some(start),
            schedule_days: vec![],
            fixed_time: None,
            lead_minutes: defaults::DEFAULT_LEAD_MINUTES,
            path: SchedulePath::Fallback,
        }))
    }
}

/// Validate a raw AI suggestion against the scheduling horizon.
///
/// A suggested type different from the reminder's stored type is
/// accepted; the decision overwrites the stored type. One-day times
/// must fall strictly after `now` and at or before `horizon`. Routine
/// suggestions need a well-formed fixed time and in-range weekday
/// indices.
fn validate_suggestion(
    suggestion: &AiScheduleSuggestion,
    now: DateTime<Utc>,
    horizon: DateTime<Utc>,
) -> Option<ScheduleDecision> {
    match suggestion.schedule_type {
        ScheduleType::OneDay => {
            let start = suggestion.start_time?;
            if start <= now || start > horizon {
                return None;
            }
            Some(ScheduleDecision {
                schedule_type: ScheduleType::OneDay,
                start_time: Some(start),
                schedule_days: vec![],
                fixed_time: None,
                lead_minutes: defaults::DEFAULT_LEAD_MINUTES,
                path: SchedulePath::Ai,
            })
        }
        ScheduleType::Routine => {
            let fixed_time = suggestion.fixed_time.clone()?;
            if !temporal::is_valid_fixed_time(&fixed_time) {
                return None;
            }
            let days = temporal::normalize_schedule_days(Some(&suggestion.schedule_days), None)
                .ok()?;
            Some(ScheduleDecision {
                schedule_type: ScheduleType::Routine,
                start_time: None,
                schedule_days: days,
                fixed_time: Some(fixed_time),
                lead_minutes: defaults::DEFAULT_LEAD_MINUTES,
                path: SchedulePath::Ai,
            })
        }
    }
}

/// Deterministic fallback: scan hourly slots from the first whole hour
/// at least one hour out, proposing the first slot inside working hours
/// that no busy reminder starts at exactly.
fn fallback_slot(
    now: DateTime<Utc>,
    horizon: DateTime<Utc>,
    busy_starts: &[DateTime<Utc>],
) -> Option<DateTime<Utc>> {
    let mut slot = temporal::ceil_to_hour(now + Duration::hours(defaults::SCHEDULE_MIN_OFFSET_HOURS));
    while slot <= horizon {
        let hour = slot.hour();
        if hour >= defaults::FALLBACK_DAY_START_HOUR
            && hour < defaults::FALLBACK_DAY_END_HOUR
            && !busy_starts.contains(&slot)
        {
            return Some(slot);
        }
        slot += Duration::hours(1);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use remind_db::InMemoryReminderRepository;
    use remind_inference::MockAssistantBackend;
    use remind_core::{CreateReminderRequest, ReminderKind, ReminderStatus, ScheduleTime};
    use uuid::Uuid;

    fn unscheduled_task(owner: Uuid, title: &str) -> Reminder {
        Reminder {
            id: Uuid::new_v4(),
            owner_id: owner,
            kind: ReminderKind::Task,
            title: title.to_string(),
            description: None,
            start_time: None,
            is_manual_schedule: false,
            schedule_type: ScheduleType::OneDay,
            schedule_days: vec![],
            schedule_time: ScheduleTime::default(),
            notification_minutes: None,
            ai_suggested: false,
            ai_notification_line: None,
            last_triggered_at: None,
            triggered_location: None,
            status: ReminderStatus::Active,
            tts: None,
            is_completed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn busy_task(owner: Uuid, title: &str, start: DateTime<Utc>) -> CreateReminderRequest {
        CreateReminderRequest {
            owner_id: owner,
            kind: ReminderKind::Task,
            title: title.to_string(),
            description: None,
            start_time: Some(start),
            is_manual_schedule: true,
            schedule_type: ScheduleType::OneDay,
            schedule_days: vec![],
            schedule_time: ScheduleTime::default(),
            notification_minutes: None,
        }
    }

    // A Tuesday at 10:30 UTC.
    fn reference_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 9, 10, 30, 0).unwrap()
    }

    fn resolver_with(
        repo: &InMemoryReminderRepository,
        mock: Option<MockAssistantBackend>,
    ) -> ScheduleResolver {
        ScheduleResolver::new(
            Arc::new(repo.clone()),
            mock.map(|m| Arc::new(m) as Arc<dyn ScheduleSuggestionBackend>),
        )
    }

    #[tokio::test]
    async fn test_resolve_skips_manual_and_scheduled_reminders() {
        let repo = InMemoryReminderRepository::new();
        let mock = MockAssistantBackend::new();
        let resolver = resolver_with(&repo, Some(mock.clone()));
        let now = reference_now();

        let mut reminder = unscheduled_task(Uuid::new_v4(), "tea");
        reminder.is_manual_schedule = true;
        assert!(resolver.resolve(&reminder, now).await.unwrap().is_none());

        reminder.is_manual_schedule = false;
        reminder.start_time = Some(now + Duration::days(1));
        assert!(resolver.resolve(&reminder, now).await.unwrap().is_none());

        reminder.start_time = None;
        reminder.kind = ReminderKind::Meeting;
        assert!(resolver.resolve(&reminder, now).await.unwrap().is_none());

        // No capability call was made for ineligible reminders.
        assert_eq!(mock.suggest_call_count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_accepts_valid_one_day_suggestion() {
        let repo = InMemoryReminderRepository::new();
        let now = reference_now();
        let suggested = now + Duration::days(2);
        let mock = MockAssistantBackend::new().with_suggestion(AiScheduleSuggestion {
            schedule_type: ScheduleType::OneDay,
            start_time: Some(suggested),
            schedule_days: vec![],
            fixed_time: None,
        });
        let resolver = resolver_with(&repo, Some(mock));

        let reminder = unscheduled_task(Uuid::new_v4(), "buy a gift");
        let decision = resolver.resolve(&reminder, now).await.unwrap().unwrap();
        assert_eq!(decision.path, SchedulePath::Ai);
        assert_eq!(decision.start_time, Some(suggested));
        assert_eq!(decision.lead_minutes, defaults::DEFAULT_LEAD_MINUTES);
    }

    #[tokio::test]
    async fn test_resolve_accepts_routine_suggestion_for_one_day_reminder() {
        let repo = InMemoryReminderRepository::new();
        let now = reference_now();
        let mock = MockAssistantBackend::new().with_suggestion(AiScheduleSuggestion {
            schedule_type: ScheduleType::Routine,
            start_time: None,
            schedule_days: vec![5, 1, 3],
            fixed_time: Some("07:30".to_string()),
        });
        let resolver = resolver_with(&repo, Some(mock));

        let reminder = unscheduled_task(Uuid::new_v4(), "morning run");
        let decision = resolver.resolve(&reminder, now).await.unwrap().unwrap();
        assert_eq!(decision.schedule_type, ScheduleType::Routine);
        assert_eq!(decision.schedule_days, vec![1, 3, 5]);
        assert_eq!(decision.fixed_time.as_deref(), Some("07:30"));
        assert!(decision.start_time.is_none());
        assert_eq!(decision.path, SchedulePath::Ai);
    }

    #[tokio::test]
    async fn test_resolve_rejects_past_suggestion_and_falls_back() {
        let repo = InMemoryReminderRepository::new();
        let now = reference_now();
        let mock = MockAssistantBackend::new().with_suggestion(AiScheduleSuggestion {
            schedule_type: ScheduleType::OneDay,
            start_time: Some(now - Duration::hours(1)),
            schedule_days: vec![],
            fixed_time: None,
        });
        let resolver = resolver_with(&repo, Some(mock));

        let reminder = unscheduled_task(Uuid::new_v4(), "tea");
        let decision = resolver.resolve(&reminder, now).await.unwrap().unwrap();
        assert_eq!(decision.path, SchedulePath::Fallback);
    }

    #[tokio::test]
    async fn test_resolve_rejects_suggestion_beyond_horizon() {
        let repo = InMemoryReminderRepository::new();
        let now = reference_now();
        let mock = MockAssistantBackend::new().with_suggestion(AiScheduleSuggestion {
            schedule_type: ScheduleType::OneDay,
            start_time: Some(now + Duration::days(8)),
            schedule_days: vec![],
            fixed_time: None,
        });
        let resolver = resolver_with(&repo, Some(mock));

        let reminder = unscheduled_task(Uuid::new_v4(), "tea");
        let decision = resolver.resolve(&reminder, now).await.unwrap().unwrap();
        assert_eq!(decision.path, SchedulePath::Fallback);
    }

    #[tokio::test]
    async fn test_resolve_rejects_malformed_routine_suggestion() {
        let repo = InMemoryReminderRepository::new();
        let now = reference_now();
        let mock = MockAssistantBackend::new().with_suggestion(AiScheduleSuggestion {
            schedule_type: ScheduleType::Routine,
            start_time: None,
            schedule_days: vec![2],
            fixed_time: Some("25:00".to_string()),
        });
        let resolver = resolver_with(&repo, Some(mock));

        let reminder = unscheduled_task(Uuid::new_v4(), "tea");
        let decision = resolver.resolve(&reminder, now).await.unwrap().unwrap();
        assert_eq!(decision.path, SchedulePath::Fallback);
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_backend_error() {
        let repo = InMemoryReminderRepository::new();
        let now = reference_now();
        let mock = MockAssistantBackend::new().failing_schedule();
        let resolver = resolver_with(&repo, Some(mock));

        let reminder = unscheduled_task(Uuid::new_v4(), "tea");
        let decision = resolver.resolve(&reminder, now).await.unwrap().unwrap();
        assert_eq!(decision.path, SchedulePath::Fallback);
        // now is 10:30, so the first candidate slot is 12:00.
        assert_eq!(
            decision.start_time,
            Some(Utc.with_ymd_and_hms(2024, 1, 9, 12, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_resolve_without_backend_uses_fallback() {
        let repo = InMemoryReminderRepository::new();
        let resolver = resolver_with(&repo, None);
        let now = reference_now();

        let reminder = unscheduled_task(Uuid::new_v4(), "tea");
        let decision = resolver.resolve(&reminder, now).await.unwrap().unwrap();
        assert_eq!(decision.path, SchedulePath::Fallback);
        assert_eq!(decision.schedule_type, ScheduleType::OneDay);
    }

    #[tokio::test]
    async fn test_fallback_skips_busy_slots() {
        let repo = InMemoryReminderRepository::new();
        let owner = Uuid::new_v4();
        let now = reference_now();
        // Occupy 12:00 and 13:00; first free working-hours slot is 14:00.
        let noon = Utc.with_ymd_and_hms(2024, 1, 9, 12, 0, 0).unwrap();
        repo.insert(busy_task(owner, "standup", noon)).await.unwrap();
        repo.insert(busy_task(owner, "review", noon + Duration::hours(1)))
            .await
            .unwrap();

        let resolver = resolver_with(&repo, None);
        let reminder = unscheduled_task(owner, "tea");
        let decision = resolver.resolve(&reminder, now).await.unwrap().unwrap();
        assert_eq!(
            decision.start_time,
            Some(Utc.with_ymd_and_hms(2024, 1, 9, 14, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_fallback_rolls_into_next_day_after_hours() {
        // 17:40, so the ceiled candidate 19:00 is outside working hours
        // and the scan rolls to 09:00 the next day.
        let now = Utc.with_ymd_and_hms(2024, 1, 9, 17, 40, 0).unwrap();
        let horizon = now + Duration::days(7);
        let slot = fallback_slot(now, horizon, &[]).unwrap();
        assert_eq!(slot, Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_fallback_respects_min_offset() {
        let now = Utc.with_ymd_and_hms(2024, 1, 9, 10, 30, 0).unwrap();
        let horizon = now + Duration::days(7);
        let slot = fallback_slot(now, horizon, &[]).unwrap();
        assert!(slot >= now + Duration::hours(1));
        assert_eq!(slot, Utc.with_ymd_and_hms(2024, 1, 9, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_fallback_none_when_every_slot_busy() {
        let now = Utc.with_ymd_and_hms(2024, 1, 9, 10, 0, 0).unwrap();
        let horizon = now + Duration::hours(2);
        // Both candidate slots (11:00, 12:00) are taken.
        let busy = vec![
            Utc.with_ymd_and_hms(2024, 1, 9, 11, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 9, 12, 0, 0).unwrap(),
        ];
        assert!(fallback_slot(now, horizon, &busy).is_none());
    }

    #[tokio::test]
    async fn test_busy_window_excludes_other_owners() {
        let repo = InMemoryReminderRepository::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let now = reference_now();
        let noon = Utc.with_ymd_and_hms(2024, 1, 9, 12, 0, 0).unwrap();
        repo.insert(busy_task(other, "their meeting", noon))
            .await
            .unwrap();

        let resolver = resolver_with(&repo, None);
        let reminder = unscheduled_task(owner, "tea");
        let decision = resolver.resolve(&reminder, now).await.unwrap().unwrap();
        // Another user's reminder does not block the slot.
        assert_eq!(decision.start_time, Some(noon));
    }
}
