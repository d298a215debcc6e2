//! Reminder repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use remind_core::{
    CreateReminderRequest, Error, Reminder, ReminderKind, ReminderRepository, ReminderStatus,
    Result, ScheduleDecision, ScheduleTime, ScheduleType, TriggeredLocation, TtsRecord,
};

/// PostgreSQL implementation of ReminderRepository.
#[derive(Clone)]
pub struct PgReminderRepository {
    pool: Pool<Postgres>,
}

impl PgReminderRepository {
    /// Create a new PgReminderRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<Reminder> {
        let kind_s: String = row.try_get("kind")?;
        let kind = ReminderKind::parse(&kind_s)
            .ok_or_else(|| Error::Internal(format!("unknown reminder kind: {}", kind_s)))?;

        let schedule_type_s: String = row.try_get("schedule_type")?;
        let schedule_type = ScheduleType::parse(&schedule_type_s)
            .ok_or_else(|| Error::Internal(format!("unknown schedule type: {}", schedule_type_s)))?;

        let status_s: String = row.try_get("status")?;
        let status = ReminderStatus::parse(&status_s)
            .ok_or_else(|| Error::Internal(format!("unknown status: {}", status_s)))?;

        // The schema CHECK keeps elements in 0..=6; reject anything
        // else rather than aliasing a weekday through a lossy cast.
        let schedule_days: Vec<u8> = row
            .try_get::<Vec<i32>, _>("schedule_days")?
            .into_iter()
            .map(|d| {
                u8::try_from(d)
                    .ok()
                    .filter(|&d| d <= 6)
                    .ok_or_else(|| Error::Internal(format!("weekday index out of range: {}", d)))
            })
            .collect::<Result<_>>()?;
        let schedule_time: ScheduleTime =
            serde_json::from_value(row.try_get::<serde_json::Value, _>("schedule_time")?)?;

        let triggered_location: Option<TriggeredLocation> = row
            .try_get::<Option<serde_json::Value>, _>("triggered_location")?
            .map(serde_json::from_value)
            .transpose()?;

        // TTS metadata lives in jsonb; the audio blob is a separate
        // bytea column spliced back in here.
        let tts: Option<TtsRecord> = match row.try_get::<Option<serde_json::Value>, _>("tts")? {
            Some(value) => {
                let mut record: TtsRecord = serde_json::from_value(value)?;
                record.audio = row
                    .try_get::<Option<Vec<u8>>, _>("tts_audio")?
                    .unwrap_or_default();
                Some(record)
            }
            None => None,
        };

        Ok(Reminder {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            kind,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            start_time: row.try_get("start_time")?,
            is_manual_schedule: row.try_get("is_manual_schedule")?,
            schedule_type,
            schedule_days,
            schedule_time,
            notification_minutes: row.try_get("notification_minutes")?,
            ai_suggested: row.try_get("ai_suggested")?,
            ai_notification_line: row.try_get("ai_notification_line")?,
            last_triggered_at: row.try_get("last_triggered_at")?,
            triggered_location,
            status,
            tts,
            is_completed: row.try_get("is_completed")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

const SELECT_COLUMNS: &str = "id, owner_id, kind, title, description, start_time, \
     is_manual_schedule, schedule_type, schedule_days, schedule_time, \
     notification_minutes, ai_suggested, ai_notification_line, \
     last_triggered_at, triggered_location, status, tts, tts_audio, \
     is_completed, created_at, updated_at";

#[async_trait]
impl ReminderRepository for PgReminderRepository {
    async fn insert(&self, req: CreateReminderRequest) -> Result<Uuid> {
        let req = req.normalized();
        let id = Uuid::new_v4();
        let days: Vec<i32> = req.schedule_days.iter().map(|&d| d as i32).collect();
        let schedule_time = serde_json::to_value(&req.schedule_time)?;

        sqlx::query(
            "INSERT INTO reminders \
             (id, owner_id, kind, title, description, start_time, \
              is_manual_schedule, schedule_type, schedule_days, schedule_time, \
              notification_minutes, ai_suggested, status, is_completed, \
              created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, false, 'active', false, now(), now())",
        )
        .bind(id)
        .bind(req.owner_id)
        .bind(req.kind.as_str())
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.start_time)
        .bind(req.is_manual_schedule)
        .bind(req.schedule_type.as_str())
        .bind(&days)
        .bind(schedule_time)
        .bind(req.notification_minutes)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<Reminder> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM reminders WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::ReminderNotFound(id))?;

        Self::map_row(&row)
    }

    async fn fetch_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Reminder> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM reminders WHERE id = $1 AND owner_id = $2",
            SELECT_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::ReminderNotFound(id))?;

        Self::map_row(&row)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Reminder>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM reminders WHERE owner_id = $1 ORDER BY created_at",
            SELECT_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn active_location_reminders(&self, owner_id: Uuid) -> Result<Vec<Reminder>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM reminders \
             WHERE owner_id = $1 AND kind = 'location' AND status = 'active' \
               AND NOT is_completed \
             ORDER BY created_at",
            SELECT_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn scheduled_between(
        &self,
        owner_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Reminder>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM reminders \
             WHERE owner_id = $1 AND kind IN ('task', 'meeting') \
               AND NOT is_completed \
               AND start_time IS NOT NULL \
               AND start_time >= $2 AND start_time <= $3 \
             ORDER BY start_time",
            SELECT_COLUMNS
        ))
        .bind(owner_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn apply_schedule(&self, id: Uuid, decision: &ScheduleDecision) -> Result<()> {
        let days: Vec<i32> = decision.schedule_days.iter().map(|&d| d as i32).collect();
        let schedule_time = serde_json::to_value(ScheduleTime {
            minutes_before_start: (decision.schedule_type == ScheduleType::OneDay)
                .then_some(decision.lead_minutes),
            fixed_time: decision.fixed_time.clone(),
        })?;

        let result = sqlx::query(
            "UPDATE reminders SET \
               start_time = $2, schedule_type = $3, schedule_days = $4, \
               schedule_time = $5, notification_minutes = $6, \
               ai_suggested = true, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(decision.start_time)
        .bind(decision.schedule_type.as_str())
        .bind(&days)
        .bind(schedule_time)
        .bind(decision.lead_minutes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ReminderNotFound(id));
        }
        Ok(())
    }

    async fn set_notification_line(&self, id: Uuid, line: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE reminders SET ai_notification_line = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(line)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ReminderNotFound(id));
        }
        Ok(())
    }

    async fn set_tts(&self, id: Uuid, tts: &TtsRecord) -> Result<()> {
        let metadata = serde_json::to_value(tts)?;

        let result = sqlx::query(
            "UPDATE reminders SET tts = $2, tts_audio = $3, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(metadata)
        .bind(&tts.audio)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ReminderNotFound(id));
        }
        Ok(())
    }

    async fn mark_triggered(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        location: &TriggeredLocation,
    ) -> Result<()> {
        let location = serde_json::to_value(location)?;

        // Expired reminders keep their status; everything else is
        // confirmed active by a successful trigger.
        let result = sqlx::query(
            "UPDATE reminders SET \
               last_triggered_at = $2, triggered_location = $3, \
               status = CASE WHEN status = 'expired' THEN status ELSE 'active' END, \
               updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .bind(location)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ReminderNotFound(id));
        }
        Ok(())
    }

    async fn set_completed(&self, id: Uuid, completed: bool) -> Result<()> {
        let result =
            sqlx::query("UPDATE reminders SET is_completed = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(completed)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ReminderNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM reminders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ReminderNotFound(id));
        }
        Ok(())
    }
}
