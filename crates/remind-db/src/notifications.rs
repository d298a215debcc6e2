//! Notification repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use remind_core::{
    CreateNotificationRequest, Error, Notification, NotificationKind, NotificationRepository,
    Result,
};

/// PostgreSQL implementation of NotificationRepository.
#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: Pool<Postgres>,
}

impl PgNotificationRepository {
    /// Create a new PgNotificationRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<Notification> {
        let kind_s: String = row.try_get("kind")?;
        let kind = NotificationKind::parse(&kind_s)
            .ok_or_else(|| Error::Internal(format!("unknown notification kind: {}", kind_s)))?;

        Ok(Notification {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            kind,
            message: row.try_get("message")?,
            reminder_id: row.try_get("reminder_id")?,
            is_read: row.try_get("is_read")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn insert(&self, req: CreateNotificationRequest) -> Result<Uuid> {
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO notifications (id, user_id, kind, message, reminder_id, is_read, created_at) \
             VALUES ($1, $2, $3, $4, $5, false, now())",
        )
        .bind(id)
        .bind(req.user_id)
        .bind(req.kind.as_str())
        .bind(&req.message)
        .bind(req.reminder_id)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT id, user_id, kind, message, reminder_id, is_read, created_at \
             FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn mark_read(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE notifications SET is_read = true WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("notification {}", id)));
        }
        Ok(())
    }
}
