//! # remind-db
//!
//! PostgreSQL persistence layer for the remind backend.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for reminders and notifications
//! - In-memory repository implementations for tests and embedders
//!
//! ## Example
//!
//! ```rust,ignore
//! use remind_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/remind").await?;
//!     let reminders = db.reminders.list_by_owner(owner_id).await?;
//!     Ok(())
//! }
//! ```

pub mod memory;
pub mod notifications;
pub mod pool;
pub mod reminders;

// Re-export core types
pub use remind_core::*;

pub use memory::{InMemoryNotificationRepository, InMemoryReminderRepository};
pub use notifications::PgNotificationRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use reminders::PgReminderRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Reminder repository.
    pub reminders: PgReminderRepository,
    /// Notification repository.
    pub notifications: PgNotificationRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            reminders: PgReminderRepository::new(pool.clone()),
            notifications: PgNotificationRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }
}
