//! Core traits for remind abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability. The
//! repository traits cover persistence; the capability traits cover the
//! external collaborators (AI inference, places lookup, speech
//! synthesis) the engine treats as best-effort.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// REMINDER REPOSITORY
// =============================================================================

/// Request for creating a new reminder.
#[derive(Debug, Clone)]
pub struct CreateReminderRequest {
    pub owner_id: Uuid,
    pub kind: ReminderKind,
    pub title: String,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub is_manual_schedule: bool,
    pub schedule_type: ScheduleType,
    pub schedule_days: Vec<u8>,
    pub schedule_time: ScheduleTime,
    pub notification_minutes: Option<i64>,
}

impl CreateReminderRequest {
    /// Enforce per-kind schedule invariants before persistence. A
    /// Meeting always carries a manual one-day schedule; the client's
    /// flags are overridden rather than rejected.
    pub fn normalized(mut self) -> Self {
        if self.kind == ReminderKind::Meeting {
            self.is_manual_schedule = true;
            self.schedule_type = ScheduleType::OneDay;
            self.schedule_days = vec![];
            self.schedule_time.fixed_time = None;
        }
        self
    }
}

/// Repository for reminder persistence.
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    /// Insert a new reminder.
    async fn insert(&self, req: CreateReminderRequest) -> Result<Uuid>;

    /// Fetch a reminder by ID.
    async fn fetch(&self, id: Uuid) -> Result<Reminder>;

    /// Fetch a reminder by ID, verifying ownership. A reminder owned by
    /// someone else is indistinguishable from an absent one.
    async fn fetch_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Reminder>;

    /// List all reminders for an owner.
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Reminder>>;

    /// List active Location reminders for an owner, in creation order.
    async fn active_location_reminders(&self, owner_id: Uuid) -> Result<Vec<Reminder>>;

    /// List non-completed Task/Meeting reminders with a start time
    /// inside `[from, to]`. Feeds the busy window, the fallback slot
    /// scan, and the collision gate.
    async fn scheduled_between(
        &self,
        owner_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Reminder>>;

    /// Apply a resolver decision to a reminder's schedule fields and
    /// set the `ai_suggested` audit flag.
    async fn apply_schedule(&self, id: Uuid, decision: &ScheduleDecision) -> Result<()>;

    /// Replace the cached notification line.
    async fn set_notification_line(&self, id: Uuid, line: &str) -> Result<()>;

    /// Replace the cached TTS record.
    async fn set_tts(&self, id: Uuid, tts: &TtsRecord) -> Result<()>;

    /// Record a successful location trigger: sets `last_triggered_at`
    /// and `triggered_location`, preserving `Expired` status.
    async fn mark_triggered(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        location: &TriggeredLocation,
    ) -> Result<()>;

    /// Set or clear the completion flag.
    async fn set_completed(&self, id: Uuid, completed: bool) -> Result<()>;

    /// Delete a reminder.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// NOTIFICATION REPOSITORY
// =============================================================================

/// Request for creating a notification record.
#[derive(Debug, Clone)]
pub struct CreateNotificationRequest {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub reminder_id: Option<Uuid>,
}

/// Repository for notification event records.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert a new notification.
    async fn insert(&self, req: CreateNotificationRequest) -> Result<Uuid>;

    /// List notifications for a user, newest first.
    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>>;

    /// Mark a notification as read. The only permitted mutation.
    async fn mark_read(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// AI CAPABILITIES
// =============================================================================

/// Backend for AI schedule suggestion. Best-effort: errors and `None`
/// results both route the resolver to its deterministic fallback.
#[async_trait]
pub trait ScheduleSuggestionBackend: Send + Sync {
    /// Suggest a schedule for an unscheduled item given the user's busy
    /// window. `Ok(None)` means the capability had no usable answer
    /// (including malformed responses).
    async fn suggest_schedule(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        item: &ScheduleItem,
        busy: &[BusySlot],
    ) -> Result<Option<AiScheduleSuggestion>>;
}

/// Context for generating a notification line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineContext {
    pub first_name: String,
    pub title: String,
    pub kind: ReminderKind,
    /// Name of the matched place, when generating a trigger-specific
    /// line for a Location reminder.
    pub place_name: Option<String>,
}

/// Backend for single-line notification text generation.
#[async_trait]
pub trait NotificationLineBackend: Send + Sync {
    /// Generate a one-line, user-addressed notification string.
    /// Constraints: single line, references the item title, no
    /// date/time content, bounded length.
    async fn generate_line(&self, ctx: &LineContext) -> Result<Option<String>>;
}

// =============================================================================
// SPEECH SYNTHESIS
// =============================================================================

/// Audio produced by a speech backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub audio: Vec<u8>,
    pub content_type: String,
}

/// Backend for text-to-speech synthesis.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Synthesize speech for the given text and voice.
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<SynthesizedAudio>;
}

// =============================================================================
// PLACES LOOKUP
// =============================================================================

/// Backend for keyword-based nearby place resolution.
///
/// Implementations run a two-phase strategy internally: a
/// distance-ranked nearest-match query first, then a radius-bounded
/// query when the first yields nothing.
#[async_trait]
pub trait PlacesBackend: Send + Sync {
    /// Find the single best place matching `keyword` near the given
    /// coordinates. `Ok(None)` means no match.
    async fn find_nearest_by_keyword(
        &self,
        lat: f64,
        lng: f64,
        radius_m: f64,
        keyword: &str,
    ) -> Result<Option<Place>>;
}
