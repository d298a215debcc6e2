//! Core data models for the remind backend.
//!
//! These types are shared across all remind crates and represent the
//! central domain entities: reminders, notifications, and the structured
//! decisions produced by the scheduling core.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::defaults;

// =============================================================================
// REMINDER TYPES
// =============================================================================

/// Kind of reminder, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    Task,
    Meeting,
    Location,
}

impl ReminderKind {
    /// Stable string form used by the database layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Meeting => "meeting",
            Self::Location => "location",
        }
    }

    /// Parse the database string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "task" => Some(Self::Task),
            "meeting" => Some(Self::Meeting),
            "location" => Some(Self::Location),
            _ => None,
        }
    }
}

/// Recurrence shape of a reminder's schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    /// A single absolute-time occurrence.
    OneDay,
    /// Recurs on `schedule_days` at a fixed clock time.
    Routine,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "one_day",
            Self::Routine => "routine",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "one_day" => Some(Self::OneDay),
            "routine" => Some(Self::Routine),
            _ => None,
        }
    }
}

/// Lifecycle status of a Location reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Active,
    Expired,
    Completed,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "expired" => Some(Self::Expired),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// When, relative to an occurrence, the notification should fire.
///
/// One-day schedules use `minutes_before_start`; routine schedules use
/// `fixed_time` as a daily clock time ("HH:mm").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes_before_start: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_time: Option<String>,
}

/// Place matched by the last successful location trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredLocation {
    pub place_id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
}

/// Synthesis state of a cached TTS record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtsStatus {
    Pending,
    Ready,
    Failed,
}

impl TtsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "ready" => Some(Self::Ready),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Cached synthesized audio for a reminder's notification line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsRecord {
    pub voice_id: String,
    /// Fingerprint of `(voice_id, notification_text)`; see
    /// [`text_fingerprint`].
    pub text_hash: String,
    #[serde(default, skip_serializing)]
    pub audio: Vec<u8>,
    pub audio_bytes: i64,
    pub status: TtsStatus,
    pub generated_at: DateTime<Utc>,
}

impl TtsRecord {
    /// Whether this record already holds valid audio for the given
    /// fingerprint, so synthesis can be skipped.
    pub fn is_fresh(&self, hash: &str) -> bool {
        self.status == TtsStatus::Ready && !self.audio.is_empty() && self.text_hash == hash
    }
}

/// Content fingerprint of `(voice_id, text)`, hex-encoded SHA-256.
///
/// Used to detect staleness of cached audio and avoid redundant
/// regeneration.
pub fn text_fingerprint(voice_id: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(voice_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Central reminder entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub kind: ReminderKind,
    pub title: String,
    pub description: Option<String>,
    /// Absolute UTC occurrence time. Required for Meeting; optional for
    /// Task (absence authorizes AI inference); unused for Location.
    pub start_time: Option<DateTime<Utc>>,
    /// True when the user (or a deterministic rule) fixed the schedule.
    /// False authorizes the resolver to write schedule fields.
    pub is_manual_schedule: bool,
    pub schedule_type: ScheduleType,
    /// Weekday indices, 0=Sunday..6=Saturday. Empty means "every day".
    pub schedule_days: Vec<u8>,
    pub schedule_time: ScheduleTime,
    /// Per-item lead-time override in minutes.
    pub notification_minutes: Option<i64>,
    /// Audit flag: some field was filled by the inference pipeline.
    pub ai_suggested: bool,
    /// Cached notification line; authoritative once present.
    pub ai_notification_line: Option<String>,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub triggered_location: Option<TriggeredLocation>,
    pub status: ReminderStatus,
    pub tts: Option<TtsRecord>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    /// Whether the anti-spam window still blocks a location trigger.
    ///
    /// The boundary is inclusive of the window end: exactly 90 minutes
    /// after the last trigger the throttle no longer blocks.
    pub fn is_throttled(&self, now: DateTime<Utc>) -> bool {
        match self.last_triggered_at {
            Some(last) => now - last < Duration::minutes(defaults::ANTI_SPAM_WINDOW_MINUTES),
            None => false,
        }
    }

    /// Whether this reminder is active on the given weekday index
    /// (0=Sunday..6=Saturday). An empty day set means every day.
    pub fn active_on(&self, weekday: u8) -> bool {
        self.schedule_days.is_empty() || self.schedule_days.contains(&weekday)
    }

    /// Whether the schedule resolver is authorized to fill in a time
    /// for this reminder.
    pub fn needs_schedule(&self) -> bool {
        self.kind == ReminderKind::Task && !self.is_manual_schedule && self.start_time.is_none()
    }
}

// =============================================================================
// NOTIFICATION TYPES
// =============================================================================

/// Kind of a notification event, mirroring the reminder kind that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Task,
    Meeting,
    Location,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Meeting => "meeting",
            Self::Location => "location",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "task" => Some(Self::Task),
            "meeting" => Some(Self::Meeting),
            "location" => Some(Self::Location),
            _ => None,
        }
    }
}

impl From<ReminderKind> for NotificationKind {
    fn from(kind: ReminderKind) -> Self {
        match kind {
            ReminderKind::Task => Self::Task,
            ReminderKind::Meeting => Self::Meeting,
            ReminderKind::Location => Self::Location,
        }
    }
}

/// Durable record of a user-visible notification event.
///
/// Immutable once created, except for the `is_read` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub reminder_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// USER PROFILE
// =============================================================================

/// The slice of user data the enrichment pipeline needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub first_name: String,
    /// Preferred TTS voice; falls back to [`defaults::DEFAULT_VOICE_ID`].
    pub voice_id: Option<String>,
}

impl UserProfile {
    /// Effective voice for speech synthesis.
    pub fn voice(&self) -> &str {
        self.voice_id.as_deref().unwrap_or(defaults::DEFAULT_VOICE_ID)
    }
}

// =============================================================================
// SCHEDULING DECISIONS
// =============================================================================

/// Which path produced a schedule decision or notification line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulePath {
    /// AI-backed inference produced the result.
    Ai,
    /// The deterministic heuristic produced the result.
    Fallback,
}

impl std::fmt::Display for SchedulePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ai => write!(f, "ai"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Concrete schedule produced by the resolver, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDecision {
    pub schedule_type: ScheduleType,
    pub start_time: Option<DateTime<Utc>>,
    pub schedule_days: Vec<u8>,
    pub fixed_time: Option<String>,
    pub lead_minutes: i64,
    pub path: SchedulePath,
}

/// An occupied slot in the user's 7-day lookahead, fed to AI inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusySlot {
    pub title: String,
    pub start_time: DateTime<Utc>,
}

/// The item being scheduled, as presented to the AI capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub title: String,
    pub description: Option<String>,
}

/// Raw structured decision returned by the AI schedule capability,
/// before validation by the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiScheduleSuggestion {
    pub schedule_type: ScheduleType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub schedule_days: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_time: Option<String>,
}

// =============================================================================
// PLACES
// =============================================================================

/// A place resolved by the places-lookup capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub rating: Option<f32>,
    pub lat: f64,
    pub lng: f64,
}
