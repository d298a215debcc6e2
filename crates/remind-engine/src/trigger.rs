//! Location-scan trigger engine.
//!
//! A client reports its position; every active Location reminder for
//! that user runs through a filter chain (weekday, anti-spam throttle,
//! keyword, place lookup, distance, collision) and either fires or is
//! skipped with a machine-readable reason. Candidates are independent:
//! a capability failure on one never blocks the rest of the batch.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use remind_core::{
    defaults, geo, temporal, CreateNotificationRequest, LineContext, NotificationLineBackend,
    NotificationRepository, Place, PlacesBackend, Reminder, ReminderRepository, Result,
    SpeechBackend, TriggeredLocation, UserProfile,
};

use crate::enrich::{fallback_line, speech_stage};

/// Why a candidate reminder did not fire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The reminder is not active on the scan weekday.
    DayMismatch,
    /// The anti-spam window since the last trigger has not elapsed.
    AntiSpamWindow,
    /// The reminder title is empty after trimming, so there is no
    /// lookup keyword.
    NoKeyword,
    /// Place lookup failed or matched nothing.
    PlacesError,
    /// The matched place is beyond the effective trigger distance.
    TooFar,
    /// Another scheduled reminder falls inside the collision window.
    Collision { retry_after_minutes: i64 },
}

impl SkipReason {
    /// Stable reason code for logs and clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DayMismatch => "day_mismatch",
            Self::AntiSpamWindow => "anti_spam_window",
            Self::NoKeyword => "no_keyword",
            Self::PlacesError => "places_error",
            Self::TooFar => "too_far",
            Self::Collision { .. } => "collision",
        }
    }
}

/// Per-candidate result of a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanResult {
    Triggered {
        place: Place,
        distance_m: f64,
        line: String,
    },
    Skipped {
        reason: SkipReason,
    },
}

/// One candidate's outcome within a scan batch.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub reminder_id: Uuid,
    pub title: String,
    pub result: ScanResult,
}

/// A position report from a client.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub user: UserProfile,
    pub lat: f64,
    pub lng: f64,
    /// Caller override for the trigger distance; clamped to the floor.
    pub radius_m: Option<f64>,
}

/// Tunables for the trigger engine.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    pub max_distance_m: f64,
    pub poll_interval: StdDuration,
    pub poll_ceiling: StdDuration,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            max_distance_m: defaults::MAX_TRIGGER_DISTANCE_METERS,
            poll_interval: StdDuration::from_millis(defaults::TTS_POLL_INTERVAL_MS),
            poll_ceiling: StdDuration::from_millis(defaults::TTS_POLL_CEILING_MS),
        }
    }
}

/// Evaluates position reports against active Location reminders.
pub struct LocationTriggerEngine {
    reminders: Arc<dyn ReminderRepository>,
    notifications: Arc<dyn NotificationRepository>,
    places: Arc<dyn PlacesBackend>,
    lines: Option<Arc<dyn NotificationLineBackend>>,
    speech: Option<Arc<dyn SpeechBackend>>,
    config: TriggerConfig,
}

impl LocationTriggerEngine {
    pub fn new(
        reminders: Arc<dyn ReminderRepository>,
        notifications: Arc<dyn NotificationRepository>,
        places: Arc<dyn PlacesBackend>,
        lines: Option<Arc<dyn NotificationLineBackend>>,
        speech: Option<Arc<dyn SpeechBackend>>,
    ) -> Self {
        Self {
            reminders,
            notifications,
            places,
            lines,
            speech,
            config: TriggerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TriggerConfig) -> Self {
        self.config = config;
        self
    }

    /// Evaluate a position report now.
    pub async fn scan(&self, req: &ScanRequest) -> Result<Vec<ScanOutcome>> {
        self.scan_at(req, Utc::now()).await
    }

    /// Evaluate a position report against an explicit reference time.
    /// `scan` delegates here; replaying historical reports uses it
    /// directly.
    pub async fn scan_at(
        &self,
        req: &ScanRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScanOutcome>> {
        geo::validate_coordinates(req.lat, req.lng)?;
        let max_distance = req
            .radius_m
            .unwrap_or(self.config.max_distance_m)
            .max(defaults::MIN_TRIGGER_DISTANCE_METERS);

        let candidates = self.reminders.active_location_reminders(req.user.id).await?;
        let today = temporal::weekday_index(now);
        let mut outcomes = Vec::with_capacity(candidates.len());

        for candidate in &candidates {
            let result = self
                .evaluate(candidate, req, now, today, max_distance)
                .await?;
            match &result {
                ScanResult::Triggered { distance_m, .. } => {
                    info!(
                        subsystem = "engine",
                        op = "scan",
                        reminder_id = %candidate.id,
                        user_id = %req.user.id,
                        distance_m = *distance_m,
                        "location reminder triggered"
                    );
                }
                ScanResult::Skipped { reason } => {
                    debug!(
                        subsystem = "engine",
                        op = "scan",
                        reminder_id = %candidate.id,
                        skip_reason = reason.code(),
                        "candidate skipped"
                    );
                }
            }
            outcomes.push(ScanOutcome {
                reminder_id: candidate.id,
                title: candidate.title.clone(),
                result,
            });
        }

        info!(
            subsystem = "engine",
            op = "scan",
            user_id = %req.user.id,
            candidate_count = candidates.len(),
            "scan finished"
        );
        Ok(outcomes)
    }

    async fn evaluate(
        &self,
        reminder: &Reminder,
        req: &ScanRequest,
        now: DateTime<Utc>,
        today: u8,
        max_distance: f64,
    ) -> Result<ScanResult> {
        if !reminder.active_on(today) {
            return Ok(skipped(SkipReason::DayMismatch));
        }
        if reminder.is_throttled(now) {
            return Ok(skipped(SkipReason::AntiSpamWindow));
        }

        let keyword = reminder.title.trim();
        if keyword.is_empty() {
            return Ok(skipped(SkipReason::NoKeyword));
        }

        let place = match self
            .places
            .find_nearest_by_keyword(req.lat, req.lng, max_distance, keyword)
            .await
        {
            Ok(Some(place)) => place,
            Ok(None) => return Ok(skipped(SkipReason::PlacesError)),
            Err(e) => {
                warn!(
                    subsystem = "engine",
                    op = "scan",
                    reminder_id = %reminder.id,
                    error = %e,
                    "place lookup failed"
                );
                return Ok(skipped(SkipReason::PlacesError));
            }
        };

        let distance = geo::haversine_meters(req.lat, req.lng, place.lat, place.lng);
        // Rounded to whole meters so a place sitting right at the limit
        // still fires.
        if distance.round() > max_distance {
            debug!(
                subsystem = "engine",
                op = "scan",
                reminder_id = %reminder.id,
                distance_m = distance,
                "matched place too far"
            );
            return Ok(skipped(SkipReason::TooFar));
        }

        let window = Duration::minutes(defaults::COLLISION_WINDOW_MINUTES);
        let busy = self
            .reminders
            .scheduled_between(req.user.id, now - window, now + window)
            .await?;
        if !busy.is_empty() {
            return Ok(skipped(SkipReason::Collision {
                retry_after_minutes: defaults::COLLISION_RETRY_MINUTES,
            }));
        }

        let line = self.fire(reminder, &req.user, now, &place).await?;
        Ok(ScanResult::Triggered {
            place,
            distance_m: distance,
            line,
        })
    }

    /// Record the trigger and run the best-effort notification steps:
    /// a place-specific line, cached audio, and the notification record.
    async fn fire(
        &self,
        reminder: &Reminder,
        user: &UserProfile,
        now: DateTime<Utc>,
        place: &Place,
    ) -> Result<String> {
        let location = TriggeredLocation {
            place_id: place.id.clone(),
            name: place.name.clone(),
            lat: place.lat,
            lng: place.lng,
            rating: place.rating,
        };
        self.reminders.mark_triggered(reminder.id, now, &location).await?;

        if let Some(backend) = &self.lines {
            let ctx = LineContext {
                first_name: user.first_name.clone(),
                title: reminder.title.clone(),
                kind: reminder.kind,
                place_name: Some(place.name.clone()),
            };
            match backend.generate_line(&ctx).await {
                Ok(Some(line)) if !line.trim().is_empty() => {
                    if let Err(e) = self.reminders.set_notification_line(reminder.id, &line).await {
                        warn!(
                            subsystem = "engine",
                            op = "trigger",
                            reminder_id = %reminder.id,
                            error = %e,
                            "failed to persist trigger line"
                        );
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        subsystem = "engine",
                        op = "trigger",
                        reminder_id = %reminder.id,
                        error = %e,
                        "trigger line generation failed"
                    );
                }
            }
        }

        let line = match self.await_line(reminder.id).await {
            Some(line) => line,
            None => fallback_line(
                reminder.kind,
                &user.first_name,
                &reminder.title,
                Some(&place.name),
            ),
        };

        let speech = speech_stage(
            self.reminders.as_ref(),
            self.speech.as_deref(),
            reminder.id,
            &line,
            user.voice(),
        )
        .await;
        debug!(
            subsystem = "engine",
            op = "trigger",
            reminder_id = %reminder.id,
            speech = ?speech,
            "trigger speech stage finished"
        );

        if let Err(e) = self
            .notifications
            .insert(CreateNotificationRequest {
                user_id: user.id,
                kind: reminder.kind.into(),
                message: line.clone(),
                reminder_id: Some(reminder.id),
            })
            .await
        {
            warn!(
                subsystem = "engine",
                op = "trigger",
                reminder_id = %reminder.id,
                error = %e,
                "failed to record notification"
            );
        }

        Ok(line)
    }

    /// Bounded poll for the reminder's notification line. The line may
    /// arrive from the enrichment worker rather than the trigger path,
    /// so the poll re-reads the store instead of trusting local state.
    async fn await_line(&self, reminder_id: Uuid) -> Option<String> {
        let deadline = Instant::now() + self.config.poll_ceiling;
        loop {
            if let Ok(reminder) = self.reminders.fetch(reminder_id).await {
                if let Some(line) = reminder.ai_notification_line {
                    if !line.trim().is_empty() {
                        return Some(line);
                    }
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            sleep(self.config.poll_interval).await;
        }
    }
}

fn skipped(reason: SkipReason) -> ScanResult {
    ScanResult::Skipped { reason }
}
