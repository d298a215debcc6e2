//! Post-creation enrichment pipeline.
//!
//! Runs three stages over a stored reminder: schedule resolution,
//! notification-line generation, and speech synthesis. Capability
//! failures degrade to fallbacks or skipped stages; only persistence
//! failures abort the pipeline. Each stage's outcome is reported so
//! callers can log what actually happened.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use remind_core::{
    defaults, text_fingerprint, LineContext, NotificationLineBackend, Reminder, ReminderKind,
    ReminderRepository, Result, SchedulePath, SpeechBackend, TtsRecord, TtsStatus, UserProfile,
};

use crate::resolver::ScheduleResolver;

/// Outcome of the schedule and line stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The AI capability produced the result.
    Ai,
    /// The deterministic fallback produced the result.
    Fallback,
    /// The stage did not apply to this reminder.
    Skipped,
}

impl From<SchedulePath> for StageOutcome {
    fn from(path: SchedulePath) -> Self {
        match path {
            SchedulePath::Ai => Self::Ai,
            SchedulePath::Fallback => Self::Fallback,
        }
    }
}

/// Outcome of the speech stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// Fresh audio was synthesized and cached.
    Generated,
    /// Cached audio already matched the current line and voice.
    CachedHit,
    /// No backend configured, or the reminder has no occurrence time.
    Skipped,
    /// Synthesis failed; the cached record is marked failed.
    Failed(String),
}

/// What each stage of an enrichment run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentReport {
    pub schedule: StageOutcome,
    pub line: StageOutcome,
    pub speech: SpeechOutcome,
}

/// Orchestrates the three enrichment stages against the repositories
/// and capability backends.
pub struct EnrichmentPipeline {
    reminders: Arc<dyn ReminderRepository>,
    resolver: ScheduleResolver,
    lines: Option<Arc<dyn NotificationLineBackend>>,
    speech: Option<Arc<dyn SpeechBackend>>,
}

impl EnrichmentPipeline {
    pub fn new(
        reminders: Arc<dyn ReminderRepository>,
        resolver: ScheduleResolver,
        lines: Option<Arc<dyn NotificationLineBackend>>,
        speech: Option<Arc<dyn SpeechBackend>>,
    ) -> Self {
        Self {
            reminders,
            resolver,
            lines,
            speech,
        }
    }

    /// Enrich a stored reminder for the given user. Returns the
    /// refreshed reminder and a per-stage report.
    pub async fn enrich(
        &self,
        reminder_id: Uuid,
        user: &UserProfile,
    ) -> Result<(Reminder, EnrichmentReport)> {
        let now = Utc::now();
        let mut reminder = self.reminders.fetch(reminder_id).await?;

        let schedule = match self.resolver.resolve(&reminder, now).await? {
            Some(decision) => {
                self.reminders.apply_schedule(reminder.id, &decision).await?;
                reminder = self.reminders.fetch(reminder.id).await?;
                StageOutcome::from(decision.path)
            }
            None => StageOutcome::Skipped,
        };

        let (line, line_outcome) = self.resolve_line(&reminder, user).await;
        self.reminders.set_notification_line(reminder.id, &line).await?;

        // Audio only makes sense once an occurrence time exists; routine
        // schedules and unscheduled tasks synthesize at fire time instead.
        let speech = if reminder.start_time.is_some() {
            speech_stage(
                self.reminders.as_ref(),
                self.speech.as_deref(),
                reminder.id,
                &line,
                user.voice(),
            )
            .await
        } else {
            SpeechOutcome::Skipped
        };

        let reminder = self.reminders.fetch(reminder.id).await?;
        debug!(
            subsystem = "engine",
            op = "enrich",
            reminder_id = %reminder.id,
            user_id = %user.id,
            schedule = ?schedule,
            line = ?line_outcome,
            speech = ?speech,
            "enrichment finished"
        );
        Ok((
            reminder,
            EnrichmentReport {
                schedule,
                line: line_outcome,
                speech,
            },
        ))
    }

    async fn resolve_line(&self, reminder: &Reminder, user: &UserProfile) -> (String, StageOutcome) {
        if let Some(backend) = &self.lines {
            let ctx = LineContext {
                first_name: user.first_name.clone(),
                title: reminder.title.clone(),
                kind: reminder.kind,
                place_name: None,
            };
            match backend.generate_line(&ctx).await {
                Ok(Some(line)) if !line.trim().is_empty() => {
                    return (clip_line(&line), StageOutcome::Ai);
                }
                Ok(_) => {
                    debug!(
                        subsystem = "engine",
                        op = "generate_line",
                        reminder_id = %reminder.id,
                        "no usable line, using template"
                    );
                }
                Err(e) => {
                    warn!(
                        subsystem = "engine",
                        op = "generate_line",
                        reminder_id = %reminder.id,
                        error = %e,
                        "line generation failed, using template"
                    );
                }
            }
        }
        (
            clip_line(&fallback_line(
                reminder.kind,
                &user.first_name,
                &reminder.title,
                None,
            )),
            StageOutcome::Fallback,
        )
    }
}

/// Deterministic notification line used when AI generation is
/// unavailable or unusable.
pub fn fallback_line(
    kind: ReminderKind,
    first_name: &str,
    title: &str,
    place_name: Option<&str>,
) -> String {
    match kind {
        ReminderKind::Task => format!("Hey {}, reminder: {}.", first_name, title),
        ReminderKind::Meeting => {
            format!("Hey {}, your meeting \"{}\" is coming up.", first_name, title)
        }
        ReminderKind::Location => {
            format!("Hey {}, you're near {}.", first_name, place_name.unwrap_or(title))
        }
    }
}

/// Enforce the single-line length bound on any notification text.
fn clip_line(line: &str) -> String {
    if line.chars().count() <= defaults::NOTIFICATION_LINE_MAX_CHARS {
        return line.to_string();
    }
    line.chars()
        .take(defaults::NOTIFICATION_LINE_MAX_CHARS)
        .collect()
}

/// Synthesize and cache audio for a notification line, skipping work
/// when the cached record already matches the `(voice, text)`
/// fingerprint. Never fails the caller; errors land in the returned
/// outcome and in the persisted record's status.
pub(crate) async fn speech_stage(
    reminders: &dyn ReminderRepository,
    speech: Option<&dyn SpeechBackend>,
    reminder_id: Uuid,
    line: &str,
    voice: &str,
) -> SpeechOutcome {
    let Some(backend) = speech else {
        return SpeechOutcome::Skipped;
    };

    let hash = text_fingerprint(voice, line);
    let current = match reminders.fetch(reminder_id).await {
        Ok(r) => r,
        Err(e) => return SpeechOutcome::Failed(e.to_string()),
    };
    if current.tts.as_ref().is_some_and(|t| t.is_fresh(&hash)) {
        debug!(
            subsystem = "engine",
            op = "synthesize",
            reminder_id = %reminder_id,
            "cached audio still fresh, skipping synthesis"
        );
        return SpeechOutcome::CachedHit;
    }

    let pending = TtsRecord {
        voice_id: voice.to_string(),
        text_hash: hash.clone(),
        audio: vec![],
        audio_bytes: 0,
        status: TtsStatus::Pending,
        generated_at: Utc::now(),
    };
    if let Err(e) = reminders.set_tts(reminder_id, &pending).await {
        return SpeechOutcome::Failed(e.to_string());
    }

    match backend.synthesize(line, voice).await {
        Ok(audio) => {
            let record = TtsRecord {
                voice_id: voice.to_string(),
                text_hash: hash,
                audio_bytes: audio.audio.len() as i64,
                audio: audio.audio,
                status: TtsStatus::Ready,
                generated_at: Utc::now(),
            };
            if let Err(e) = reminders.set_tts(reminder_id, &record).await {
                return SpeechOutcome::Failed(e.to_string());
            }
            debug!(
                subsystem = "engine",
                op = "synthesize",
                reminder_id = %reminder_id,
                audio_bytes = record.audio_bytes,
                "audio synthesized"
            );
            SpeechOutcome::Generated
        }
        Err(e) => {
            warn!(
                subsystem = "engine",
                op = "synthesize",
                reminder_id = %reminder_id,
                error = %e,
                "speech synthesis failed"
            );
            let failed = TtsRecord {
                status: TtsStatus::Failed,
                generated_at: Utc::now(),
                ..pending
            };
            if let Err(persist) = reminders.set_tts(reminder_id, &failed).await {
                return SpeechOutcome::Failed(persist.to_string());
            }
            SpeechOutcome::Failed(e.to_string())
        }
    }
}
