//! Scheduling core for the remind backend.
//!
//! Three cooperating pieces:
//!
//! - [`ScheduleResolver`] decides when an unscheduled task should
//!   happen, preferring AI suggestions and falling back to a
//!   deterministic slot scan.
//! - [`EnrichmentPipeline`] runs the post-creation stages (schedule,
//!   notification line, speech) against a stored reminder.
//! - [`LocationTriggerEngine`] evaluates client position reports
//!   against active Location reminders.
//!
//! All three depend only on the repository and capability traits from
//! `remind-core`, so they run identically over Postgres and the
//! in-memory store.

pub mod enrich;
pub mod resolver;
pub mod trigger;

pub use enrich::{fallback_line, EnrichmentPipeline, EnrichmentReport, SpeechOutcome, StageOutcome};
pub use resolver::ScheduleResolver;
pub use trigger::{
    LocationTriggerEngine, ScanOutcome, ScanRequest, ScanResult, SkipReason, TriggerConfig,
};
