//! Centralized default constants for the remind backend.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates reference these constants instead of defining their
//! own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// SCHEDULING
// =============================================================================

/// Lookahead horizon for AI schedule inference and the fallback slot
/// scan, in days. Suggestions beyond this horizon are rejected.
pub const SCHEDULE_LOOKAHEAD_DAYS: i64 = 7;

/// Earliest offset from "now" the fallback slot scan may propose, in hours.
pub const SCHEDULE_MIN_OFFSET_HOURS: i64 = 1;

/// Fallback slot scan only proposes slots at or after this local hour.
pub const FALLBACK_DAY_START_HOUR: u32 = 9;

/// Fallback slot scan only proposes slots strictly before this local hour.
pub const FALLBACK_DAY_END_HOUR: u32 = 18;

/// Default notification lead time in minutes for one-day schedules.
pub const DEFAULT_LEAD_MINUTES: i64 = 10;

// =============================================================================
// LOCATION TRIGGERS
// =============================================================================

/// Minimum gap between successive triggers of the same Location
/// reminder, in minutes.
pub const ANTI_SPAM_WINDOW_MINUTES: i64 = 90;

/// Default maximum distance between the caller and a resolved place for
/// a trigger to fire, in meters.
pub const MAX_TRIGGER_DISTANCE_METERS: f64 = 60.0;

/// Floor applied to caller-supplied trigger radii, in meters.
pub const MIN_TRIGGER_DISTANCE_METERS: f64 = 10.0;

/// Half-width of the collision window around "now", in minutes. A
/// Location trigger is suppressed when another scheduled reminder falls
/// inside this window.
pub const COLLISION_WINDOW_MINUTES: i64 = 5;

/// Retry delay suggested to the caller after a collision skip, in minutes.
pub const COLLISION_RETRY_MINUTES: i64 = 6;

/// Mean earth radius used for haversine distance, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// =============================================================================
// NOTIFICATION TEXT
// =============================================================================

/// Maximum length of a generated notification line, in characters.
pub const NOTIFICATION_LINE_MAX_CHARS: usize = 140;

// =============================================================================
// SPEECH SYNTHESIS
// =============================================================================

/// Wall-clock ceiling for the post-trigger poll awaiting notification
/// text, in milliseconds.
pub const TTS_POLL_CEILING_MS: u64 = 2_000;

/// Poll interval while awaiting notification text, in milliseconds.
pub const TTS_POLL_INTERVAL_MS: u64 = 250;

/// Voice used when the user profile does not carry one.
pub const DEFAULT_VOICE_ID: &str = "en-US-standard";

// =============================================================================
// CAPABILITY TIMEOUTS
// =============================================================================

/// Timeout for AI inference requests (seconds).
pub const INFERENCE_TIMEOUT_SECS: u64 = 15;

/// Timeout for places-lookup requests (seconds).
pub const PLACES_TIMEOUT_SECS: u64 = 10;

/// Timeout for speech-synthesis requests (seconds).
pub const SPEECH_TIMEOUT_SECS: u64 = 20;

// =============================================================================
// BACKGROUND WORKER
// =============================================================================

/// Default capacity of the enrichment queue.
pub const ENRICH_QUEUE_CAPACITY: usize = 64;

/// Timeout for a single enrichment job (seconds). Covers the three
/// capability calls plus persistence round-trips.
pub const ENRICH_JOB_TIMEOUT_SECS: u64 = 60;

/// Capacity of the worker event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for notification listings.
pub const NOTIFICATION_PAGE_LIMIT: i64 = 50;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_longer_than_collision_window() {
        assert!(ANTI_SPAM_WINDOW_MINUTES > COLLISION_WINDOW_MINUTES);
    }

    #[test]
    fn test_distance_floor_below_default() {
        assert!(MIN_TRIGGER_DISTANCE_METERS < MAX_TRIGGER_DISTANCE_METERS);
    }

    #[test]
    fn test_fallback_window_is_working_hours() {
        assert!(FALLBACK_DAY_START_HOUR < FALLBACK_DAY_END_HOUR);
        assert!(FALLBACK_DAY_END_HOUR <= 24);
    }

    #[test]
    fn test_poll_interval_divides_ceiling() {
        assert!(TTS_POLL_INTERVAL_MS <= TTS_POLL_CEILING_MS);
    }
}
