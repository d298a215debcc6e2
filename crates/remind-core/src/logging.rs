//! Structured logging schema and field name constants for remind.
//!
//! All crates use these constants for consistent structured logging
//! fields, so log aggregation tools can query by standardized field
//! names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-candidate iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "engine", "db", "inference", "places", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "resolver", "enrichment", "trigger", "gemini", "worker"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "resolve", "enrich", "scan", "synthesize"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Reminder UUID being operated on.
pub const REMINDER_ID: &str = "reminder_id";

/// Owning user UUID.
pub const USER_ID: &str = "user_id";

/// Enrichment stage name ("schedule", "line", "speech").
pub const STAGE: &str = "stage";

/// Machine-readable skip reason from the trigger state machine.
pub const SKIP_REASON: &str = "skip_reason";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Great-circle distance between caller and resolved place, in meters.
pub const DISTANCE_M: &str = "distance_m";

/// Number of candidates evaluated by a scan.
pub const CANDIDATE_COUNT: &str = "candidate_count";

/// Number of busy slots supplied to schedule inference.
pub const BUSY_COUNT: &str = "busy_count";

/// Byte length of synthesized audio.
pub const AUDIO_BYTES: &str = "audio_bytes";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

/// Which path produced a decision ("ai" or "fallback").
pub const PATH: &str = "path";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
