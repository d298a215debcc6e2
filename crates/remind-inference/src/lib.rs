//! # remind-inference
//!
//! AI capability backends for the remind backend: schedule suggestion
//! and notification-line generation over the Gemini REST API, plus an
//! HTTP speech-synthesis client. All capabilities are best-effort; the
//! engine provides deterministic fallbacks when they fail.
//!
//! The [`mock::MockAssistantBackend`] implements every capability trait
//! with canned results for tests.

pub mod config;
pub mod gemini;
pub mod mock;
pub mod speech;

pub use config::{GeminiConfig, SpeechConfig};
pub use gemini::GeminiBackend;
pub use mock::MockAssistantBackend;
pub use speech::HttpSpeechBackend;
