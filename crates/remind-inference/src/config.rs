//! Environment-driven configuration for inference backends.

use std::time::Duration;

use remind_core::defaults;

/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Configuration for the Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL of the Gemini API.
    pub base_url: String,
    /// API key. Required.
    pub api_key: String,
    /// Model slug to query.
    pub model: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Build a config with defaults for everything except the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: Duration::from_secs(defaults::INFERENCE_TIMEOUT_SECS),
        }
    }

    /// Read configuration from the environment.
    ///
    /// Returns `None` when `GEMINI_API_KEY` is unset or empty — the
    /// caller then runs without AI capabilities rather than failing.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        if api_key.is_empty() {
            return None;
        }

        let base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
        let timeout_secs = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::INFERENCE_TIMEOUT_SECS);

        Some(Self {
            base_url,
            api_key,
            model,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Override the base URL (tests point this at a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the model slug.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Configuration for the HTTP speech backend.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Base URL of the TTS service.
    pub base_url: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
}

impl SpeechConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(defaults::SPEECH_TIMEOUT_SECS),
        }
    }

    /// Read configuration from the environment. Returns `None` when
    /// `TTS_BASE_URL` is unset or empty.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("TTS_BASE_URL").ok()?;
        if base_url.is_empty() {
            return None;
        }

        let api_key = std::env::var("TTS_API_KEY").ok().filter(|k| !k.is_empty());
        let timeout_secs = std::env::var("TTS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::SPEECH_TIMEOUT_SECS);

        Some(Self {
            base_url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}
