//! Gemini inference backend.
//!
//! Implements the schedule-suggestion and notification-line capabilities
//! over the Gemini `generateContent` REST API. Both are best-effort:
//! malformed model output is reported as `Ok(None)` so callers route to
//! their deterministic fallbacks, and transport failures surface as
//! [`remind_core::Error::Inference`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, warn};
use uuid::Uuid;

use remind_core::defaults::NOTIFICATION_LINE_MAX_CHARS;
use remind_core::{
    AiScheduleSuggestion, BusySlot, Error, LineContext, NotificationLineBackend, ReminderKind,
    Result, ScheduleItem, ScheduleSuggestionBackend, ScheduleType,
};

use crate::config::GeminiConfig;

/// Gemini inference backend.
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    /// Create a new backend from explicit configuration.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::Config("GEMINI_API_KEY is empty".into()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables. Returns `None` when no API
    /// key is configured.
    pub fn from_env() -> Option<Self> {
        GeminiConfig::from_env().and_then(|config| Self::new(config).ok())
    }

    /// The configured model slug.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "gemini returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("gemini response decode failed: {}", e)))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        debug!(
            subsystem = "inference",
            component = "gemini",
            model = %self.config.model,
            response_len = text.len(),
            "Gemini generation complete"
        );

        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Tolerant wire form of a model-emitted schedule decision.
#[derive(Deserialize)]
struct SuggestionWire {
    schedule_type: String,
    #[serde(default)]
    start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    schedule_days: Vec<u8>,
    #[serde(default)]
    fixed_time: Option<String>,
}

// ---------------------------------------------------------------------------
// Response post-processing
// ---------------------------------------------------------------------------

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid regex"))
}

/// Strip a surrounding markdown code fence, if present.
pub fn strip_code_fences(text: &str) -> &str {
    match fence_regex().captures(text) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(text),
        None => text.trim(),
    }
}

/// Parse a model response into a schedule suggestion. Malformed output
/// yields `None` — the resolver treats that as "capability unavailable".
pub fn parse_suggestion(text: &str) -> Option<AiScheduleSuggestion> {
    let cleaned = strip_code_fences(text);
    let wire: SuggestionWire = serde_json::from_str(cleaned).ok()?;

    let schedule_type = match wire.schedule_type.as_str() {
        "one_day" | "one-day" | "oneDay" => ScheduleType::OneDay,
        "routine" => ScheduleType::Routine,
        _ => return None,
    };

    Some(AiScheduleSuggestion {
        schedule_type,
        start_time: wire.start_time,
        schedule_days: wire.schedule_days,
        fixed_time: wire.fixed_time,
    })
}

/// Collapse a model response to a single bounded line.
pub fn flatten_line(text: &str) -> Option<String> {
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.is_empty() {
        return None;
    }
    Some(line.chars().take(NOTIFICATION_LINE_MAX_CHARS).collect())
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

fn build_schedule_prompt(now: DateTime<Utc>, item: &ScheduleItem, busy: &[BusySlot]) -> String {
    let mut prompt = String::with_capacity(512);
    prompt.push_str(
        "You are a scheduling assistant. Pick a time for the new item below, \
         avoiding the user's existing commitments.\n",
    );
    prompt.push_str(&format!("Current time (UTC): {}\n", now.to_rfc3339()));
    prompt.push_str(&format!("New item title: {}\n", item.title));
    if let Some(desc) = &item.description {
        prompt.push_str(&format!("New item description: {}\n", desc));
    }
    prompt.push_str("Existing commitments in the next 7 days:\n");
    if busy.is_empty() {
        prompt.push_str("  (none)\n");
    }
    for slot in busy {
        prompt.push_str(&format!("  - {} at {}\n", slot.title, slot.start_time.to_rfc3339()));
    }
    prompt.push_str(
        "Respond with JSON only, no prose. Either \
         {\"schedule_type\":\"one_day\",\"start_time\":\"<RFC3339, within 7 days, in the future>\"} \
         or {\"schedule_type\":\"routine\",\"schedule_days\":[<0=Sunday..6=Saturday>],\"fixed_time\":\"HH:mm\"}.",
    );
    prompt
}

fn build_line_prompt(ctx: &LineContext) -> String {
    let kind = match ctx.kind {
        ReminderKind::Task => "task",
        ReminderKind::Meeting => "meeting",
        ReminderKind::Location => "location-based reminder",
    };
    let mut prompt = format!(
        "Write one short, friendly notification line addressed to {} about their {} \"{}\".",
        ctx.first_name, kind, ctx.title
    );
    if let Some(place) = &ctx.place_name {
        prompt.push_str(&format!(" They just arrived near {}.", place));
    }
    prompt.push_str(
        " Constraints: a single line, at most 140 characters, mention the title, \
         no dates or times, no quotes. Respond with the line only.",
    );
    prompt
}

// ---------------------------------------------------------------------------
// Capability implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl ScheduleSuggestionBackend for GeminiBackend {
    async fn suggest_schedule(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        item: &ScheduleItem,
        busy: &[BusySlot],
    ) -> Result<Option<AiScheduleSuggestion>> {
        let prompt = build_schedule_prompt(now, item, busy);
        let text = self.generate(&prompt).await?;

        let suggestion = parse_suggestion(&text);
        if suggestion.is_none() {
            warn!(
                subsystem = "inference",
                component = "gemini",
                user_id = %user_id,
                "Unparseable schedule suggestion, treating as unavailable"
            );
        }
        Ok(suggestion)
    }
}

#[async_trait]
impl NotificationLineBackend for GeminiBackend {
    async fn generate_line(&self, ctx: &LineContext) -> Result<Option<String>> {
        let prompt = build_line_prompt(ctx);
        let text = self.generate(&prompt).await?;
        Ok(flatten_line(&text))
    }
}
