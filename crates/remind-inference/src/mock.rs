//! Mock assistant backend for deterministic testing.
//!
//! Implements every AI-facing capability trait with canned results,
//! per-operation failure switches, and a call log so tests can assert
//! how many times each capability was invoked (the speech idempotence
//! property depends on this).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use remind_core::{
    AiScheduleSuggestion, BusySlot, Error, LineContext, NotificationLineBackend, Result,
    ScheduleItem, ScheduleSuggestionBackend, SpeechBackend, SynthesizedAudio,
};

/// Mock backend implementing schedule suggestion, line generation, and
/// speech synthesis.
#[derive(Clone)]
pub struct MockAssistantBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    suggestion: Option<AiScheduleSuggestion>,
    line: Option<String>,
    audio: Vec<u8>,
    fail_schedule: bool,
    fail_line: bool,
    fail_speech: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            suggestion: None,
            line: Some("Mock notification line".to_string()),
            audio: vec![0xAA; 16],
            fail_schedule: false,
            fail_line: false,
            fail_speech: false,
        }
    }
}

/// A logged capability invocation.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

impl Default for MockAssistantBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAssistantBackend {
    /// Create a new mock with default configuration: no schedule
    /// suggestion, a fixed line, and 16 bytes of audio.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Canned schedule suggestion.
    pub fn with_suggestion(mut self, suggestion: AiScheduleSuggestion) -> Self {
        Arc::make_mut(&mut self.config).suggestion = Some(suggestion);
        self
    }

    /// Canned notification line (`None` simulates "no usable answer").
    pub fn with_line(mut self, line: Option<String>) -> Self {
        Arc::make_mut(&mut self.config).line = line;
        self
    }

    /// Canned audio bytes.
    pub fn with_audio(mut self, audio: Vec<u8>) -> Self {
        Arc::make_mut(&mut self.config).audio = audio;
        self
    }

    /// Make schedule suggestion calls fail.
    pub fn failing_schedule(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_schedule = true;
        self
    }

    /// Make line generation calls fail.
    pub fn failing_line(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_line = true;
        self
    }

    /// Make speech synthesis calls fail.
    pub fn failing_speech(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_speech = true;
        self
    }

    /// All logged calls.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    fn count(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Number of schedule-suggestion calls.
    pub fn suggest_call_count(&self) -> usize {
        self.count("suggest_schedule")
    }

    /// Number of line-generation calls.
    pub fn line_call_count(&self) -> usize {
        self.count("generate_line")
    }

    /// Number of synthesis calls.
    pub fn synthesize_call_count(&self) -> usize {
        self.count("synthesize")
    }

    fn log(&self, operation: &str, input: &str) {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
    }
}

#[async_trait]
impl ScheduleSuggestionBackend for MockAssistantBackend {
    async fn suggest_schedule(
        &self,
        _user_id: Uuid,
        _now: DateTime<Utc>,
        item: &ScheduleItem,
        _busy: &[BusySlot],
    ) -> Result<Option<AiScheduleSuggestion>> {
        self.log("suggest_schedule", &item.title);
        if self.config.fail_schedule {
            return Err(Error::Inference("mock schedule failure".into()));
        }
        Ok(self.config.suggestion.clone())
    }
}

#[async_trait]
impl NotificationLineBackend for MockAssistantBackend {
    async fn generate_line(&self, ctx: &LineContext) -> Result<Option<String>> {
        self.log("generate_line", &ctx.title);
        if self.config.fail_line {
            return Err(Error::Inference("mock line failure".into()));
        }
        Ok(self.config.line.clone())
    }
}

#[async_trait]
impl SpeechBackend for MockAssistantBackend {
    async fn synthesize(&self, text: &str, _voice_id: &str) -> Result<SynthesizedAudio> {
        self.log("synthesize", text);
        if self.config.fail_speech {
            return Err(Error::Speech("mock speech failure".into()));
        }
        Ok(SynthesizedAudio {
            audio: self.config.audio.clone(),
            content_type: "audio/mpeg".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remind_core::{ReminderKind, ScheduleType};

    #[tokio::test]
    async fn test_mock_defaults() {
        let mock = MockAssistantBackend::new();

        let item = ScheduleItem {
            title: "tea".to_string(),
            description: None,
        };
        let suggestion = mock
            .suggest_schedule(Uuid::new_v4(), Utc::now(), &item, &[])
            .await
            .unwrap();
        assert!(suggestion.is_none());

        let ctx = LineContext {
            first_name: "Sam".to_string(),
            title: "tea".to_string(),
            kind: ReminderKind::Task,
            place_name: None,
        };
        assert!(mock.generate_line(&ctx).await.unwrap().is_some());

        let audio = mock.synthesize("line", "voice").await.unwrap();
        assert!(!audio.audio.is_empty());

        assert_eq!(mock.suggest_call_count(), 1);
        assert_eq!(mock.line_call_count(), 1);
        assert_eq!(mock.synthesize_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_canned_suggestion() {
        let suggestion = AiScheduleSuggestion {
            schedule_type: ScheduleType::Routine,
            start_time: None,
            schedule_days: vec![2],
            fixed_time: Some("07:00".to_string()),
        };
        let mock = MockAssistantBackend::new().with_suggestion(suggestion.clone());

        let item = ScheduleItem {
            title: "tea".to_string(),
            description: None,
        };
        let got = mock
            .suggest_schedule(Uuid::new_v4(), Utc::now(), &item, &[])
            .await
            .unwrap();
        assert_eq!(got, Some(suggestion));
    }

    #[tokio::test]
    async fn test_mock_failures() {
        let mock = MockAssistantBackend::new()
            .failing_schedule()
            .failing_line()
            .failing_speech();

        let item = ScheduleItem {
            title: "tea".to_string(),
            description: None,
        };
        assert!(mock
            .suggest_schedule(Uuid::new_v4(), Utc::now(), &item, &[])
            .await
            .is_err());

        let ctx = LineContext {
            first_name: "Sam".to_string(),
            title: "tea".to_string(),
            kind: ReminderKind::Task,
            place_name: None,
        };
        assert!(mock.generate_line(&ctx).await.is_err());
        assert!(mock.synthesize("line", "voice").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_clone_shares_call_log() {
        let mock = MockAssistantBackend::new();
        let clone = mock.clone();
        clone.synthesize("line", "voice").await.unwrap();
        assert_eq!(mock.synthesize_call_count(), 1);
    }
}
