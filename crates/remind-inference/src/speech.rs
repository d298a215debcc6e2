//! HTTP speech-synthesis backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use remind_core::{Error, Result, SpeechBackend, SynthesizedAudio};

use crate::config::SpeechConfig;

/// Default content type when the provider omits one.
const DEFAULT_AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Speech backend over a generic TTS-over-HTTP service.
pub struct HttpSpeechBackend {
    client: Client,
    config: SpeechConfig,
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
}

impl HttpSpeechBackend {
    /// Create a new backend from explicit configuration.
    pub fn new(config: SpeechConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(Error::Config("TTS_BASE_URL is empty".into()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables. Returns `None` when no TTS
    /// service is configured.
    pub fn from_env() -> Option<Self> {
        SpeechConfig::from_env().and_then(|config| Self::new(config).ok())
    }
}

#[async_trait]
impl SpeechBackend for HttpSpeechBackend {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<SynthesizedAudio> {
        let url = format!("{}/v1/synthesize", self.config.base_url);

        let mut request = self
            .client
            .post(&url)
            .json(&SynthesizeRequest { text, voice_id });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Speech(format!("tts request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Speech(format!(
                "tts provider returned {}: {}",
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_AUDIO_CONTENT_TYPE)
            .to_string();

        let audio = response
            .bytes()
            .await
            .map_err(|e| Error::Speech(format!("tts body read failed: {}", e)))?
            .to_vec();

        if audio.is_empty() {
            return Err(Error::Speech("tts provider returned empty audio".into()));
        }

        debug!(
            subsystem = "inference",
            component = "speech",
            audio_bytes = audio.len(),
            content_type = %content_type,
            "Speech synthesis complete"
        );

        Ok(SynthesizedAudio {
            audio,
            content_type,
        })
    }
}
