use super::tts_repository::{ProgressCallback, ProviderError, TtsRepository};
use crate::domain::tts::{SynthesisRequest, SynthesizedAudio};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const ACCEPT_AUDIO_OR_JSON: &str = "audio/mpeg, audio/*;q=0.9, application/json;q=0.5";
const AUDIO_CONTENT_PREFIX: &str = "audio/";

#[derive(Debug, Serialize)]
struct ProviderRequestBody<'a> {
    language: &'a str,
    text: &'a str,
    model: &'a str,
    voice_settings: ProviderVoiceSettings,
}

#[derive(Debug, Serialize)]
struct ProviderVoiceSettings {
    speed: f32,
    pitch_shift: f32,
    pitch_variance: f32,
}

/// HTTP synthesis provider reached through one POST per chunk
pub struct HttpTtsRepository {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpTtsRepository {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model,
        })
    }

    /// Per-voice synthesis endpoint
    fn endpoint(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}",
            self.base_url,
            urlencoding::encode(voice_id)
        )
    }

    async fn read_audio(
        mut response: reqwest::Response,
        on_progress: ProgressCallback<'_>,
    ) -> Result<Vec<u8>, ProviderError> {
        let declared_length = response.content_length().filter(|len| *len > 0);
        let mut audio = Vec::with_capacity(declared_length.unwrap_or(0) as usize);

        while let Some(bytes) = response.chunk().await? {
            audio.extend_from_slice(&bytes);
            if let Some(total) = declared_length {
                on_progress((audio.len() as f32 / total as f32).min(1.0));
            }
        }

        Ok(audio)
    }
}

/// Pull a human readable message out of a provider error body
fn error_message(body: &Value) -> Option<String> {
    body.get("message")
        .or_else(|| body.get("detail").and_then(|detail| detail.get("message")))
        .or_else(|| body.get("error").and_then(|error| error.get("message")))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl TtsRepository for HttpTtsRepository {
    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        on_progress: ProgressCallback<'_>,
    ) -> Result<SynthesizedAudio, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::CredentialMissing)?;

        let body = ProviderRequestBody {
            language: &request.language,
            text: &request.text,
            model: &self.model,
            voice_settings: ProviderVoiceSettings {
                speed: request.settings.speed,
                pitch_shift: request.settings.pitch_shift,
                pitch_variance: request.settings.pitch_variance,
            },
        };

        tracing::debug!(
            voice_id = %request.voice_id,
            model = %self.model,
            text_length = request.text.chars().count(),
            "Calling synthesis provider"
        );

        let response = self
            .http_client
            .post(self.endpoint(&request.voice_id))
            .bearer_auth(api_key)
            .header(ACCEPT, ACCEPT_AUDIO_OR_JSON)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, voice_id = %request.voice_id, "Provider call failed");
                ProviderError::from(e)
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if content_type.starts_with(AUDIO_CONTENT_PREFIX) {
            let audio = Self::read_audio(response, on_progress).await?;
            return Ok(SynthesizedAudio {
                audio,
                content_type,
            });
        }

        let raw = response.bytes().await?;
        let message = serde_json::from_slice::<Value>(&raw)
            .ok()
            .as_ref()
            .and_then(error_message);

        match message {
            Some(message) => {
                tracing::warn!(status, message = %message, "Provider rejected synthesis");
                Err(ProviderError::Rejected { status, message })
            }
            None => {
                tracing::warn!(status, content_type = %content_type, "Provider returned an unreadable response");
                Err(ProviderError::Malformed { status })
            }
        }
    }
}
