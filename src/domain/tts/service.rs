use super::dto::{SynthesisRequest, SynthesizedAudio};
use super::error::TtsServiceError;
use super::language::{build_detector, detect_language, is_auto};
use crate::domain::relay::TtsRequestPayload;
use crate::infrastructure::repositories::{ProgressCallback, TtsRepository};
use async_trait::async_trait;
use lingua::LanguageDetector;
use moka::future::Cache;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct TtsService {
    tts_repo: Arc<dyn TtsRepository>,
    language_detector: LanguageDetector,
    max_chunk_chars: usize,
    cache: Option<Cache<String, SynthesizedAudio>>,
}

impl TtsService {
    pub fn new(tts_repo: Arc<dyn TtsRepository>, max_chunk_chars: usize, cache_enabled: bool) -> Self {
        let cache = if cache_enabled {
            Some(
                Cache::builder()
                    .max_capacity(100)
                    .time_to_idle(Duration::from_secs(30 * 60)) // 30 minutes, refreshes on access
                    .build(),
            )
        } else {
            None
        };

        Self {
            tts_repo,
            language_detector: build_detector(),
            max_chunk_chars,
            cache,
        }
    }
}

#[async_trait]
pub trait TtsServiceApi: Send + Sync {
    /// Whether a provider credential is configured
    fn has_credential(&self) -> bool;

    /// Synthesize one chunk received over the relay
    ///
    /// This operation:
    /// - Fails fast when no provider credential is configured
    /// - Validates the text and resolves the language
    /// - Calls the provider, reporting download progress through `on_progress`
    async fn synthesize(
        &self,
        request: TtsRequestPayload,
        on_progress: ProgressCallback<'_>,
    ) -> Result<SynthesizedAudio, TtsServiceError>;
}

#[async_trait]
impl TtsServiceApi for TtsService {
    fn has_credential(&self) -> bool {
        self.tts_repo.has_credential()
    }

    async fn synthesize(
        &self,
        request: TtsRequestPayload,
        on_progress: ProgressCallback<'_>,
    ) -> Result<SynthesizedAudio, TtsServiceError> {
        if !self.has_credential() {
            return Err(TtsServiceError::CredentialMissing);
        }

        let request = self.prepare(request)?;
        let cache_key = Self::cache_key(&request);

        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&cache_key).await {
                tracing::info!(
                    voice_id = %request.voice_id,
                    cached_audio_size = cached.audio.len(),
                    "TTS cache hit - returning cached audio"
                );
                return Ok(cached);
            }
        }

        let start_time = Instant::now();
        let audio = self.tts_repo.synthesize(&request, on_progress).await?;

        tracing::info!(
            voice_id = %request.voice_id,
            language = %request.language,
            characters_count = request.text.chars().count(),
            audio_size_bytes = audio.audio.len(),
            content_type = %audio.content_type,
            latency_ms = start_time.elapsed().as_millis() as u64,
            "Chunk synthesized"
        );

        if let Some(cache) = &self.cache {
            cache.insert(cache_key, audio.clone()).await;
        }

        Ok(audio)
    }
}

impl TtsService {
    fn prepare(&self, request: TtsRequestPayload) -> Result<SynthesisRequest, TtsServiceError> {
        let text = request.text.trim().to_string();
        if text.is_empty() {
            return Err(TtsServiceError::Invalid("Text cannot be empty".to_string()));
        }
        if request.voice_id.trim().is_empty() {
            return Err(TtsServiceError::Invalid("Voice must be selected".to_string()));
        }

        let char_count = text.chars().count();
        if char_count > self.max_chunk_chars {
            return Err(TtsServiceError::PayloadTooLarge(format!(
                "Chunk must be {} characters or less, got {}",
                self.max_chunk_chars, char_count
            )));
        }

        let language = if is_auto(request.language.as_deref()) {
            let detected = detect_language(&self.language_detector, &text);
            tracing::debug!(language_detected = %detected, "Language detected for chunk");
            detected.as_str().to_string()
        } else {
            request
                .language
                .unwrap_or_default()
                .trim()
                .to_lowercase()
        };

        Ok(SynthesisRequest {
            text,
            voice_id: request.voice_id,
            language,
            settings: request.settings,
        })
    }

    fn cache_key(request: &SynthesisRequest) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            request.voice_id,
            request.language,
            request.settings.speed,
            request.settings.pitch_shift,
            request.settings.pitch_variance,
            request.text
        )
    }
}
