use crate::domain::tts::{SynthesisRequest, SynthesizedAudio};
use async_trait::async_trait;

/// Receives the fraction (0..=1) of the provider response downloaded so far
pub type ProgressCallback<'a> = &'a (dyn Fn(f32) + Send + Sync);

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("credential missing")]
    CredentialMissing,

    /// The provider answered with a JSON error body
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Neither audio nor a parseable JSON error
    #[error("unexpected provider response (status {status})")]
    Malformed { status: u16 },

    #[error("provider request timed out")]
    Timeout,

    #[error("provider request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// Repository for single-shot TTS synthesis calls.
/// Abstracts the underlying HTTP provider.
///
/// One call synthesizes exactly one chunk; splitting long text happens
/// upstream, before the chunk is put on the relay.
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Whether a provider credential is configured
    fn has_credential(&self) -> bool;

    /// Synthesize one chunk of text
    ///
    /// # Errors
    /// Returns error if the provider rejects the request, answers with
    /// something that is neither audio nor a JSON error, or is unreachable
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        on_progress: ProgressCallback<'_>,
    ) -> Result<SynthesizedAudio, ProviderError>;
}
