use crate::error::AppError;
use crate::infrastructure::repositories::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum TtsServiceError {
    #[error("credential missing")]
    CredentialMissing,
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("text too large: {0}")]
    PayloadTooLarge(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl From<TtsServiceError> for AppError {
    fn from(err: TtsServiceError) -> Self {
        match err {
            TtsServiceError::CredentialMissing => AppError::CredentialMissing,
            TtsServiceError::Invalid(msg) => AppError::BadRequest(msg),
            TtsServiceError::PayloadTooLarge(msg) => AppError::PayloadTooLarge(msg),
            TtsServiceError::Provider(e) => AppError::Provider(e.to_string()),
        }
    }
}
