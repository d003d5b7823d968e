use thiserror::Error;

use gemini_image::GeminiError;

/// Failure of a generation call, as seen by the orchestrator.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The credential is missing, expired or was rejected by the provider.
    #[error("API Key Invalid")]
    ApiKeyInvalid,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Provider(String),
}

impl From<GeminiError> for GenerationError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::ApiKeyInvalid(_) => GenerationError::ApiKeyInvalid,
            other => GenerationError::Provider(other.to_string()),
        }
    }
}

/// Failure of the credential subsystem.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No interactive surface could be opened to ask for a key.
    #[error("key selection dialog unavailable: {0}")]
    DialogUnavailable(String),

    #[error("key selection cancelled")]
    Cancelled,

    #[error("credential storage error: {0}")]
    Io(#[from] std::io::Error),
}
