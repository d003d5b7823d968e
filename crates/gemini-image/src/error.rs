use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeminiError>;

/// Failure kinds of a Gemini request, classified from the HTTP status and
/// the error envelope returned by the API.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// The key was rejected, expired or does not grant access to the model.
    #[error("API key invalid: {0}")]
    ApiKeyInvalid(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The prompt was refused by the safety filters.
    #[error("content blocked: {0}")]
    Blocked(String),

    #[error("Gemini API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to decode Gemini response: {0}")]
    Decode(String),
}
