//! Provider-neutral AI operations and errors.

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by AI provider operations.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// The required API key environment variable is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// The HTTP request to the provider failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The provider returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The provider response body could not be interpreted.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl AiError {
    /// Provider-side throttling: HTTP 429, or a `rate_limit_exceeded`
    /// error code in the response body.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::ApiResponse { status: 429, .. } => true,
            Self::ApiResponse { body, .. } => body.contains("rate_limit_exceeded"),
            _ => false,
        }
    }
}

// =============================================================================
// PROVIDER TRAIT
// =============================================================================

/// Provider-neutral async trait over the remote AI operations the Router
/// dispatches to. Enables mocking in tests.
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    /// Chat completion on a single user prompt.
    ///
    /// # Errors
    ///
    /// Returns an [`AiError`] if the request fails or the response is
    /// malformed.
    async fn chat(&self, prompt: &str) -> Result<String, AiError>;

    /// Vision completion: describe the image at `image_url` guided by
    /// `prompt`.
    ///
    /// # Errors
    ///
    /// Returns an [`AiError`] if the request fails or the response is
    /// malformed.
    async fn describe_image(&self, image_url: &str, prompt: &str) -> Result<String, AiError>;

    /// Generate an image from a text prompt. Returns a remote file URL.
    ///
    /// # Errors
    ///
    /// Returns an [`AiError`] if the request fails or the response is
    /// malformed.
    async fn generate_image(&self, prompt: &str) -> Result<String, AiError>;

    /// Synthesize speech from text. Returns encoded MP3 bytes.
    ///
    /// # Errors
    ///
    /// Returns an [`AiError`] if the request fails.
    async fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>, AiError>;

    /// Transcribe an audio file to text.
    ///
    /// # Errors
    ///
    /// Returns an [`AiError`] if the request fails or the response is
    /// malformed.
    async fn transcribe(&self, filename: &str, bytes: Vec<u8>) -> Result<String, AiError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
