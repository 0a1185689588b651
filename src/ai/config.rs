//! AI provider configuration parsed from environment variables.

use super::types::AiError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4-vision-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_SPEECH_MODEL: &str = "tts-1";
pub const DEFAULT_SPEECH_VOICE: &str = "alloy";
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub vision_model: String,
    pub image_model: String,
    pub speech_model: String,
    pub speech_voice: String,
    pub transcription_model: String,
    pub timeouts: AiTimeouts,
}

impl AiConfig {
    /// Build typed AI config from environment variables.
    ///
    /// Required:
    /// - `OPENAI_API_KEY`
    ///
    /// Optional (defaults in this module):
    /// - `OPENAI_BASE_URL`
    /// - `OPENAI_CHAT_MODEL`, `OPENAI_VISION_MODEL`, `OPENAI_IMAGE_MODEL`
    /// - `OPENAI_SPEECH_MODEL`, `OPENAI_SPEECH_VOICE`
    /// - `OPENAI_TRANSCRIPTION_MODEL`
    /// - `AI_REQUEST_TIMEOUT_SECS`, `AI_CONNECT_TIMEOUT_SECS`
    ///
    /// # Errors
    ///
    /// Returns [`AiError::MissingApiKey`] when `OPENAI_API_KEY` is absent.
    pub fn from_env() -> Result<Self, AiError> {
        let api_key =
            std::env::var("OPENAI_API_KEY").map_err(|_| AiError::MissingApiKey { var: "OPENAI_API_KEY".into() })?;

        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key,
            base_url,
            chat_model: env_or("OPENAI_CHAT_MODEL", DEFAULT_CHAT_MODEL),
            vision_model: env_or("OPENAI_VISION_MODEL", DEFAULT_VISION_MODEL),
            image_model: env_or("OPENAI_IMAGE_MODEL", DEFAULT_IMAGE_MODEL),
            speech_model: env_or("OPENAI_SPEECH_MODEL", DEFAULT_SPEECH_MODEL),
            speech_voice: env_or("OPENAI_SPEECH_VOICE", DEFAULT_SPEECH_VOICE),
            transcription_model: env_or("OPENAI_TRANSCRIPTION_MODEL", DEFAULT_TRANSCRIPTION_MODEL),
            timeouts: AiTimeouts {
                request_secs: env_parse_u64("AI_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: env_parse_u64("AI_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
