//! OpenAI API client.
//!
//! Covers the five endpoints the Router dispatches to:
//! `/chat/completions` (plain and vision), `/images/generations`,
//! `/audio/speech`, and `/audio/transcriptions`.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::config::AiConfig;
use super::types::{AiError, AiProvider};

const VISION_MAX_TOKENS: u32 = 300;

pub struct OpenAiClient {
    http: reqwest::Client,
    config: AiConfig,
}

impl OpenAiClient {
    /// Build a client from environment variables. See [`AiConfig::from_env`].
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails
    /// to build.
    pub fn from_env() -> Result<Self, AiError> {
        Self::new(AiConfig::from_env()?)
    }

    /// Build a client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client fails to build.
    pub fn new(config: AiConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| AiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Configured chat model name.
    #[must_use]
    pub fn chat_model(&self) -> &str {
        &self.config.chat_model
    }

    async fn send(&self, path: &str, body: &impl Serialize) -> Result<reqwest::Response, AiError> {
        let url = format!("{}{}", self.config.base_url, path);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AiError::ApiRequest(e.to_string()))?;
        check_status(response).await
    }

    async fn send_json(&self, path: &str, body: &impl Serialize) -> Result<String, AiError> {
        let response = self.send(path, body).await?;
        response
            .text()
            .await
            .map_err(|e| AiError::ApiRequest(e.to_string()))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AiError> {
    let status = response.status().as_u16();
    if status == 200 {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AiError::ApiResponse { status, body })
}

#[async_trait::async_trait]
impl AiProvider for OpenAiClient {
    async fn chat(&self, prompt: &str) -> Result<String, AiError> {
        let body = ChatBody {
            model: &self.config.chat_model,
            messages: vec![MessageBody { role: "user", content: ContentBody::Text(prompt) }],
            max_tokens: None,
        };
        let text = self.send_json("/chat/completions", &body).await?;
        parse_chat_content(&text)
    }

    async fn describe_image(&self, image_url: &str, prompt: &str) -> Result<String, AiError> {
        let body = ChatBody {
            model: &self.config.vision_model,
            messages: vec![MessageBody {
                role: "user",
                content: ContentBody::Parts(vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl { image_url: ImageUrlRef { url: image_url } },
                ]),
            }],
            max_tokens: Some(VISION_MAX_TOKENS),
        };
        let text = self.send_json("/chat/completions", &body).await?;
        parse_chat_content(&text)
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, AiError> {
        let body = ImageBody {
            model: &self.config.image_model,
            prompt,
            n: 1,
            size: "1024x1024",
            response_format: "url",
            quality: "standard",
        };
        let text = self.send_json("/images/generations", &body).await?;
        parse_image_url(&text)
    }

    async fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>, AiError> {
        let body = SpeechBody { model: &self.config.speech_model, voice: &self.config.speech_voice, input: text };
        let response = self.send("/audio/speech", &body).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AiError::ApiRequest(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn transcribe(&self, filename: &str, bytes: Vec<u8>) -> Result<String, AiError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_owned())
            .mime_str("audio/mpeg")
            .map_err(|e| AiError::ApiRequest(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.config.transcription_model.clone());

        let url = format!("{}/audio/transcriptions", self.config.base_url);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AiError::ApiRequest(e.to_string()))?;
        let response = check_status(response).await?;
        let text = response
            .text()
            .await
            .map_err(|e| AiError::ApiRequest(e.to_string()))?;
        parse_transcript(&text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<MessageBody<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct MessageBody<'a> {
    role: &'static str,
    content: ContentBody<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ContentBody<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentPart<'a> {
    #[serde(rename = "text")]
    Text { text: &'a str },

    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrlRef<'a> },
}

#[derive(Serialize)]
struct ImageUrlRef<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct ImageBody<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'static str,
    response_format: &'static str,
    quality: &'static str,
}

#[derive(Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

pub(crate) fn parse_chat_content(json_text: &str) -> Result<String, AiError> {
    let root: Value = serde_json::from_str(json_text).map_err(|e| AiError::ApiParse(e.to_string()))?;
    root.get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| AiError::ApiParse("chat_completions: missing choices[0].message.content".to_string()))
}

pub(crate) fn parse_image_url(json_text: &str) -> Result<String, AiError> {
    let root: Value = serde_json::from_str(json_text).map_err(|e| AiError::ApiParse(e.to_string()))?;
    root.get("data")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|item| item.get("url"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| AiError::ApiParse("images: missing data[0].url".to_string()))
}

pub(crate) fn parse_transcript(json_text: &str) -> Result<String, AiError> {
    let root: Value = serde_json::from_str(json_text).map_err(|e| AiError::ApiParse(e.to_string()))?;
    root.get("text")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| AiError::ApiParse("transcriptions: missing text".to_string()))
}

#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;
