//! Request Router — classify a chat request and call one AI operation.
//!
//! DESIGN
//! ======
//! Dispatch is a two-level branch: input type first (text / audio / image),
//! then desired response format (text / image / speech). Audio and image
//! inputs are reduced to text (transcription, vision description) and
//! re-enter the text path with the original response format.
//!
//! A provider rate limit on the text/text path is not a failure: it becomes
//! a [`ChatOutcome::Degraded`] carrying a fixed apology reply, which the
//! wire layer tags with `error: rate_limit_exceeded`.

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::ai::AiError;
use crate::protocol::{ChatRequest, MessageKind};
use crate::state::AppState;

pub(crate) const SIMULATED_REPLY: &str = "This is a simulated response since no OpenAI API key was provided.";
pub(crate) const RATE_LIMIT_REPLY: &str =
    "I apologize, but I've hit my rate limit. Please try again in about an hour.";
pub(crate) const IMAGE_REPLY: &str = "Generated image based on your text";
pub(crate) const SPEECH_REPLY: &str = "Generated speech from your text";
pub(crate) const VISION_PROMPT: &str = "What's in this image?";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("content is required")]
    EmptyContent,
    #[error("invalid message type: {0}")]
    InvalidInputKind(String),
    #[error("invalid response format: {0}")]
    InvalidResponseFormat(String),
    #[error("file URL is required for {0} input")]
    MissingFileUrl(&'static str),
    #[error("AI provider is not configured")]
    NotConfigured,
    #[error("AI provider error: {0}")]
    Upstream(#[from] AiError),
    #[error("file storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("file fetch failed: {0}")]
    FileFetch(String),
}

/// Reason a reply was degraded rather than failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedReason {
    RateLimited,
}

impl DegradedReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limit_exceeded",
        }
    }
}

/// Normalized Router reply before wire encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub kind: MessageKind,
    pub content: String,
    pub file_url: Option<String>,
}

/// Outcome of a dispatch: a plain reply, or a successful-but-degraded
/// reply that signals a provider-side limitation.
#[derive(Debug)]
pub enum ChatOutcome {
    Reply(ChatReply),
    Degraded { reason: DegradedReason, reply: ChatReply },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    Text,
    Audio,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseFormat {
    Text,
    Image,
    Speech,
}

fn parse_input_kind(raw: &str) -> Result<InputKind, DispatchError> {
    match raw {
        "text" => Ok(InputKind::Text),
        "audio" => Ok(InputKind::Audio),
        "image" => Ok(InputKind::Image),
        other => Err(DispatchError::InvalidInputKind(other.to_owned())),
    }
}

fn parse_response_format(raw: &str) -> Result<ResponseFormat, DispatchError> {
    match raw {
        "text" => Ok(ResponseFormat::Text),
        "image" => Ok(ResponseFormat::Image),
        "speech" => Ok(ResponseFormat::Speech),
        other => Err(DispatchError::InvalidResponseFormat(other.to_owned())),
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Route a chat request to the matching AI operation.
///
/// Validation happens before any remote call: empty content and
/// unrecognized input types are rejected outright.
///
/// # Errors
///
/// Returns a [`DispatchError`] for validation failures, missing
/// configuration, storage failures, or provider errors that are not
/// rate limits.
pub async fn dispatch(state: &AppState, request: &ChatRequest) -> Result<ChatOutcome, DispatchError> {
    if request.content.trim().is_empty() {
        return Err(DispatchError::EmptyContent);
    }
    let input = parse_input_kind(&request.kind)?;

    info!(
        input = ?input,
        response_format = %request.response_format,
        has_file = request.file_url.is_some(),
        "chat: dispatching"
    );

    match input {
        InputKind::Text => handle_text(state, &request.content, &request.response_format).await,
        InputKind::Audio => handle_audio(state, request).await,
        InputKind::Image => handle_image(state, request).await,
    }
}

// =============================================================================
// TEXT INPUT
// =============================================================================

async fn handle_text(state: &AppState, content: &str, format_raw: &str) -> Result<ChatOutcome, DispatchError> {
    let format = parse_response_format(format_raw)?;

    let Some(ai) = &state.ai else {
        if format == ResponseFormat::Text {
            info!("chat: no provider configured, returning simulated reply");
            return Ok(ChatOutcome::Reply(ChatReply {
                kind: MessageKind::Text,
                content: SIMULATED_REPLY.to_owned(),
                file_url: None,
            }));
        }
        return Err(DispatchError::NotConfigured);
    };

    match format {
        ResponseFormat::Text => match ai.chat(content).await {
            Ok(reply) => {
                Ok(ChatOutcome::Reply(ChatReply { kind: MessageKind::Text, content: reply, file_url: None }))
            }
            Err(e) if e.is_rate_limited() => {
                warn!(error = %e, "chat: provider rate limited, degrading reply");
                Ok(ChatOutcome::Degraded {
                    reason: DegradedReason::RateLimited,
                    reply: ChatReply {
                        kind: MessageKind::Text,
                        content: RATE_LIMIT_REPLY.to_owned(),
                        file_url: None,
                    },
                })
            }
            Err(e) => Err(e.into()),
        },
        ResponseFormat::Image => {
            let url = ai.generate_image(content).await?;
            Ok(ChatOutcome::Reply(ChatReply {
                kind: MessageKind::Image,
                content: IMAGE_REPLY.to_owned(),
                file_url: Some(url),
            }))
        }
        ResponseFormat::Speech => {
            let bytes = ai.synthesize_speech(content).await?;
            let file_url = save_speech_file(state, &bytes).await?;
            // The original wire contract labels synthesized speech "audio".
            Ok(ChatOutcome::Reply(ChatReply {
                kind: MessageKind::Audio,
                content: SPEECH_REPLY.to_owned(),
                file_url: Some(file_url),
            }))
        }
    }
}

async fn save_speech_file(state: &AppState, bytes: &[u8]) -> Result<String, DispatchError> {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let filename = format!("speech-{millis}.mp3");
    let path = state.uploads_dir.join(&filename);
    tokio::fs::write(&path, bytes).await?;
    info!(file = %filename, size = bytes.len(), "chat: speech file written");
    Ok(format!("/uploads/{filename}"))
}

// =============================================================================
// AUDIO INPUT
// =============================================================================

async fn handle_audio(state: &AppState, request: &ChatRequest) -> Result<ChatOutcome, DispatchError> {
    let Some(file_url) = request.file_url.as_deref() else {
        return Err(DispatchError::MissingFileUrl("audio"));
    };
    let ai = state.ai.as_ref().ok_or(DispatchError::NotConfigured)?;

    let bytes = fetch_file(state, file_url).await?;
    let transcript = ai.transcribe("audio.mp3", bytes).await?;
    info!(chars = transcript.len(), "chat: audio transcribed");

    handle_text(state, &transcript, &request.response_format).await
}

/// Resolve a `fileUrl` to bytes: locally-served uploads are read straight
/// from the uploads dir, anything else is fetched over HTTP.
pub(crate) async fn fetch_file(state: &AppState, file_url: &str) -> Result<Vec<u8>, DispatchError> {
    if let Some(name) = file_url.strip_prefix("/uploads/") {
        if name.contains('/') || name.contains("..") {
            return Err(DispatchError::FileFetch(format!("invalid uploads path: {file_url}")));
        }
        return Ok(tokio::fs::read(state.uploads_dir.join(name)).await?);
    }

    let response = state
        .http
        .get(file_url)
        .send()
        .await
        .map_err(|e| DispatchError::FileFetch(e.to_string()))?;
    if !response.status().is_success() {
        return Err(DispatchError::FileFetch(format!("status {}", response.status().as_u16())));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| DispatchError::FileFetch(e.to_string()))?;
    Ok(bytes.to_vec())
}

// =============================================================================
// IMAGE INPUT
// =============================================================================

async fn handle_image(state: &AppState, request: &ChatRequest) -> Result<ChatOutcome, DispatchError> {
    let Some(file_url) = request.file_url.as_deref() else {
        return Err(DispatchError::MissingFileUrl("image"));
    };
    let ai = state.ai.as_ref().ok_or(DispatchError::NotConfigured)?;

    let description = ai.describe_image(file_url, VISION_PROMPT).await?;
    info!(chars = description.len(), "chat: image described");

    handle_text(state, &description, &request.response_format).await
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
