//! Conversation view-model — the client-side message list state machine.
//!
//! DESIGN
//! ======
//! Every message moves `Sending → Sent` or `Sending → Error`. The list is
//! transient view state: it lives in memory for the life of the
//! [`Conversation`] and is mutated only by the operations below, so no
//! locking is needed.
//!
//! The view-model talks to the Router through [`ChatTransport`], which
//! tests replace with a mock. [`HttpChatTransport`] is the real
//! implementation against the HTTP API.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::protocol::{ChatRequest, ChatResponse, MessageKind};

pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;
pub const IMAGE_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];
pub const AUDIO_MIME_TYPES: [&str; 3] = ["audio/mpeg", "audio/wav", "audio/ogg"];

// =============================================================================
// TYPES
// =============================================================================

/// Delivery state of a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Sending,
    Sent,
    Error,
}

/// One entry in the conversation.
#[derive(Debug, Clone)]
pub struct Message {
    /// Random token generated client-side; not globally unique across
    /// sessions.
    pub id: String,
    pub content: String,
    pub kind: MessageKind,
    pub is_user: bool,
    pub timestamp: OffsetDateTime,
    pub file_url: Option<String>,
    /// The response format the user asked for (user messages), or the
    /// format this reply was produced in (assistant messages).
    pub response_format: Option<MessageKind>,
    pub error: Option<String>,
    pub status: DeliveryStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("server returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("response parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("{0}")]
    Transport(#[from] TransportError),
    #[error("cannot regenerate response: no user message found")]
    NoUserMessage,
    #[error("message not found: {0}")]
    MessageNotFound(String),
    #[error("file size must be less than 25MB (got {size} bytes)")]
    FileTooLarge { size: u64 },
    #[error("invalid file type {mime}: please upload {expected} file")]
    UnsupportedFileType { mime: String, expected: &'static str },
}

/// Client-side seam to the Router. Mockable in tests.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Submit a message to the Router and return its normalized reply.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] on network failure or a non-success
    /// HTTP status.
    async fn send(
        &self,
        content: &str,
        kind: MessageKind,
        response_format: MessageKind,
        file_url: Option<&str>,
    ) -> Result<ChatResponse, TransportError>;

    /// Upload a file and return its served URL.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] on network failure or a non-success
    /// HTTP status.
    async fn upload(&self, filename: &str, mime: &str, bytes: Vec<u8>) -> Result<String, TransportError>;
}

// =============================================================================
// UPLOAD VALIDATION
// =============================================================================

/// Validate an upload before any network call: size cap and a MIME
/// allow-list keyed by the declared input kind (image kinds accept image
/// MIME types, everything else is treated as audio).
///
/// # Errors
///
/// Returns [`ConversationError::FileTooLarge`] or
/// [`ConversationError::UnsupportedFileType`].
pub fn validate_upload(kind: MessageKind, mime: &str, size: u64) -> Result<(), ConversationError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(ConversationError::FileTooLarge { size });
    }
    let (allowed, expected): (&[&str], &'static str) = match kind {
        MessageKind::Image => (&IMAGE_MIME_TYPES, "an image"),
        _ => (&AUDIO_MIME_TYPES, "an audio"),
    };
    if !allowed.contains(&mime) {
        return Err(ConversationError::UnsupportedFileType { mime: mime.to_owned(), expected });
    }
    Ok(())
}

// =============================================================================
// CONVERSATION
// =============================================================================

pub struct Conversation {
    transport: Arc<dyn ChatTransport>,
    messages: Vec<Message>,
}

impl Conversation {
    #[must_use]
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport, messages: Vec::new() }
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Submit user text: append a pending user message, call the Router,
    /// then mark the user message sent and append the assistant reply.
    ///
    /// On transport failure the *last* list entry is marked `Error` and
    /// the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::Transport`] when the Router call fails.
    pub async fn submit(
        &mut self,
        content: &str,
        kind: MessageKind,
        response_format: MessageKind,
    ) -> Result<(), ConversationError> {
        self.submit_inner(content, kind, response_format, None).await
    }

    /// Validate, upload, then submit a file-backed message. Validation
    /// happens before any network call.
    ///
    /// # Errors
    ///
    /// Returns a validation error for oversized or mis-typed files, or
    /// [`ConversationError::Transport`] when upload or submit fails.
    pub async fn submit_upload(
        &mut self,
        filename: &str,
        mime: &str,
        bytes: Vec<u8>,
        kind: MessageKind,
        response_format: MessageKind,
    ) -> Result<(), ConversationError> {
        validate_upload(kind, mime, bytes.len() as u64)?;
        let file_url = self.transport.upload(filename, mime, bytes).await?;
        self.submit_inner(filename, kind, response_format, Some(file_url))
            .await
    }

    async fn submit_inner(
        &mut self,
        content: &str,
        kind: MessageKind,
        response_format: MessageKind,
        file_url: Option<String>,
    ) -> Result<(), ConversationError> {
        let user_id = new_message_id();
        self.messages.push(Message {
            id: user_id.clone(),
            content: content.to_owned(),
            kind,
            is_user: true,
            timestamp: OffsetDateTime::now_utc(),
            file_url: file_url.clone(),
            response_format: Some(response_format),
            error: None,
            status: DeliveryStatus::Sending,
        });

        match self
            .transport
            .send(content, kind, response_format, file_url.as_deref())
            .await
        {
            Ok(reply) => {
                if let Some(user) = self.messages.iter_mut().find(|m| m.id == user_id) {
                    user.status = DeliveryStatus::Sent;
                }
                self.push_assistant(response_format, reply);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "conversation: submit failed");
                let text = e.to_string();
                if let Some(last) = self.messages.last_mut() {
                    last.status = DeliveryStatus::Error;
                    last.error = Some(text);
                }
                Err(e.into())
            }
        }
    }

    /// Remove a message by id. Unknown ids are a no-op; ordering of the
    /// remaining entries is unchanged.
    pub fn delete(&mut self, id: &str) {
        self.messages.retain(|m| m.id != id);
    }

    /// Regenerate an assistant reply: the entry immediately before the
    /// target must be a user message, whose content is replayed. The list
    /// is truncated to just before the target and a fresh assistant
    /// message appended.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::MessageNotFound`] for an unknown id,
    /// or [`ConversationError::NoUserMessage`] (without mutating the
    /// list) when the preceding entry is not a user message.
    pub async fn regenerate(&mut self, id: &str) -> Result<(), ConversationError> {
        let Some(index) = self.messages.iter().position(|m| m.id == id) else {
            return Err(ConversationError::MessageNotFound(id.to_owned()));
        };
        let Some(user) = index
            .checked_sub(1)
            .map(|i| &self.messages[i])
            .filter(|m| m.is_user)
        else {
            return Err(ConversationError::NoUserMessage);
        };

        let content = user.content.clone();
        let kind = user.kind;
        let response_format = user.response_format.unwrap_or(MessageKind::Text);
        let file_url = user.file_url.clone();

        self.messages.truncate(index);

        let reply = self
            .transport
            .send(&content, kind, response_format, file_url.as_deref())
            .await?;
        self.push_assistant(response_format, reply);
        Ok(())
    }

    fn push_assistant(&mut self, response_format: MessageKind, reply: ChatResponse) {
        let status = if reply.error.is_some() { DeliveryStatus::Error } else { DeliveryStatus::Sent };
        self.messages.push(Message {
            id: new_message_id(),
            content: reply.content,
            kind: response_format,
            is_user: false,
            timestamp: OffsetDateTime::now_utc(),
            file_url: reply.file_url,
            response_format: Some(response_format),
            error: reply.error,
            status,
        });
    }
}

fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// HTTP TRANSPORT
// =============================================================================

/// `ChatTransport` over the HTTP API at a base URL.
pub struct HttpChatTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpChatTransport {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { http: reqwest::Client::new(), base_url }
    }
}

#[async_trait::async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send(
        &self,
        content: &str,
        kind: MessageKind,
        response_format: MessageKind,
        file_url: Option<&str>,
    ) -> Result<ChatResponse, TransportError> {
        let body = ChatRequest {
            content: content.to_owned(),
            kind: kind.as_str().to_owned(),
            response_format: response_format.as_str().to_owned(),
            file_url: file_url.map(str::to_owned),
        };
        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        if status != 200 {
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
                .unwrap_or_else(|| "failed to send message".to_owned());
            return Err(TransportError::Api { status, message });
        }
        serde_json::from_str(&text).map_err(|e| TransportError::Parse(e.to_string()))
    }

    async fn upload(&self, filename: &str, mime: &str, bytes: Vec<u8>) -> Result<String, TransportError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_owned())
            .mime_str(mime)
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        if status != 200 {
            return Err(TransportError::Api { status, message: "failed to upload file".to_owned() });
        }
        serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v.get("fileUrl").and_then(|u| u.as_str()).map(str::to_owned))
            .ok_or_else(|| TransportError::Parse("upload response missing fileUrl".to_owned()))
    }
}

#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;
