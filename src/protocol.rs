//! Wire protocol types shared by the HTTP handlers and the client transport.
//!
//! DESIGN
//! ======
//! `ChatRequest` keeps `type` and `responseFormat` as raw strings at the
//! edge so unrecognized values surface as the Router's own validation
//! errors (400) rather than a framework deserialization rejection.
//! `MessageKind` is the typed form used everywhere past that edge.

use serde::{Deserialize, Serialize};

// =============================================================================
// MESSAGE KIND
// =============================================================================

/// Content kind of a message or reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Audio,
    Image,
    Video,
    Speech,
}

impl MessageKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Audio => "audio",
            Self::Image => "image",
            Self::Video => "video",
            Self::Speech => "speech",
        }
    }

    /// Parse a wire string. Returns `None` for unrecognized values.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "text" => Some(Self::Text),
            "audio" => Some(Self::Audio),
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "speech" => Some(Self::Speech),
            _ => None,
        }
    }
}

// =============================================================================
// WIRE SHAPES
// =============================================================================

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "responseFormat", default)]
    pub response_format: String,
    #[serde(rename = "fileUrl", default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

/// Normalized reply of `POST /api/chat`.
///
/// `error` carries a degraded-response code (e.g. `rate_limit_exceeded`)
/// on an otherwise successful reply — failures proper use HTTP status
/// codes, not this field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    #[serde(rename = "fileUrl", default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
