use super::*;
use std::sync::Mutex;

// =============================================================================
// MockTransport
// =============================================================================

/// Records every call; `replies` overrides the default reply when
/// non-empty (drained front-first).
#[derive(Default)]
struct MockTransport {
    replies: Mutex<Vec<Result<ChatResponse, TransportError>>>,
    sends: Mutex<Vec<(String, MessageKind, MessageKind, Option<String>)>>,
    uploads: Mutex<Vec<(String, String, usize)>>,
}

impl MockTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn queue(&self, reply: Result<ChatResponse, TransportError>) {
        self.replies.lock().unwrap().push(reply);
    }

    fn send_count(&self) -> usize {
        self.sends.lock().unwrap().len()
    }

    fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ChatTransport for MockTransport {
    async fn send(
        &self,
        content: &str,
        kind: MessageKind,
        response_format: MessageKind,
        file_url: Option<&str>,
    ) -> Result<ChatResponse, TransportError> {
        self.sends.lock().unwrap().push((
            content.to_owned(),
            kind,
            response_format,
            file_url.map(str::to_owned),
        ));
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            Ok(ChatResponse { kind: MessageKind::Text, content: "hi there".into(), file_url: None, error: None })
        } else {
            replies.remove(0)
        }
    }

    async fn upload(&self, filename: &str, mime: &str, bytes: Vec<u8>) -> Result<String, TransportError> {
        self.uploads
            .lock()
            .unwrap()
            .push((filename.to_owned(), mime.to_owned(), bytes.len()));
        Ok("/uploads/mock-file".into())
    }
}

// =============================================================================
// submit
// =============================================================================

#[tokio::test]
async fn submit_appends_user_and_assistant_both_sent() {
    let transport = MockTransport::new();
    let mut convo = Conversation::new(transport.clone());

    convo
        .submit("hello", MessageKind::Text, MessageKind::Text)
        .await
        .unwrap();

    let messages = convo.messages();
    assert_eq!(messages.len(), 2);

    assert!(messages[0].is_user);
    assert_eq!(messages[0].content, "hello");
    assert_eq!(messages[0].status, DeliveryStatus::Sent);

    assert!(!messages[1].is_user);
    assert!(!messages[1].content.is_empty());
    assert_eq!(messages[1].kind, MessageKind::Text);
    assert_eq!(messages[1].status, DeliveryStatus::Sent);
}

#[tokio::test]
async fn submit_failure_marks_last_entry_error() {
    let transport = MockTransport::new();
    transport.queue(Err(TransportError::Http("connection refused".into())));
    let mut convo = Conversation::new(transport.clone());

    let err = convo
        .submit("hello", MessageKind::Text, MessageKind::Text)
        .await
        .unwrap_err();
    assert!(matches!(err, ConversationError::Transport(_)));

    let messages = convo.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].status, DeliveryStatus::Error);
    assert!(
        messages[0]
            .error
            .as_deref()
            .unwrap()
            .contains("connection refused")
    );
}

#[tokio::test]
async fn degraded_reply_flags_assistant_but_not_user() {
    let transport = MockTransport::new();
    transport.queue(Ok(ChatResponse {
        kind: MessageKind::Text,
        content: "I apologize, but I've hit my rate limit.".into(),
        file_url: None,
        error: Some("rate_limit_exceeded".into()),
    }));
    let mut convo = Conversation::new(transport.clone());

    convo
        .submit("hello", MessageKind::Text, MessageKind::Text)
        .await
        .unwrap();

    let messages = convo.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].status, DeliveryStatus::Sent);
    assert_eq!(messages[1].status, DeliveryStatus::Error);
    assert_eq!(messages[1].error.as_deref(), Some("rate_limit_exceeded"));
}

#[tokio::test]
async fn assistant_kind_follows_requested_format() {
    let transport = MockTransport::new();
    transport.queue(Ok(ChatResponse {
        kind: MessageKind::Audio,
        content: "Generated speech from your text".into(),
        file_url: Some("/uploads/speech-1.mp3".into()),
        error: None,
    }));
    let mut convo = Conversation::new(transport.clone());

    convo
        .submit("read this", MessageKind::Text, MessageKind::Speech)
        .await
        .unwrap();

    let assistant = &convo.messages()[1];
    assert_eq!(assistant.kind, MessageKind::Speech);
    assert_eq!(assistant.file_url.as_deref(), Some("/uploads/speech-1.mp3"));
}

// =============================================================================
// delete
// =============================================================================

#[tokio::test]
async fn delete_removes_exactly_one_and_preserves_order() {
    let transport = MockTransport::new();
    let mut convo = Conversation::new(transport.clone());
    convo
        .submit("first", MessageKind::Text, MessageKind::Text)
        .await
        .unwrap();
    convo
        .submit("second", MessageKind::Text, MessageKind::Text)
        .await
        .unwrap();
    assert_eq!(convo.messages().len(), 4);

    let removed_id = convo.messages()[1].id.clone();
    let expected: Vec<String> = convo
        .messages()
        .iter()
        .filter(|m| m.id != removed_id)
        .map(|m| m.id.clone())
        .collect();

    convo.delete(&removed_id);

    let remaining: Vec<String> = convo.messages().iter().map(|m| m.id.clone()).collect();
    assert_eq!(remaining, expected);
}

#[tokio::test]
async fn delete_unknown_id_is_a_noop() {
    let transport = MockTransport::new();
    let mut convo = Conversation::new(transport.clone());
    convo
        .submit("hello", MessageKind::Text, MessageKind::Text)
        .await
        .unwrap();

    convo.delete("not-a-real-id");
    assert_eq!(convo.messages().len(), 2);
}

// =============================================================================
// regenerate
// =============================================================================

#[tokio::test]
async fn regenerate_requires_preceding_user_message() {
    let transport = MockTransport::new();
    let mut convo = Conversation::new(transport.clone());
    convo
        .submit("hello", MessageKind::Text, MessageKind::Text)
        .await
        .unwrap();

    // Delete the user message so the assistant reply has no predecessor.
    let user_id = convo.messages()[0].id.clone();
    let assistant_id = convo.messages()[1].id.clone();
    convo.delete(&user_id);

    let before: Vec<String> = convo.messages().iter().map(|m| m.id.clone()).collect();
    let err = convo.regenerate(&assistant_id).await.unwrap_err();
    assert!(matches!(err, ConversationError::NoUserMessage));

    let after: Vec<String> = convo.messages().iter().map(|m| m.id.clone()).collect();
    assert_eq!(before, after, "failed regenerate must not mutate the list");
}

#[tokio::test]
async fn regenerate_unknown_id_fails_without_mutation() {
    let transport = MockTransport::new();
    let mut convo = Conversation::new(transport.clone());
    convo
        .submit("hello", MessageKind::Text, MessageKind::Text)
        .await
        .unwrap();

    let err = convo.regenerate("missing").await.unwrap_err();
    assert!(matches!(err, ConversationError::MessageNotFound(_)));
    assert_eq!(convo.messages().len(), 2);
}

#[tokio::test]
async fn regenerate_replays_user_content_and_replaces_reply() {
    let transport = MockTransport::new();
    let mut convo = Conversation::new(transport.clone());
    convo
        .submit("hello", MessageKind::Text, MessageKind::Text)
        .await
        .unwrap();

    let old_assistant_id = convo.messages()[1].id.clone();
    transport.queue(Ok(ChatResponse {
        kind: MessageKind::Text,
        content: "regenerated".into(),
        file_url: None,
        error: None,
    }));

    convo.regenerate(&old_assistant_id).await.unwrap();

    let messages = convo.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "regenerated");
    assert_ne!(messages[1].id, old_assistant_id);

    let sends = transport.sends.lock().unwrap();
    assert_eq!(sends.len(), 2);
    assert_eq!(sends[1].0, "hello");
}

#[tokio::test]
async fn regenerate_truncates_everything_after_the_target() {
    let transport = MockTransport::new();
    let mut convo = Conversation::new(transport.clone());
    convo
        .submit("first", MessageKind::Text, MessageKind::Text)
        .await
        .unwrap();
    convo
        .submit("second", MessageKind::Text, MessageKind::Text)
        .await
        .unwrap();

    // Regenerate the first assistant reply: the second exchange is dropped.
    let first_assistant_id = convo.messages()[1].id.clone();
    convo.regenerate(&first_assistant_id).await.unwrap();

    let messages = convo.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "first");
}

// =============================================================================
// uploads
// =============================================================================

#[tokio::test]
async fn oversized_upload_is_rejected_before_any_network_call() {
    let transport = MockTransport::new();
    let mut convo = Conversation::new(transport.clone());

    let bytes = vec![0_u8; (MAX_UPLOAD_BYTES + 1) as usize];
    let err = convo
        .submit_upload("big.mp3", "audio/mpeg", bytes, MessageKind::Audio, MessageKind::Text)
        .await
        .unwrap_err();

    assert!(matches!(err, ConversationError::FileTooLarge { .. }));
    assert_eq!(transport.upload_count(), 0);
    assert_eq!(transport.send_count(), 0);
    assert!(convo.messages().is_empty());
}

#[tokio::test]
async fn wrong_mime_type_is_rejected_before_any_network_call() {
    let transport = MockTransport::new();
    let mut convo = Conversation::new(transport.clone());

    let err = convo
        .submit_upload("pic.mp3", "audio/mpeg", vec![1], MessageKind::Image, MessageKind::Text)
        .await
        .unwrap_err();

    assert!(matches!(err, ConversationError::UnsupportedFileType { .. }));
    assert_eq!(transport.upload_count(), 0);
    assert_eq!(transport.send_count(), 0);
}

#[tokio::test]
async fn valid_upload_flows_through_to_submit() {
    let transport = MockTransport::new();
    let mut convo = Conversation::new(transport.clone());

    convo
        .submit_upload("clip.mp3", "audio/mpeg", vec![1, 2, 3], MessageKind::Audio, MessageKind::Text)
        .await
        .unwrap();

    assert_eq!(transport.upload_count(), 1);
    let sends = transport.sends.lock().unwrap();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].3.as_deref(), Some("/uploads/mock-file"));
    drop(sends);

    let messages = convo.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].file_url.as_deref(), Some("/uploads/mock-file"));
    assert_eq!(messages[0].status, DeliveryStatus::Sent);
}

// =============================================================================
// validate_upload
// =============================================================================

#[test]
fn upload_at_exact_size_limit_is_allowed() {
    assert!(validate_upload(MessageKind::Audio, "audio/wav", MAX_UPLOAD_BYTES).is_ok());
}

#[test]
fn image_mime_allow_list() {
    for mime in IMAGE_MIME_TYPES {
        assert!(validate_upload(MessageKind::Image, mime, 10).is_ok(), "{mime}");
    }
    assert!(validate_upload(MessageKind::Image, "image/tiff", 10).is_err());
}

#[test]
fn audio_mime_allow_list() {
    for mime in AUDIO_MIME_TYPES {
        assert!(validate_upload(MessageKind::Audio, mime, 10).is_ok(), "{mime}");
    }
    assert!(validate_upload(MessageKind::Audio, "audio/flac", 10).is_err());
}
