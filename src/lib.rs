//! Omnichat — a multi-modal chat relay.
//!
//! ARCHITECTURE
//! ============
//! Two thin cooperating pieces:
//!
//! - The **Request Router** (`services::dispatch` behind `POST /api/chat`)
//!   classifies an incoming message by input type (text / audio / image)
//!   and desired response format (text / image / speech), and delegates to
//!   exactly one remote AI operation: chat completion, image generation,
//!   speech synthesis, transcription, or vision analysis.
//! - The **Conversation view-model** (`services::conversation`) holds the
//!   ordered message list with per-message delivery status and implements
//!   submit / delete / regenerate plus upload validation. It talks to the
//!   Router through the `ChatTransport` trait.
//!
//! Messages live only in view state — there is no persistence layer. The
//! only durable artifacts are generated speech files and uploads written
//! to the uploads directory and served back at `/uploads`.

pub mod ai;
pub mod protocol;
pub mod routes;
pub mod services;
pub mod state;
