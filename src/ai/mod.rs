//! AI provider layer.
//!
//! DESIGN
//! ======
//! The [`AiProvider`] trait is the seam between the Request Router and the
//! remote provider: the Router only ever sees the five operations it can
//! dispatch to, and tests substitute a mock. [`OpenAiClient`] is the single
//! concrete implementation, built explicitly in `main` and injected through
//! `AppState` — absence is an `Option`, never a scattered null check.

pub mod config;
pub mod openai;
pub mod types;

pub use openai::OpenAiClient;
pub use types::{AiError, AiProvider};
