//! Domain services.
//!
//! ARCHITECTURE
//! ============
//! `dispatch` owns the server-side request routing; `conversation` is the
//! client-side view-model. Route handlers stay focused on protocol
//! translation and status mapping.

pub mod conversation;
pub mod dispatch;
