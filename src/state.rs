//! Shared application state.
//!
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It carries the optional AI provider, the uploads directory, and a
//! shared HTTP client for fetching remote file URLs.

use std::path::PathBuf;
use std::sync::Arc;

use crate::ai::AiProvider;

/// Shared application state. Clone is required by Axum — inner fields are
/// Arc-wrapped or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Optional AI provider. `None` when no API key is configured;
    /// text/text requests then receive a simulated reply and every other
    /// path fails with a configuration error.
    pub ai: Option<Arc<dyn AiProvider>>,
    /// Directory that generated speech files and uploads are written to,
    /// served back at `/uploads`.
    pub uploads_dir: PathBuf,
    /// HTTP client for downloading remote `fileUrl` inputs.
    pub http: reqwest::Client,
}

impl AppState {
    #[must_use]
    pub fn new(ai: Option<Arc<dyn AiProvider>>, uploads_dir: PathBuf) -> Self {
        Self { ai, uploads_dir, http: reqwest::Client::new() }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
