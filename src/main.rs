use std::path::PathBuf;
use std::sync::Arc;

use omnichat::ai::{AiProvider, OpenAiClient};
use omnichat::{routes, state};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");
    let uploads_dir = PathBuf::from(std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "public/uploads".into()));
    std::fs::create_dir_all(&uploads_dir).expect("uploads dir init failed");

    // AI provider is optional: without a key, text/text requests get a
    // simulated reply and every other path returns a configuration error.
    let ai: Option<Arc<dyn AiProvider>> = match OpenAiClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.chat_model(), "AI provider initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "AI provider not configured — simulated replies only");
            None
        }
    };

    let state = state::AppState::new(ai, uploads_dir);
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");
    tracing::info!(%port, "omnichat listening");
    axum::serve(listener, app).await.expect("server failed");
}
