//! Main Entrypoint for the Flight Agent API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment (refusing to start without a
//!    Google API key).
//! 2. Initializing logging and loading the agent prompt.
//! 3. Building the session store, the Gemini agent and the runner.
//! 4. Warming the first session before accepting traffic.
//! 5. Starting the web server, and draining the warm session on shutdown.

use anyhow::Context;
use flight_api::{config::Config, router::create_router, state::AppState, warm::SessionWarmer};
use flight_core::{
    gemini::GeminiAgent,
    runner::Runner,
    session::{InMemorySessionStore, SessionStore},
};
use std::{collections::HashMap, fs, net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

/// A helper function to load prompts from a directory.
fn load_prompts(prompts_path: &std::path::Path) -> anyhow::Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();
    for entry in std::fs::read_dir(prompts_path)
        .with_context(|| format!("Could not read prompts directory {}", prompts_path.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&path)?;
            prompts.insert(prompt_key, content);
        }
    }
    Ok(prompts)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    let prompts = load_prompts(&config.prompts_path)?;
    let instruction = prompts
        .get("flight_agent")
        .context("flight_agent.md not found in prompts directory")?
        .clone();

    // --- 3. Initialize Shared Services ---
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let agent = Arc::new(GeminiAgent::new(
        config.google_api_key.clone(),
        config.gemini_api_base.clone(),
        config.gemini_model.clone(),
        instruction,
    ));
    let runner = Arc::new(Runner::new(
        config.app_name.clone(),
        sessions.clone(),
        agent,
    ));
    let warmer = Arc::new(SessionWarmer::new(
        sessions,
        config.app_name.clone(),
        config.session_user_id.clone(),
    ));

    // --- 4. Warm the first session ---
    info!("Starting flight agent runner and creating initial warm session.");
    warmer.create_and_warm().await;
    info!("Flight agent runner started and initial session warmed.");

    let app_state = Arc::new(AppState {
        runner,
        warmer: warmer.clone(),
    });

    // --- 5. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 6. Start Server ---
    info!(
        model = %config.gemini_model,
        app_name = %config.app_name,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    warmer.shutdown().await;
    info!("Server has shut down.");
    Ok(())
}
