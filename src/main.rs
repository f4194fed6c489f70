//! # FlowGenie Server
//!
//! Backend API for AI-powered NFT trading agents on the Flow blockchain.
//! Users register accounts, create named trading agents with prompts and
//! risk settings, drive them with natural-language commands, and watch
//! per-agent performance accumulate as commands execute against Flow.
//!
//! ## Architecture
//! The server is organized into modules:
//! - `server`: Core server initialization and shared application state
//! - `config`: Environment variable configuration management
//! - `agent`: Agent records, command interpretation, and execution
//! - `flow`: Flow blockchain action catalog and collaborator client
//! - `users`: Account store with Argon2 password hashing
//! - `auth`: JWT issuance, validation, and middleware
//! - `routes`: HTTP route handlers organized by API domain
//!
//! ## Environment Setup
//! The only required variable is `JWT_SECRET`. Optional: `PORT`,
//! `OPENAI_API_KEY` (enables the AI interpreter), `FLOW_NETWORK`,
//! `FLOW_ACCESS_NODE`, `FLOW_REQUEST_TIMEOUT_SECS`.
//!
//! ## Running the Server
//! ```bash
//! JWT_SECRET=dev-secret cargo run
//! ```
//!
//! ## Health Check
//! ```bash
//! curl http://localhost:3001/health
//! ```

mod agent;
mod auth;
mod config;
mod error;
mod flow;
mod routes;
mod server;
mod users;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point.
///
/// Loads `.env`, initializes the tracing subscriber, validates the
/// configuration, and starts the HTTP server. A missing `JWT_SECRET`
/// fails startup immediately rather than surfacing later as broken
/// token issuance.
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    tracing::info!("🏁 Starting FlowGenie server...");
    tracing::info!(
        "📦 Package: {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    server::start(config).await;
}
