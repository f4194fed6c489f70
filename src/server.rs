//! # Server Module
//!
//! HTTP server setup and route configuration for the FlowGenie backend.
//! All shared services are constructed here once and handed to handlers
//! through [`AppState`].

use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::agent::executor::ActionExecutor;
use crate::agent::interpreter::{CommandInterpreter, KeywordInterpreter, OpenAiInterpreter};
use crate::agent::performance::PerformanceTracker;
use crate::agent::registry::AgentRegistry;
use crate::auth::jwt::JwtService;
use crate::config::Config;
use crate::flow::actions::ActionRegistry;
use crate::flow::client::SimulatedFlowClient;
use crate::routes;
use crate::users::store::UserStore;

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub agents: Arc<AgentRegistry>,
    pub users: Arc<UserStore>,
    pub actions: Arc<ActionRegistry>,
    pub interpreter: Arc<dyn CommandInterpreter>,
    pub executor: Arc<ActionExecutor>,
    pub jwt_service: Arc<JwtService>,
}

/// Starts the FlowGenie HTTP server.
///
/// Wires the agent registry, user store, Flow action registry, interpreter,
/// and executor into [`AppState`], mounts the route modules, and serves
/// until the process is terminated.
pub async fn start(config: Config) {
    let config = Arc::new(config);

    let jwt_service = Arc::new(JwtService::new(&config.jwt));
    let agents = Arc::new(AgentRegistry::new());
    let users = Arc::new(UserStore::new());

    let flow_client = Arc::new(SimulatedFlowClient::new(&config.flow));
    let actions = Arc::new(ActionRegistry::new(
        flow_client,
        config.flow.request_timeout,
    ));

    // The AI interpreter needs an API key; without one the keyword
    // interpreter keeps the full command pipeline usable in demos.
    let interpreter: Arc<dyn CommandInterpreter> = match &config.openai_api_key {
        Some(key) => {
            tracing::info!("Using OpenAI command interpreter");
            Arc::new(OpenAiInterpreter::new(key.clone()))
        }
        None => {
            tracing::info!("OPENAI_API_KEY not set, using keyword command interpreter");
            Arc::new(KeywordInterpreter)
        }
    };

    let tracker = PerformanceTracker::new(agents.clone());
    let executor = Arc::new(ActionExecutor::new(agents.clone(), actions.clone(), tracker));

    let app_state = AppState {
        config: config.clone(),
        agents,
        users,
        actions,
        interpreter,
        executor,
        jwt_service: jwt_service.clone(),
    };

    let app = Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api/users", routes::users::create_routes(jwt_service.clone()))
        .nest("/api/agents", routes::agents::create_routes(jwt_service.clone()))
        .nest("/api/flow", routes::flow::create_routes(jwt_service))
        .layer(
            ServiceBuilder::new().layer(
                CorsLayer::new()
                    .allow_origin(tower_http::cors::Any)
                    .allow_methods([
                        axum::http::Method::GET,
                        axum::http::Method::POST,
                        axum::http::Method::PUT,
                        axum::http::Method::DELETE,
                        axum::http::Method::OPTIONS,
                    ])
                    .allow_headers([
                        axum::http::header::ORIGIN,
                        axum::http::header::CONTENT_TYPE,
                        axum::http::header::ACCEPT,
                        axum::http::header::AUTHORIZATION,
                    ]),
            ),
        )
        .with_state(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address - port may already be in use");

    tracing::info!("🚀 FlowGenie server starting...");
    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/health", addr);
    tracing::info!("🤖 Agent endpoints available at http://{}/api/agents/*", addr);
    tracing::info!("🌊 Flow endpoints available at http://{}/api/flow/*", addr);
    tracing::info!("🌐 Flow network: {}", config.flow.network);

    axum::serve(listener, app).await.unwrap();
}
