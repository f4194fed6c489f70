use axum::response::Json;
use chrono::Utc;
use serde_json::json;

/// Health check endpoint handler.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/health`
///
/// Returns a small status object for load balancers, uptime monitors, and
/// container orchestrators:
/// ```json
/// {
///   "status": "healthy",
///   "timestamp": "...",
///   "service": "FlowGenie Backend API",
///   "version": "..."
/// }
/// ```
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "service": "FlowGenie Backend API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
