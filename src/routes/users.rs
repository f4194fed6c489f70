//! User Routes
//!
//! Registration, login, and profile management. Register and login are the
//! only unauthenticated endpoints; everything else reads the [`AuthUser`]
//! extension installed by the auth middleware.

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::jwt::JwtService;
use crate::auth::middleware::AuthMiddleware;
use crate::auth::models::{AuthUser, LoginRequest, RegisterRequest};
use crate::error::ApiError;
use crate::server::AppState;
use crate::users::store::UserProfile;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub flow_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Create user routes. The profile and password endpoints are wrapped in
/// the auth middleware; register and login stay open.
pub fn create_routes(jwt_service: Arc<JwtService>) -> Router<AppState> {
    let protected = Router::new()
        .route("/profile", get(get_profile))
        .route("/profile", put(update_profile))
        .route("/password", put(change_password))
        .layer(middleware::from_fn_with_state(
            jwt_service,
            AuthMiddleware::validate_token,
        ));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}

/// POST /api/users/register
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let user = state
        .users
        .register(&payload.email, &payload.password, payload.flow_address)
        .await?;

    let token = state
        .jwt_service
        .create_token(&user.id, &user.email, user.flow_address.clone())?;

    tracing::info!("User registered: {}", user.email);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": UserProfile::from(&user),
            "token": token,
        })),
    ))
}

/// POST /api/users/login
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let user = state
        .users
        .authenticate(&payload.email, &payload.password)
        .await?;

    let token = state
        .jwt_service
        .create_token(&user.id, &user.email, user.flow_address.clone())?;

    tracing::info!("User logged in: {}", user.email);

    Ok(Json(json!({
        "success": true,
        "user": UserProfile::from(&user),
        "token": token,
    })))
}

/// GET /api/users/profile
async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .users
        .get(&auth.id)
        .await
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "user": UserProfile::from(&user),
    })))
}

/// PUT /api/users/profile
async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .users
        .update_profile(&auth.id, payload.email, payload.flow_address.map(Some))
        .await?;

    Ok(Json(json!({
        "success": true,
        "user": UserProfile::from(&user),
    })))
}

/// PUT /api/users/password
async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let (current, new) = match (payload.current_password, payload.new_password) {
        (Some(c), Some(n)) if !n.is_empty() => (c, n),
        _ => {
            return Err(ApiError::Validation(
                "Current and new password are required".to_string(),
            ))
        }
    };

    state.users.change_password(&auth.id, &current, &new).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password updated successfully",
    })))
}
