//! Authentication Middleware
//!
//! Axum middleware for JWT token validation and user authentication.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{jwt::JwtService, models::AuthUser};
use crate::error::{ApiError, AuthError};

/// Authentication middleware that validates JWT tokens and injects user info
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Middleware function for validating bearer tokens.
    ///
    /// Missing token -> 401, invalid or expired token -> 403; a valid token
    /// puts an [`AuthUser`] into the request extensions for handlers.
    pub async fn validate_token(
        State(jwt_service): State<Arc<JwtService>>,
        mut req: Request,
        next: Next,
    ) -> Result<Response, ApiError> {
        let token = bearer_token(&req).ok_or(AuthError::MissingToken)?;

        let claims = match jwt_service.validate_token(&token) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::warn!("JWT validation failed: {:?}", e);
                return Err(AuthError::InvalidToken.into());
            }
        };

        let auth_user = AuthUser {
            id: claims.sub,
            email: claims.email,
            flow_address: claims.flow_address,
        };

        req.extensions_mut().insert(auth_user);

        Ok(next.run(req).await)
    }
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|auth_header| auth_header.strip_prefix("Bearer "))
        .map(str::to_string)
}
