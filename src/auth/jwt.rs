//! JWT Token Service
//!
//! Handles JWT creation, validation, and claims management for user authentication.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;

/// JWT Claims structure containing user information and token metadata
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User unique identifier
    pub sub: String,
    /// User email
    pub email: String,
    /// Linked Flow wallet address, when connected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_address: Option<String>,
    /// Token issued at timestamp
    pub iat: i64,
    /// Token expiration timestamp
    pub exp: i64,
    /// Token issuer
    pub iss: String,
}

/// JWT Service for token operations
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_days: i64,
}

impl JwtService {
    /// Create a new JWT service with the provided signing configuration
    pub fn new(config: &JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::default();
        validation.set_issuer(&["flowgenie-server"]);

        Self {
            encoding_key,
            decoding_key,
            validation,
            expires_days: config.expires_days,
        }
    }

    /// Generate a JWT token for a user
    pub fn create_token(
        &self,
        user_id: &str,
        email: &str,
        flow_address: Option<String>,
    ) -> Result<String> {
        let now = Utc::now();
        let expiration = now + Duration::days(self.expires_days);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            flow_address,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            iss: "flowgenie-server".to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .context("Failed to encode JWT token")
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<TokenData<Claims>> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .context("Failed to validate JWT token")
    }

    /// Extract claims from a token, validating signature and expiry
    pub fn decode_claims(&self, token: &str) -> Result<Claims> {
        let token_data = self.validate_token(token)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::new(&JwtConfig {
            secret: "test_secret".to_string(),
            expires_days: 7,
        })
    }

    #[test]
    fn test_jwt_roundtrip() {
        let jwt_service = test_service();

        // Create token
        let token = jwt_service
            .create_token("user_1", "test@example.com", Some("0xabc123".to_string()))
            .unwrap();

        // Validate token
        let claims = jwt_service.decode_claims(&token).unwrap();

        assert_eq!(claims.sub, "user_1");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.flow_address.as_deref(), Some("0xabc123"));
        assert_eq!(claims.iss, "flowgenie-server");
    }

    #[test]
    fn test_seven_day_expiry() {
        let jwt_service = test_service();
        let token = jwt_service
            .create_token("user_1", "test@example.com", None)
            .unwrap();
        let claims = jwt_service.decode_claims(&token).unwrap();

        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = test_service()
            .create_token("user_1", "test@example.com", None)
            .unwrap();

        let other = JwtService::new(&JwtConfig {
            secret: "other_secret".to_string(),
            expires_days: 7,
        });
        assert!(other.validate_token(&token).is_err());
    }
}
