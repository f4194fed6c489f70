//! Configuration module for environment variables and application settings

use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// JWT signing configuration
    pub jwt: JwtConfig,

    /// Flow blockchain collaborator configuration
    pub flow: FlowConfig,

    /// OpenAI API key; when unset the keyword interpreter stub is used
    pub openai_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Token lifetime in days
    pub expires_days: i64,
}

#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub network: String,
    pub access_node: String,
    /// Upper bound on any single collaborator call; a hung access node
    /// fails the request instead of hanging it.
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3001".to_string())
                    .parse()
                    .unwrap_or(3001),
            },

            jwt: JwtConfig {
                secret: env::var("JWT_SECRET")
                    .map_err(|_| anyhow!("JWT_SECRET environment variable is required"))?,
                expires_days: env::var("JWT_EXPIRES_DAYS")
                    .unwrap_or_else(|_| "7".to_string())
                    .parse()
                    .unwrap_or(7),
            },

            flow: FlowConfig {
                network: env::var("FLOW_NETWORK").unwrap_or_else(|_| "testnet".to_string()),
                access_node: env::var("FLOW_ACCESS_NODE")
                    .unwrap_or_else(|_| "https://rest-testnet.onflow.org".to_string()),
                request_timeout: Duration::from_secs(
                    env::var("FLOW_REQUEST_TIMEOUT_SECS")
                        .unwrap_or_else(|_| "30".to_string())
                        .parse()
                        .unwrap_or(30),
                ),
            },

            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
        })
    }
}
