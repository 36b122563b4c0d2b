use std::env;
use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {0}: {1}")]
    InvalidVar(&'static str, String),
}

/// Process configuration, read once at startup and passed down explicitly.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub token_secret: String,
    pub media_base_url: String,
    pub media_secret: String,
    pub cors_allowed_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
        let bind_addr = bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidVar("BIND_ADDR", bind_addr.clone()))?;

        Ok(Self {
            database_url: require("DATABASE_URL")?,
            bind_addr,
            token_secret: require("TOKEN_SECRET")?,
            media_base_url: require("MEDIA_BASE_URL")?,
            media_secret: require("MEDIA_SECRET")?,
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok(),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}
