//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The
//! `.env` file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// Access tokens live for 7 days, matching the frontend's session handling.
/// Not configurable; only the refresh lifetime is.
pub const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 60 * 24 * 7;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub refresh_token_expire_minutes: i64,
    pub openai_api_key: Option<String>,
    pub chat_model: String,
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("BACKEND_PORT").unwrap_or_else(|_| "8000".to_string());
        let bind_address = format!("{}:{}", host, port)
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BACKEND_HOST/BACKEND_PORT".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Token Settings ---
        let access_token_secret = std::env::var("SECRET_KEY")
            .unwrap_or_else(|_| "super-secret-default-key".to_string());
        let refresh_token_secret = std::env::var("REFRESH_TOKEN_SECRET_KEY")
            .unwrap_or_else(|_| "super-secret-refresh-key".to_string());

        // Defaults to 30 days.
        let refresh_minutes_str = std::env::var("REFRESH_TOKEN_EXPIRE_MINUTES")
            .unwrap_or_else(|_| "43200".to_string());
        let refresh_token_expire_minutes = refresh_minutes_str.parse::<i64>().map_err(|_| {
            ConfigError::InvalidValue(
                "REFRESH_TOKEN_EXPIRE_MINUTES".to_string(),
                format!("'{}' is not a whole number of minutes", refresh_minutes_str),
            )
        })?;

        // --- Load Chat Provider Settings (key is optional; chat degrades) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:5173".to_string(),
                    "http://localhost:3000".to_string(),
                ]
            });

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            access_token_secret,
            refresh_token_secret,
            refresh_token_expire_minutes,
            openai_api_key,
            chat_model,
            cors_origins,
        })
    }
}
