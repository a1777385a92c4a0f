use flight_core::gemini::DEFAULT_API_BASE;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub google_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub app_name: String,
    pub session_user_id: String,
    pub log_level: Level,
    pub prompts_path: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let google_api_key = std::env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::MissingVar(
                    "GOOGLE_API_KEY not set. Put it in .env or export it.".to_string(),
                )
            })?;

        let bind_address_str = match std::env::var("BIND_ADDRESS") {
            Ok(address) => address,
            Err(_) => {
                let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
                format!("0.0.0.0:{}", port)
            }
        };
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let gemini_model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
        let gemini_api_base =
            std::env::var("GEMINI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let app_name = std::env::var("APP_NAME").unwrap_or_else(|_| "flight_app".to_string());
        let session_user_id =
            std::env::var("SESSION_USER_ID").unwrap_or_else(|_| "anonymous_user".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = std::env::var("PROMPTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./prompts"));

        Ok(Self {
            bind_address,
            google_api_key,
            gemini_model,
            gemini_api_base,
            app_name,
            session_user_id,
            log_level,
            prompts_path,
        })
    }
}
