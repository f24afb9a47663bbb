//! Configuration module for the MeetNotes backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Fallback signing secret for local development. Production deployments
/// must set MEETNOTES_JWT_SECRET.
const DEV_JWT_SECRET: &str = "meetnotes-dev-secret";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secret used to sign and verify JWT access tokens
    pub jwt_secret: String,
    /// Whether the JWT secret came from the environment
    pub jwt_secret_from_env: bool,
    /// Access token lifetime in seconds
    pub token_ttl_secs: i64,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env_secret = env::var("MEETNOTES_JWT_SECRET").ok();
        let jwt_secret_from_env = env_secret.is_some();
        let jwt_secret = env_secret.unwrap_or_else(|| DEV_JWT_SECRET.to_string());

        let token_ttl_secs = env::var("MEETNOTES_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let db_path = env::var("MEETNOTES_DB_PATH")
            .unwrap_or_else(|_| "./data/app.sqlite".to_string())
            .into();

        let index_path = env::var("MEETNOTES_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_addr = env::var("MEETNOTES_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:4000".to_string())
            .parse()
            .expect("Invalid MEETNOTES_BIND_ADDR format");

        let log_level = env::var("MEETNOTES_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            jwt_secret,
            jwt_secret_from_env,
            token_ttl_secs,
            db_path,
            index_path,
            bind_addr,
            log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("MEETNOTES_JWT_SECRET");
        env::remove_var("MEETNOTES_TOKEN_TTL_SECS");
        env::remove_var("MEETNOTES_DB_PATH");
        env::remove_var("MEETNOTES_INDEX_PATH");
        env::remove_var("MEETNOTES_BIND_ADDR");
        env::remove_var("MEETNOTES_LOG_LEVEL");

        let config = Config::from_env();

        assert!(!config.jwt_secret_from_env);
        assert_eq!(config.token_ttl_secs, 86_400);
        assert_eq!(config.db_path, PathBuf::from("./data/app.sqlite"));
        assert_eq!(config.index_path, PathBuf::from("./data/index"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:4000");
        assert_eq!(config.log_level, "info");
    }
}
