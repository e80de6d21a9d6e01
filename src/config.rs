//! Application configuration loaded from the environment.
//!
//! The server binary calls [`AppConfig::from_env`] once at startup (after
//! `dotenvy` has loaded any `.env` file) and threads the result through the
//! shared application state.
//!
//! # Environment Variables
//!
//! - `HOST`: Bind host (default: 0.0.0.0)
//! - `PORT`: Bind port (default: 8080)
//! - `JWT_SECRET`: HS256 signing secret (required)
//! - `TOKEN_TTL_HOURS`: Bearer token lifetime in hours (default: 8)
//! - `UPLOADS_DIR`: Directory for uploaded logo files (default: `uploads`)

use std::path::PathBuf;

/// Runtime configuration for the HTTP server and auth layer.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind the listener to.
    pub host: String,
    /// Port to bind the listener to.
    pub port: u16,
    /// Secret used to sign and verify bearer tokens.
    pub jwt_secret: String,
    /// Lifetime of issued tokens, in hours.
    pub token_ttl_hours: i64,
    /// Directory where uploaded logos are stored and served from.
    pub uploads_dir: PathBuf,
}

impl AppConfig {
    /// Build the configuration from environment variables.
    ///
    /// Fails when `JWT_SECRET` is missing; everything else has a default.
    pub fn from_env() -> Result<Self, String> {
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;
        if jwt_secret.is_empty() {
            return Err("JWT_SECRET must not be empty".to_string());
        }

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);

        let token_ttl_hours = std::env::var("TOKEN_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(8);

        let uploads_dir = std::env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        Ok(Self {
            host,
            port,
            jwt_secret,
            token_ttl_hours,
            uploads_dir,
        })
    }

    /// Create a configuration suitable for tests: in-process secret,
    /// temp-ish uploads dir, ephemeral port.
    pub fn for_tests(jwt_secret: impl Into<String>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt_secret: jwt_secret.into(),
            token_ttl_hours: 8,
            uploads_dir: std::env::temp_dir().join("quotesmith-uploads"),
        }
    }
}
