//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development. Identity provider and
//! Cloud Vision credentials are read once at startup and kept in memory.

use std::env;
use std::time::Duration;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Identity provider ---
    /// Identity provider base URL (no trailing slash)
    pub idp_domain: String,
    /// Client-credentials grant client ID
    pub idp_client_id: String,
    /// Client-credentials grant client secret
    pub idp_client_secret: String,
    /// Bearer token to start with; fetched on first use when absent
    pub idp_access_token: Option<String>,

    // --- Cloud Vision ---
    /// Service-account key JSON (inline contents, not a path)
    pub google_credentials: Option<String>,
    /// API key, used when no service account is configured
    pub vision_api_key: Option<String>,
    /// Vision REST base URL
    pub vision_endpoint: String,

    // --- Storage ---
    /// GCP project for Firestore; `None` selects the in-memory store
    pub gcp_project_id: Option<String>,

    // --- Server ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Request body limit for profile uploads
    pub max_upload_bytes: usize,
    /// Timeout applied to every outbound HTTP request
    pub upstream_timeout: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            idp_domain: "http://localhost:9999".to_string(),
            idp_client_id: "test_client_id".to_string(),
            idp_client_secret: "test_secret".to_string(),
            idp_access_token: Some("test_access_token".to_string()),
            google_credentials: None,
            vision_api_key: Some("test_vision_key".to_string()),
            vision_endpoint: DEFAULT_VISION_ENDPOINT.to_string(),
            gcp_project_id: None,
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let google_credentials = optional("GOOGLE_APPLICATION_CREDENTIALS");
        let vision_api_key = optional("VISION_API_KEY");

        if google_credentials.is_none() && vision_api_key.is_none() {
            return Err(ConfigError::Missing(
                "GOOGLE_APPLICATION_CREDENTIALS or VISION_API_KEY",
            ));
        }

        if let Some(creds) = &google_credentials {
            serde_json::from_str::<serde_json::Value>(creds).map_err(|e| {
                ConfigError::Invalid("GOOGLE_APPLICATION_CREDENTIALS", e.to_string())
            })?;
        }

        Ok(Self {
            idp_domain: required("IDP_DOMAIN")?.trim_end_matches('/').to_string(),
            idp_client_id: required("IDP_CLIENT_ID")?,
            idp_client_secret: required("IDP_CLIENT_SECRET")?,
            idp_access_token: optional("IDP_ACCESS_TOKEN"),

            google_credentials,
            vision_api_key,
            vision_endpoint: optional("VISION_ENDPOINT")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_VISION_ENDPOINT.to_string()),

            gcp_project_id: optional("GCP_PROJECT_ID"),

            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            upstream_timeout: Duration::from_secs(
                env::var("UPSTREAM_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            ),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

/// Read a variable, treating blank values as unset.
fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
