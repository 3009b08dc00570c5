// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google service-account access tokens (JWT bearer grant).
//!
//! Signs an RS256 assertion with the service-account private key, exchanges
//! it at the key's `token_uri`, and caches the resulting access token until
//! shortly before it expires.

use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// The subset of a service-account key file we need.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Mints and caches access tokens for one service account and scope.
pub struct ServiceAccountTokenSource {
    http: reqwest::Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    /// Build from the JSON contents of a service-account key file.
    pub fn from_json(
        json: &str,
        scope: impl Into<String>,
        http: reqwest::Client,
    ) -> Result<Self, AppError> {
        let key: ServiceAccountKey = serde_json::from_str(json).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Invalid service-account credentials: {}", e))
        })?;

        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Invalid service-account private key: {}", e))
        })?;

        tracing::info!(client_email = %key.client_email, "Service-account credentials loaded");

        Ok(Self {
            http,
            key,
            encoding_key,
            scope: scope.into(),
            cached: Mutex::new(None),
        })
    }

    /// Return a valid access token, exchanging a new assertion if the cached
    /// one is missing or about to expire.
    ///
    /// The lock is held across the exchange so concurrent callers share one
    /// token request.
    pub async fn access_token(&self) -> Result<String, AppError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref() {
            if now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.exchange_assertion(now).await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn exchange_assertion(&self, now: DateTime<Utc>) -> Result<CachedToken, AppError> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| {
                AppError::ModerationUnavailable(format!("Failed to sign assertion: {}", e))
            })?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| {
                AppError::ModerationUnavailable(format!("Token request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ModerationUnavailable(format!(
                "Service-account token exchange failed with status {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AppError::ModerationUnavailable(format!("Failed to parse token response: {}", e))
        })?;

        tracing::debug!(expires_in = token.expires_in, "Service-account token issued");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_defaults_token_uri() {
        let key: ServiceAccountKey = serde_json::from_str(
            r#"{"client_email":"svc@p.iam.gserviceaccount.com","private_key":"pem"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_rejects_bad_private_key() {
        let json = r#"{"client_email":"svc@p.iam.gserviceaccount.com","private_key":"not a pem"}"#;
        let result = ServiceAccountTokenSource::from_json(json, "scope", reqwest::Client::new());
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
