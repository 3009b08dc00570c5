// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider management API client.
//!
//! Handles:
//! - Client-credentials token exchange
//! - User lookup by email, user creation and deletion
//! - One refresh-and-retry when the provider reports `TOKEN_INVALID`

use crate::config::Config;
use crate::error::AppError;
use crate::services::access_token::AccessTokenHolder;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Identity provider operations used by account provisioning and deletion.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Look up provider records by email.
    async fn get_users(&self, email: &str) -> Result<ProviderUsers, AppError>;

    /// Register a provider record for `email`.
    async fn create_user(&self, email: &str) -> Result<CreatedProviderUser, AppError>;

    /// Remove the provider record with the given provider-assigned id.
    async fn delete_user(&self, provider_id: &str) -> Result<(), AppError>;
}

/// User list payload from `GET /api/v1/users`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderUsers {
    /// Absent when nothing matched.
    #[serde(default)]
    pub users: Option<Vec<ProviderUser>>,
}

impl ProviderUsers {
    /// The first matching record, if any.
    pub fn first(&self) -> Option<&ProviderUser> {
        self.users.as_ref().and_then(|u| u.first())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Response from `POST /api/v1/user`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreatedProviderUser {
    pub id: String,
    #[serde(default)]
    pub created: bool,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Error payload: `{"errors": [{"code": "...", "message": "..."}]}`.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    code: String,
}

/// Whether an error body reports the bearer token as invalid.
pub(crate) fn is_token_invalid(body: &str) -> bool {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.errors.iter().any(|e| e.code == AppError::TOKEN_INVALID))
        .unwrap_or(false)
}

/// HTTP client for the identity provider's management API.
pub struct IdentityClient {
    http: reqwest::Client,
    domain: String,
    client_id: String,
    client_secret: String,
    tokens: AccessTokenHolder,
}

impl IdentityClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            http,
            domain: config.idp_domain.clone(),
            client_id: config.idp_client_id.clone(),
            client_secret: config.idp_client_secret.clone(),
            tokens: AccessTokenHolder::new(config.idp_access_token.clone()),
        })
    }

    /// Exchange client credentials for a management API token.
    pub async fn get_access_token(&self) -> Result<String, AppError> {
        let audience = format!("{}/api", self.domain);
        let response = self
            .http
            .post(format!("{}/oauth2/token", self.domain))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("audience", audience.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Identity provider token exchange failed");
            return Err(AppError::IdentityProvider(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AppError::IdentityProvider(format!("Failed to parse token response: {}", e))
        })?;
        Ok(token.access_token)
    }

    /// Send an authorized request, refreshing the token and retrying exactly
    /// once if the provider reports it invalid.
    async fn send_authorized<F>(&self, build: F) -> Result<reqwest::Response, AppError>
    where
        F: Fn(&str) -> reqwest::RequestBuilder,
    {
        let token = self
            .tokens
            .get_or_fetch(|| self.get_access_token())
            .await?;

        let response = build(&token)
            .send()
            .await
            .map_err(|e| AppError::IdentityProvider(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !is_token_invalid(&body) {
            return Err(AppError::IdentityProvider(format!("HTTP {}: {}", status, body)));
        }

        tracing::info!("Identity provider rejected access token, refreshing and retrying");
        let fresh = self
            .tokens
            .refresh_after(Some(token.as_str()), || self.get_access_token())
            .await?;

        let retry = build(&fresh)
            .send()
            .await
            .map_err(|e| AppError::IdentityProvider(e.to_string()))?;

        if retry.status().is_success() {
            return Ok(retry);
        }

        let status = retry.status();
        let body = retry.text().await.unwrap_or_default();
        Err(AppError::IdentityProvider(format!(
            "HTTP {} after token refresh: {}",
            status, body
        )))
    }

    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AppError> {
        response
            .json()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for IdentityClient {
    async fn get_users(&self, email: &str) -> Result<ProviderUsers, AppError> {
        let url = format!("{}/api/v1/users", self.domain);
        let response = self
            .send_authorized(|token| {
                self.http
                    .get(&url)
                    .bearer_auth(token)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .query(&[("email", email)])
            })
            .await?;

        Self::parse_json(response).await
    }

    async fn create_user(&self, email: &str) -> Result<CreatedProviderUser, AppError> {
        let url = format!("{}/api/v1/user", self.domain);
        let body = serde_json::json!({
            "identities": [
                { "type": "email", "details": { "email": email } }
            ]
        });

        let response = self
            .send_authorized(|token| {
                self.http
                    .post(&url)
                    .bearer_auth(token)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .json(&body)
            })
            .await?;

        let created: CreatedProviderUser = Self::parse_json(response).await?;
        tracing::info!(provider_id = %created.id, "Identity provider user created");
        Ok(created)
    }

    async fn delete_user(&self, provider_id: &str) -> Result<(), AppError> {
        let url = format!("{}/api/v1/user", self.domain);
        self.send_authorized(|token| {
            self.http
                .delete(&url)
                .bearer_auth(token)
                .header(reqwest::header::ACCEPT, "application/json")
                .query(&[("id", provider_id)])
        })
        .await?;

        tracing::info!(provider_id, "Identity provider user deleted");
        Ok(())
    }
}
