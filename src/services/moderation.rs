// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile image moderation via Cloud Vision safe-search detection.

use crate::config::Config;
use crate::error::AppError;
use crate::services::service_account::ServiceAccountTokenSource;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;

const VISION_SCOPE: &str = "https://www.googleapis.com/auth/cloud-vision";

/// Any category at or above this percentage marks an image unsafe.
pub const UNSAFE_THRESHOLD: u8 = 50;

/// Ordinal likelihood reported per safe-search category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    #[default]
    Unknown,
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
}

impl Likelihood {
    /// Percentage on the 0/25/50/75/100 scale. `Unknown` carries no signal.
    pub fn percentage(self) -> Option<u8> {
        match self {
            Likelihood::Unknown => None,
            Likelihood::VeryUnlikely => Some(0),
            Likelihood::Unlikely => Some(25),
            Likelihood::Possible => Some(50),
            Likelihood::Likely => Some(75),
            Likelihood::VeryLikely => Some(100),
        }
    }

    fn is_flagged(self) -> bool {
        self.percentage().is_some_and(|p| p >= UNSAFE_THRESHOLD)
    }
}

/// Safe-search ratings for one image.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SafeSearchAnnotation {
    pub adult: Likelihood,
    pub medical: Likelihood,
    pub spoof: Likelihood,
    pub violence: Likelihood,
    pub racy: Likelihood,
}

impl SafeSearchAnnotation {
    /// Names of the categories rated `POSSIBLE` or worse.
    pub fn flagged_categories(&self) -> Vec<&'static str> {
        [
            ("adult", self.adult),
            ("medical", self.medical),
            ("spoof", self.spoof),
            ("violence", self.violence),
            ("racy", self.racy),
        ]
        .into_iter()
        .filter(|(_, likelihood)| likelihood.is_flagged())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_unsafe(&self) -> bool {
        !self.flagged_categories().is_empty()
    }
}

/// Verdict of the moderation gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationOutcome {
    Safe,
    Unsafe { categories: Vec<&'static str> },
    /// The classifier could not be consulted; the image is not proven unsafe.
    Unavailable { reason: String },
}

impl From<&SafeSearchAnnotation> for ModerationOutcome {
    fn from(annotation: &SafeSearchAnnotation) -> Self {
        let categories = annotation.flagged_categories();
        if categories.is_empty() {
            ModerationOutcome::Safe
        } else {
            ModerationOutcome::Unsafe { categories }
        }
    }
}

/// Content-safety check for uploaded images.
#[async_trait]
pub trait ImageModerator: Send + Sync {
    async fn check_image(&self, bytes: &[u8]) -> ModerationOutcome;
}

/// How requests to Cloud Vision are authorized.
pub enum VisionAuth {
    ServiceAccount(ServiceAccountTokenSource),
    ApiKey(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    safe_search_annotation: Option<SafeSearchAnnotation>,
    error: Option<VisionStatus>,
}

#[derive(Deserialize)]
struct VisionStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Cloud Vision REST client restricted to safe-search detection.
pub struct SafeSearchClient {
    http: reqwest::Client,
    endpoint: String,
    auth: VisionAuth,
}

impl SafeSearchClient {
    /// Build from config, preferring service-account credentials over an API key.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client build failed: {}", e)))?;

        let auth = match (&config.google_credentials, &config.vision_api_key) {
            (Some(creds), _) => VisionAuth::ServiceAccount(ServiceAccountTokenSource::from_json(
                creds,
                VISION_SCOPE,
                http.clone(),
            )?),
            (None, Some(key)) => VisionAuth::ApiKey(key.clone()),
            (None, None) => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "No Cloud Vision credentials configured"
                )))
            }
        };

        Ok(Self::with_auth(http, config.vision_endpoint.clone(), auth))
    }

    pub fn with_auth(http: reqwest::Client, endpoint: String, auth: VisionAuth) -> Self {
        Self {
            http,
            endpoint,
            auth,
        }
    }

    /// Run safe-search detection on raw image bytes.
    pub async fn detect_safe_search(&self, bytes: &[u8]) -> Result<SafeSearchAnnotation, AppError> {
        let body = serde_json::json!({
            "requests": [{
                "image": { "content": BASE64.encode(bytes) },
                "features": [{ "type": "SAFE_SEARCH_DETECTION" }]
            }]
        });

        let request = self
            .http
            .post(format!("{}/images:annotate", self.endpoint))
            .json(&body);

        let request = match &self.auth {
            VisionAuth::ServiceAccount(source) => request.bearer_auth(source.access_token().await?),
            VisionAuth::ApiKey(key) => request.query(&[("key", key.as_str())]),
        };

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ModerationUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ModerationUnavailable(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let parsed: AnnotateResponse = response.json().await.map_err(|e| {
            AppError::ModerationUnavailable(format!("JSON parse error: {}", e))
        })?;

        let image = parsed
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ModerationUnavailable("Empty annotate response".into()))?;

        if let Some(err) = image.error {
            return Err(AppError::ModerationUnavailable(format!(
                "Vision error {}: {}",
                err.code, err.message
            )));
        }

        image.safe_search_annotation.ok_or_else(|| {
            AppError::ModerationUnavailable("No safe-search annotation returned".into())
        })
    }
}

#[async_trait]
impl ImageModerator for SafeSearchClient {
    async fn check_image(&self, bytes: &[u8]) -> ModerationOutcome {
        match self.detect_safe_search(bytes).await {
            Ok(annotation) => {
                let outcome = ModerationOutcome::from(&annotation);
                tracing::debug!(?annotation, ?outcome, "Safe-search result");
                outcome
            }
            Err(e) => {
                tracing::error!(error = %e, "Cloud Vision safe-search call failed");
                ModerationOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}
