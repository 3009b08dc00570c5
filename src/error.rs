// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Email is invalid")]
    InvalidEmail,

    #[error("Unsafe content detected in the profile image")]
    UnsafeImage,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists")]
    Conflict,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Identity provider error: {0}")]
    IdentityProvider(String),

    #[error("Image moderation unavailable: {0}")]
    ModerationUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Error code the identity provider reports for a rejected bearer token.
    pub const TOKEN_INVALID: &'static str = "TOKEN_INVALID";

    /// Message surfaced to clients when the image classifier cannot be reached.
    pub const MODERATION_UNAVAILABLE_MESSAGE: &'static str =
        "Currently, there is some error while uploading the profile image. Please try again later.";
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::InvalidEmail => (
                StatusCode::NOT_ACCEPTABLE,
                "invalid_email",
                Some(self.to_string()),
            ),
            AppError::UnsafeImage => (
                StatusCode::NOT_ACCEPTABLE,
                "unsafe_image",
                Some(self.to_string()),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            // Conflict carries no body.
            AppError::Conflict => return StatusCode::CONFLICT.into_response(),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::IdentityProvider(msg) => {
                tracing::error!(error = %msg, "Identity provider error");
                (StatusCode::BAD_GATEWAY, "identity_provider_error", None)
            }
            AppError::ModerationUnavailable(msg) => {
                tracing::error!(error = %msg, "Image moderation unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "moderation_unavailable",
                    Some(Self::MODERATION_UNAVAILABLE_MESSAGE.to_string()),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
