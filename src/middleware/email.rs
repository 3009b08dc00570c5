// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email validation for JSON request bodies.

use crate::error::AppError;
use axum::{
    body::{to_bytes, Body},
    extract::Request,
    middleware::Next,
    response::Response,
};
use validator::ValidateEmail;

/// Largest JSON body the validator will buffer.
const MAX_JSON_BODY_BYTES: usize = 64 * 1024;

/// Syntactic email check.
pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && email.validate_email()
}

/// Extract a valid email from a parsed body field.
///
/// Missing fields, non-string values and malformed addresses are all
/// rejected the same way.
pub fn check_email(value: Option<&serde_json::Value>) -> Result<&str, AppError> {
    value
        .and_then(|v| v.as_str())
        .filter(|email| is_valid_email(email))
        .ok_or(AppError::InvalidEmail)
}

/// Middleware that rejects JSON requests without a valid `email` field.
///
/// The body is buffered, inspected and handed on unchanged.
pub async fn require_valid_email(request: Request, next: Next) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_JSON_BODY_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(format!("Unreadable request body: {}", e)))?;

    let parsed: Option<serde_json::Value> = serde_json::from_slice(&bytes).ok();
    if let Err(e) = check_email(parsed.as_ref().and_then(|v| v.get("email"))) {
        tracing::debug!(path = %parts.uri.path(), "Rejected request with invalid email");
        return Err(e);
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
