// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: login, profile read/update, deletion.

use crate::error::{AppError, Result};
use crate::middleware::email::is_valid_email;
use crate::middleware::require_valid_email;
use crate::models::{ProfilePatch, UploadedImage, User};
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    // JSON bodies are checked for a valid email before reaching the handler.
    let json_routes = Router::new()
        .route("/login", post(login))
        .route("/deleteUser", delete(delete_user))
        .route_layer(middleware::from_fn(require_valid_email));

    Router::new()
        .merge(json_routes)
        .route(
            "/profile",
            post(update_profile).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/profile/{email}", get(get_profile))
}

// ─── Login ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    /// Identity provider subject to adopt as the account ID.
    #[serde(default)]
    id: Option<serde_json::Value>,
}

/// Normalize the login `id`: strings and numbers are accepted, blank
/// strings, zero and `null`/`false` count as absent.
fn login_id(value: Option<&serde_json::Value>) -> Result<Option<String>> {
    use serde_json::Value;

    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(AppError::BadRequest(
            "Invalid 'id': must be a string or number".into(),
        )),
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub id: String,
}

/// Log in, provisioning the account on first use.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let id = login_id(req.id.as_ref())?;
    tracing::debug!(id_supplied = id.is_some(), "Login request");

    let outcome = state.accounts.login(&req.email, id.as_deref()).await?;

    Ok(Json(LoginResponse {
        id: outcome.id().to_string(),
    }))
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub message: String,
}

/// Get the full profile document for an email.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<User>> {
    let user = state.accounts.get_profile(&email).await?;
    Ok(Json(user))
}

/// Profile update form as submitted by the client.
///
/// Fields are kept as received; `age` is only parsed once the email has
/// been accepted.
#[derive(Debug, Default)]
struct ProfileForm {
    email: Option<String>,
    patch: ProfilePatch,
    age: Option<String>,
    image: Option<UploadedImage>,
}

impl ProfileForm {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut form = ProfileForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or("").to_string();

            if name == "profileImage" {
                let content_type = field.content_type().map(|ct| ct.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;

                if !bytes.is_empty() {
                    form.image = Some(UploadedImage {
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;

            match name.as_str() {
                "email" => form.email = Some(value),
                "username" => form.patch.username = Some(value),
                "aboutMe" => form.patch.about_me = Some(value),
                "gender" => form.patch.gender = Some(value),
                "age" => form.age = Some(value),
                "settings" => form.patch.settings = parse_settings(&value),
                _ => continue,
            }
        }

        Ok(form)
    }

    /// The validated patch and photo, after the email check.
    fn into_update(self) -> Result<(ProfilePatch, Option<UploadedImage>)> {
        let mut patch = self.patch;
        patch.age = match self.age.as_deref() {
            Some(age) => parse_age(age)?,
            None => None,
        };
        Ok((patch, self.image))
    }
}

fn parse_age(value: &str) -> Result<Option<u32>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::BadRequest("Invalid 'age': must be a non-negative integer".into()))
}

/// Settings arrive as JSON text; anything unparsable is kept as a string.
fn parse_settings(value: &str) -> Option<serde_json::Value> {
    if value.trim().is_empty() {
        return None;
    }
    Some(
        serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string())),
    )
}

/// Update profile fields and, optionally, the profile photo.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<MessageResponse>> {
    let form = ProfileForm::from_multipart(multipart).await?;

    let email = form
        .email
        .clone()
        .filter(|email| is_valid_email(email))
        .ok_or(AppError::InvalidEmail)?;
    let (patch, image) = form.into_update()?;

    state.accounts.update_profile(&email, patch, image).await?;

    Ok(Json(MessageResponse {
        message: "Profile updated successfully".to_string(),
    }))
}

// ─── Account Deletion ────────────────────────────────────────

#[derive(Deserialize)]
struct DeleteUserRequest {
    email: String,
}

/// Delete the account from the identity provider and the local store.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteUserRequest>,
) -> Result<Json<MessageResponse>> {
    state.accounts.delete_account(&req.email).await?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}
