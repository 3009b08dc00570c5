// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile updates expressed as a per-field merge.
//!
//! Every field follows the same rule: the incoming value wins if present,
//! otherwise the stored value is kept if present, otherwise the field's
//! default applies. "Present" means non-empty for text, non-zero for age
//! and non-null for settings, which matches how form clients send blanks
//! for fields they did not touch.

use super::user::{User, DEFAULT_GENDER, DEFAULT_USERNAME};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

const DEFAULT_IMAGE_MIME: &str = "application/octet-stream";

/// Fields submitted with a profile update. `None` means "not sent".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    pub username: Option<String>,
    pub about_me: Option<String>,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub settings: Option<serde_json::Value>,
}

/// An uploaded profile photo that passed moderation.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    /// Encode as an inline `data:<mime>;base64,<payload>` URI.
    pub fn to_data_uri(&self) -> String {
        let mime = self
            .content_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME);
        format!("data:{};base64,{}", mime, BASE64.encode(&self.bytes))
    }
}

impl ProfilePatch {
    /// Merge this patch into `user`. Returns the updated profile; the input
    /// is left untouched so callers can compare before/after.
    pub fn apply(self, user: &User, image: Option<&UploadedImage>) -> User {
        let mut merged = user.clone();

        merged.username = pick(text(self.username), text(Some(user.username.clone())))
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string());
        merged.about_me = pick(text(self.about_me), text(user.about_me.clone()));
        merged.gender = pick(text(self.gender), text(Some(user.gender.clone())))
            .unwrap_or_else(|| DEFAULT_GENDER.to_string());
        merged.age = pick(self.age.filter(|a| *a != 0), user.age.filter(|a| *a != 0));
        merged.settings = pick(
            self.settings.filter(|s| !s.is_null()),
            user.settings.clone(),
        );
        merged.profile_image = image
            .map(UploadedImage::to_data_uri)
            .or_else(|| user.profile_image.clone());
        merged.updated_at = chrono::Utc::now().to_rfc3339();

        merged
    }
}

fn pick<T>(incoming: Option<T>, existing: Option<T>) -> Option<T> {
    incoming.or(existing)
}

fn text(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
