//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// Username given to accounts that never set one.
pub const DEFAULT_USERNAME: &str = "Anonymous";
/// Gender given to accounts that never set one.
pub const DEFAULT_GENDER: &str = "Unknown";

/// User profile stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Account ID (also used as document ID)
    pub id: String,
    /// Email address, unique across users
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub about_me: Option<String>,
    pub gender: String,
    #[serde(default)]
    pub age: Option<u32>,
    /// Client-owned settings blob, stored as-is
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
    /// Profile photo as a `data:` URI
    #[serde(default)]
    pub profile_image: Option<String>,
    /// When the account was provisioned (RFC 3339)
    pub created_at: String,
    /// Last profile write (RFC 3339)
    pub updated_at: String,
}

impl User {
    /// A freshly provisioned account with default profile fields.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: id.into(),
            email: email.into(),
            username: DEFAULT_USERNAME.to_string(),
            about_me: None,
            gender: DEFAULT_GENDER.to_string(),
            age: None,
            settings: None,
            profile_image: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
