// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account lifecycle: provisioning, profile reads/updates and deletion.
//!
//! Writes that touch both the local store and the identity provider run as
//! a two-step saga:
//! - provisioning with a caller-supplied id creates the provider record
//!   first, and deletes it again if the local create then fails;
//! - deletion removes the provider record first and only then the local
//!   record, so a failed provider delete leaves the account intact.

use crate::db::UserStore;
use crate::error::AppError;
use crate::models::{ProfilePatch, UploadedImage, User};
use crate::services::identity::IdentityProvider;
use crate::services::moderation::{ImageModerator, ModerationOutcome};
use std::sync::Arc;

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// An account already existed for the email.
    Existing { id: String },
    /// A new account was provisioned.
    Created { id: String },
}

impl LoginOutcome {
    pub fn id(&self) -> &str {
        match self {
            LoginOutcome::Existing { id } | LoginOutcome::Created { id } => id,
        }
    }
}

/// Orchestrates the user store, identity provider and image moderator.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    identity: Arc<dyn IdentityProvider>,
    moderator: Arc<dyn ImageModerator>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn UserStore>,
        identity: Arc<dyn IdentityProvider>,
        moderator: Arc<dyn ImageModerator>,
    ) -> Self {
        Self {
            store,
            identity,
            moderator,
        }
    }

    /// Log in or provision the account for `email`.
    ///
    /// Supplying an `id` for an email that already has an account is a
    /// conflict. An empty `id` counts as absent.
    pub async fn login(&self, email: &str, id: Option<&str>) -> Result<LoginOutcome, AppError> {
        let id = id.filter(|id| !id.is_empty());

        if let Some(existing) = self.store.find_by_email(email).await? {
            if id.is_some() {
                tracing::warn!(user_id = %existing.id, "Login supplied an id for an existing account");
                return Err(AppError::Conflict);
            }
            return Ok(LoginOutcome::Existing { id: existing.id });
        }

        let user = match id {
            Some(id) => self.provision_with_id(email, id).await?,
            None => {
                let user = User::new(uuid::Uuid::new_v4().to_string(), email);
                self.store.create_user(&user).await?;
                user
            }
        };

        tracing::info!(user_id = %user.id, "Account provisioned");
        Ok(LoginOutcome::Created { id: user.id })
    }

    /// Ensure an identity provider record exists, then create the local
    /// record under `id`, compensating on local failure.
    async fn provision_with_id(&self, email: &str, id: &str) -> Result<User, AppError> {
        let existing = self.identity.get_users(email).await?;

        let created_provider_id = if existing.first().is_some() {
            tracing::debug!("Identity provider record already exists");
            None
        } else {
            Some(self.identity.create_user(email).await?.id)
        };

        let user = User::new(id, email);
        if let Err(e) = self.store.create_user(&user).await {
            if let Some(provider_id) = created_provider_id {
                tracing::warn!(
                    error = %e,
                    provider_id = %provider_id,
                    "Local create failed, removing identity provider record"
                );
                if let Err(undo) = self.identity.delete_user(&provider_id).await {
                    tracing::error!(
                        error = %undo,
                        provider_id = %provider_id,
                        "Compensating identity provider delete failed"
                    );
                }
            }
            return Err(e);
        }

        Ok(user)
    }

    /// Fetch the full profile for `email`.
    pub async fn get_profile(&self, email: &str) -> Result<User, AppError> {
        self.store
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Apply `patch` (and an optional new photo) to the profile for `email`.
    ///
    /// Photos are moderated before anything is written. If the classifier
    /// cannot be reached the update is refused.
    pub async fn update_profile(
        &self,
        email: &str,
        patch: ProfilePatch,
        image: Option<UploadedImage>,
    ) -> Result<User, AppError> {
        let user = self.get_profile(email).await?;

        if let Some(image) = &image {
            match self.moderator.check_image(&image.bytes).await {
                ModerationOutcome::Safe => {}
                ModerationOutcome::Unsafe { categories } => {
                    tracing::info!(user_id = %user.id, ?categories, "Rejected unsafe profile image");
                    return Err(AppError::UnsafeImage);
                }
                ModerationOutcome::Unavailable { reason } => {
                    return Err(AppError::ModerationUnavailable(reason));
                }
            }
        }

        let updated = patch.apply(&user, image.as_ref());
        self.store.save_user(&updated).await?;

        tracing::info!(
            user_id = %updated.id,
            image_updated = image.is_some(),
            "Profile updated"
        );
        Ok(updated)
    }

    /// Delete the account for `email` from the identity provider, then locally.
    pub async fn delete_account(&self, email: &str) -> Result<(), AppError> {
        let user = self.get_profile(email).await?;

        let provider_users = self.identity.get_users(email).await?;
        match provider_users.first() {
            Some(provider_user) => self.identity.delete_user(&provider_user.id).await?,
            None => tracing::warn!(
                user_id = %user.id,
                "No identity provider record for account, deleting local record only"
            ),
        }

        self.store.delete_user(&user.id).await?;

        tracing::info!(user_id = %user.id, "Account deleted");
        Ok(())
    }
}
