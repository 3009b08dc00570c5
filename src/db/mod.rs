//! Database layer (Firestore, with an in-memory fallback).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::User;
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

/// Persistence operations the account handlers need.
///
/// Email uniqueness is the caller's job (look up, then create); id
/// uniqueness is enforced here: `create_user` fails with
/// [`AppError::Conflict`] when the id is already taken.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn create_user(&self, user: &User) -> Result<(), AppError>;

    /// Overwrite an existing user document.
    async fn save_user(&self, user: &User) -> Result<(), AppError>;

    async fn delete_user(&self, id: &str) -> Result<(), AppError>;
}
