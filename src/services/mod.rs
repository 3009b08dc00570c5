// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic and upstream clients.

pub mod access_token;
pub mod account;
pub mod identity;
pub mod moderation;
pub mod service_account;

pub use access_token::AccessTokenHolder;
pub use account::{AccountService, LoginOutcome};
pub use identity::{
    CreatedProviderUser, IdentityClient, IdentityProvider, ProviderUser, ProviderUsers,
};
pub use moderation::{ImageModerator, Likelihood, ModerationOutcome, SafeSearchClient};
pub use service_account::ServiceAccountTokenSource;
