// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Account Mediator: user account lifecycle API
//!
//! This crate provides the backend API for logging users in, serving and
//! updating their profiles (with profile photo moderation), and deleting
//! their accounts from both the local store and the identity provider.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::AccountService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub accounts: AccountService,
}
