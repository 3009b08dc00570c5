// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (email validation, security headers).

pub mod email;
pub mod security;

pub use email::require_valid_email;
