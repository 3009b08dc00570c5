// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared bearer token with single-flight refresh.
//!
//! Requests read the current token without contention. When a request sees
//! its token rejected it calls [`AccessTokenHolder::refresh_after`] with the
//! token it used; only one refresh runs at a time, and callers that were
//! holding the same stale token reuse the value the winner fetched.

use crate::error::AppError;
use std::future::Future;
use tokio::sync::{Mutex, RwLock};

pub struct AccessTokenHolder {
    current: RwLock<Option<String>>,
    refresh_lock: Mutex<()>,
}

impl AccessTokenHolder {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            current: RwLock::new(initial),
            refresh_lock: Mutex::new(()),
        }
    }

    /// The cached token, if one has been seeded or fetched.
    pub async fn current(&self) -> Option<String> {
        self.current.read().await.clone()
    }

    /// Return the cached token, fetching one first if none is cached.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<String, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, AppError>>,
    {
        if let Some(token) = self.current().await {
            return Ok(token);
        }
        self.refresh_after(None, fetch).await
    }

    /// Replace `stale` with a fresh token.
    ///
    /// If another caller already replaced `stale` while we waited for the
    /// refresh lock, their token is returned and `fetch` is never called.
    pub async fn refresh_after<F, Fut>(
        &self,
        stale: Option<&str>,
        fetch: F,
    ) -> Result<String, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, AppError>>,
    {
        let _guard = self.refresh_lock.lock().await;

        // Double-check after acquiring the lock.
        if let Some(token) = self.current.read().await.as_deref() {
            if Some(token) != stale {
                return Ok(token.to_string());
            }
        }

        let fresh = fetch().await?;
        *self.current.write().await = Some(fresh.clone());
        tracing::info!("Identity provider access token refreshed");
        Ok(fresh)
    }
}
