// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use account_mediator::config::Config;
use account_mediator::db::{FirestoreDb, MemoryDb, UserStore};
use account_mediator::error::AppError;
use account_mediator::models::User;
use account_mediator::routes::create_router;
use account_mediator::services::{
    AccountService, CreatedProviderUser, IdentityProvider, ImageModerator, ModerationOutcome,
    ProviderUser, ProviderUsers,
};
use account_mediator::AppState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Connect to the Firestore emulator.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Ordered record of side effects across all fakes.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

#[allow(dead_code)]
impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

/// Memory store that logs writes and can be told to fail creates.
pub struct RecordingStore {
    pub inner: MemoryDb,
    pub fail_create: AtomicBool,
    log: EventLog,
}

#[async_trait]
impl UserStore for RecordingStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        tokio::task::yield_now().await;
        self.inner.find_by_email(email).await
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        tokio::task::yield_now().await;
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::Database("injected create failure".into()));
        }
        self.log.push(format!("local.create:{}", user.id));
        self.inner.create_user(user).await
    }

    async fn save_user(&self, user: &User) -> Result<(), AppError> {
        self.log.push(format!("local.save:{}", user.id));
        self.inner.save_user(user).await
    }

    async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        self.log.push(format!("local.delete:{}", id));
        self.inner.delete_user(id).await
    }
}

/// In-process identity provider keyed by email.
///
/// Like [`RecordingStore`], lookups and creates yield once so concurrent
/// callers interleave the way they would against a real backend.
pub struct FakeIdentity {
    users: Mutex<HashMap<String, String>>,
    next_id: AtomicUsize,
    pub fail_create: AtomicBool,
    pub fail_delete: AtomicBool,
    log: EventLog,
}

#[allow(dead_code)]
impl FakeIdentity {
    pub fn insert(&self, email: &str, provider_id: &str) {
        self.users
            .lock()
            .unwrap()
            .insert(email.to_string(), provider_id.to_string());
    }

    pub fn contains(&self, email: &str) -> bool {
        self.users.lock().unwrap().contains_key(email)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn get_users(&self, email: &str) -> Result<ProviderUsers, AppError> {
        tokio::task::yield_now().await;
        self.log.push(format!("idp.get:{}", email));
        let users = self.users.lock().unwrap().get(email).map(|id| {
            vec![ProviderUser {
                id: id.clone(),
                email: Some(email.to_string()),
            }]
        });
        Ok(ProviderUsers { users })
    }

    async fn create_user(&self, email: &str) -> Result<CreatedProviderUser, AppError> {
        tokio::task::yield_now().await;
        self.log.push(format!("idp.create:{}", email));
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::IdentityProvider("HTTP 500".into()));
        }
        let id = format!("kp_{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.insert(email, &id);
        Ok(CreatedProviderUser { id, created: true })
    }

    async fn delete_user(&self, provider_id: &str) -> Result<(), AppError> {
        self.log.push(format!("idp.delete:{}", provider_id));
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::IdentityProvider("HTTP 500".into()));
        }
        self.users.lock().unwrap().retain(|_, id| id != provider_id);
        Ok(())
    }
}

/// Moderator returning a configurable verdict.
pub struct FakeModerator {
    outcome: Mutex<ModerationOutcome>,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeModerator {
    pub fn set_outcome(&self, outcome: ModerationOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }
}

#[async_trait]
impl ImageModerator for FakeModerator {
    async fn check_image(&self, _bytes: &[u8]) -> ModerationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.lock().unwrap().clone()
    }
}

/// Everything a route or service test needs to drive and inspect the app.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Arc<RecordingStore>,
    pub identity: Arc<FakeIdentity>,
    pub moderator: Arc<FakeModerator>,
    pub log: EventLog,
}

#[allow(dead_code)]
impl TestApp {
    /// A fresh router (routers are consumed by `oneshot`).
    pub fn router(&self) -> axum::Router {
        self.router.clone()
    }

    pub fn accounts(&self) -> &AccountService {
        &self.state.accounts
    }

    /// Seed a local account directly in the store.
    pub async fn seed_user(&self, id: &str, email: &str) -> User {
        let user = User::new(id, email);
        self.store.inner.create_user(&user).await.unwrap();
        user
    }
}

/// Create a test app with in-memory fakes for every collaborator.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let log = EventLog::default();

    let store = Arc::new(RecordingStore {
        inner: MemoryDb::new(),
        fail_create: AtomicBool::new(false),
        log: log.clone(),
    });
    let identity = Arc::new(FakeIdentity {
        users: Mutex::new(HashMap::new()),
        next_id: AtomicUsize::new(1),
        fail_create: AtomicBool::new(false),
        fail_delete: AtomicBool::new(false),
        log: log.clone(),
    });
    let moderator = Arc::new(FakeModerator {
        outcome: Mutex::new(ModerationOutcome::Safe),
        calls: AtomicUsize::new(0),
    });

    let accounts = AccountService::new(store.clone(), identity.clone(), moderator.clone());
    let state = Arc::new(AppState {
        config: Config::default(),
        accounts,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        identity,
        moderator,
        log,
    }
}
