//! In-memory fakes and connection helpers for token tests.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::Result;
use crate::revocation::RevocationLedger;
use crate::user_store::{AuthUser, UserStore};

/// Get a Redis connection for integration tests.
///
/// Uses `REDIS_TEST_URL` or defaults to localhost; tests should skip
/// gracefully when the connection fails.
pub async fn get_test_redis_connection() -> anyhow::Result<ConnectionManager> {
    let redis_url =
        std::env::var("REDIS_TEST_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

    let client = Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;
    Ok(manager)
}

/// Fixed-content user store backed by a map.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, AuthUser>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: AuthUser) {
        self.users.lock().await.insert(user.id, user);
    }

    pub async fn set_password_hash(&self, id: Uuid, password_hash: &str) {
        if let Some(user) = self.users.lock().await.get_mut(&id) {
            user.password_hash = password_hash.to_string();
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>> {
        Ok(self.users.lock().await.get(&id).cloned())
    }
}

/// Ledger fake honoring TTLs via stored deadlines.
#[derive(Default)]
pub struct InMemoryRevocationLedger {
    entries: Mutex<HashMap<String, Instant>>,
}

impl InMemoryRevocationLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationLedger for InMemoryRevocationLedger {
    async fn put(&self, jti: &str, ttl_secs: i64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_secs(ttl_secs.max(1) as u64);
        self.entries.lock().await.insert(jti.to_string(), deadline);
        Ok(())
    }

    async fn contains(&self, jti: &str) -> Result<bool> {
        Ok(self
            .entries
            .lock()
            .await
            .get(jti)
            .is_some_and(|deadline| *deadline > Instant::now()))
    }
}
