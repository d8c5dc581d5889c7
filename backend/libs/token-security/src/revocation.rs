//! TTL'd ledger of burned refresh-token identifiers.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::Result;

const REVOKED_KEY_PREFIX: &str = "token:revoked:";
const REVOKED_MARKER: &str = "revoked";

/// Key-value store of revoked token ids (`jti`) with per-key expiry.
///
/// Entries live exactly as long as the token they revoke would have, so the
/// ledger needs no cleanup job. Concurrent `put` calls for the same id are
/// fine: a burned token is unusable by everyone, so "first write wins" is
/// the intended outcome.
#[async_trait]
pub trait RevocationLedger: Send + Sync {
    async fn put(&self, jti: &str, ttl_secs: i64) -> Result<()>;
    async fn contains(&self, jti: &str) -> Result<bool>;
}

/// Redis-backed ledger using native `SET .. EX` expiry.
pub struct RedisRevocationLedger {
    redis: ConnectionManager,
}

impl RedisRevocationLedger {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn key(jti: &str) -> String {
        format!("{REVOKED_KEY_PREFIX}{jti}")
    }
}

#[async_trait]
impl RevocationLedger for RedisRevocationLedger {
    async fn put(&self, jti: &str, ttl_secs: i64) -> Result<()> {
        // The remaining lifetime can round down to zero right at the expiry
        // boundary; Redis rejects EX 0, and the token is moments from dead
        // anyway.
        let ttl = ttl_secs.max(1) as u64;
        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(Self::key(jti), REVOKED_MARKER, ttl)
            .await?;

        tracing::info!(jti = %jti, ttl = ttl, "Refresh token burned");
        Ok(())
    }

    async fn contains(&self, jti: &str) -> Result<bool> {
        let mut conn = self.redis.clone();
        let exists: bool = conn.exists(Self::key(jti)).await?;
        Ok(exists)
    }
}
