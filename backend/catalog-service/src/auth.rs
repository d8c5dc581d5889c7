//! Wiring of the token service onto the catalog's infrastructure.

use crate::config::Settings;
use crate::db::users::PgUserStore;
use crate::error::Result;
use sqlx::PgPool;
use std::sync::Arc;
use token_security::{RedisRevocationLedger, TokenService};

/// Build a [`TokenService`] backed by Postgres users and a Redis revocation
/// ledger.
pub async fn build_token_service(settings: &Settings, pool: PgPool) -> Result<TokenService> {
    let client = redis::Client::open(settings.redis.url.as_str())?;
    let connection = redis::aio::ConnectionManager::new(client).await?;

    Ok(TokenService::new(
        Arc::new(PgUserStore::new(pool)),
        Arc::new(RedisRevocationLedger::new(connection)),
        settings.auth.master_key.clone(),
        settings.auth.access_ttl_secs,
        settings.auth.refresh_ttl_secs,
    ))
}
