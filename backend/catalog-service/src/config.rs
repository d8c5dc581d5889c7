//! Configuration for the catalog service.
//!
//! Loaded once at process start from environment variables (with a `.env`
//! file in development) and passed by reference into the components that
//! need it. Nothing re-reads the environment after startup.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::env;

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub auth: AuthSettings,
}

impl Settings {
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
        }

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            redis: RedisSettings::from_env()?,
            auth: AuthSettings::from_env()?,
        })
    }
}

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("Invalid DATABASE_MIN_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }
}

/// Redis settings for the token-revocation ledger.
#[derive(Debug, Clone)]
pub struct RedisSettings {
    pub url: String,
}

impl RedisSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("REDIS_URL").context("REDIS_URL must be set")?,
        })
    }
}

/// Token issuance settings.
///
/// The master key is base64 at rest and decoded once here; it is HMAC key
/// material for per-user signing-key derivation, never a JWT secret itself.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub master_key: Vec<u8>,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl AuthSettings {
    fn from_env() -> Result<Self> {
        let master_key_b64 = env::var("AUTH_KEY").context("AUTH_KEY must be set")?;
        let master_key = STANDARD
            .decode(master_key_b64.trim())
            .context("AUTH_KEY must be valid base64")?;

        Ok(Self {
            master_key,
            // 15 minutes
            access_ttl_secs: env::var("AUTH_ACCESS_TOKEN_EXPIRATION")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .context("Invalid AUTH_ACCESS_TOKEN_EXPIRATION")?,
            // 30 days
            refresh_ttl_secs: env::var("AUTH_REFRESH_TOKEN_EXPIRATION")
                .unwrap_or_else(|_| "2592000".to_string())
                .parse()
                .context("Invalid AUTH_REFRESH_TOKEN_EXPIRATION")?,
        })
    }
}
