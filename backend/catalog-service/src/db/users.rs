/// User database operations for the catalog service.
use crate::error::Result;
use crate::models::User;
use async_trait::async_trait;
use sqlx::PgPool;
use token_security::{AuthError, AuthUser, UserStore};
use uuid::Uuid;

/// Find user by ID
pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Find user by email or username, so login works with either
pub async fn find_by_email_or_username(pool: &PgPool, identifier: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 OR username = $1")
        .bind(identifier)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Postgres-backed user lookup for token verification.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> std::result::Result<Option<AuthUser>, AuthError> {
        let user = find_by_id(&self.pool, id)
            .await
            .map_err(|err| AuthError::Store(err.to_string()))?;

        Ok(user.as_ref().map(AuthUser::from))
    }
}
