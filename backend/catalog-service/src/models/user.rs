use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use token_security::AuthUser;
use uuid::Uuid;

/// Account row. Owned by the identity subsystem; the catalog only reads it
/// for token verification and ownership checks.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        AuthUser {
            id: user.id,
            password_hash: user.password_hash.clone(),
        }
    }
}
