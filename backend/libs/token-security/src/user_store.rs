//! Read-only view of the identity subsystem needed for token work.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;

/// The slice of a user record that token issuance and verification need.
/// The password hash is key material here, never verified.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub password_hash: String,
}

/// Lookup seam into the user store owned by the identity subsystem.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>>;
}
