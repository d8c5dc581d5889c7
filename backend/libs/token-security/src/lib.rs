//! Token issuance, verification, and revocation
//!
//! Dual-token JWT auth (HS256) with per-user derived signing keys:
//! short-lived access tokens for request authentication and long-lived,
//! single-use refresh tokens. A refresh token is burned in the revocation
//! ledger the moment it verifies, so every refresh call hands back a brand
//! new pair and replaying a consumed token fails closed.
//!
//! Signing keys come from [`key_derivation::derive_signing_key`], which
//! mixes the user's password hash into the key. Access tokens are not
//! individually revocable; their short TTL is the mitigation.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub mod error;
pub mod key_derivation;
pub mod revocation;
pub mod test_utils;
pub mod user_store;

pub use error::{AuthError, Result};
pub use key_derivation::derive_signing_key;
pub use revocation::{RedisRevocationLedger, RevocationLedger};
pub use user_store::{AuthUser, UserStore};

/// The two token roles, carried in the `token_type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// Signed token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: Uuid,
    /// Token role.
    pub token_type: TokenType,
    /// Unique id per issuance; the revocation ledger is keyed by it.
    pub jti: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

/// First-pass decode target, before any signature check. Only the subject
/// matters at this stage; everything else is validated on the second pass.
#[derive(Debug, Deserialize)]
struct UnverifiedClaims {
    #[serde(default)]
    sub: Option<serde_json::Value>,
}

/// Outcome of a successful verification: the validated claims and the
/// resolved user they belong to.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub user: AuthUser,
    pub claims: Claims,
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Stateful token protocol: issuance is pure signing, verification consults
/// the user store for key material and (for refresh tokens) the revocation
/// ledger.
pub struct TokenService {
    users: Arc<dyn UserStore>,
    ledger: Arc<dyn RevocationLedger>,
    master_key: Vec<u8>,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(
        users: Arc<dyn UserStore>,
        ledger: Arc<dyn RevocationLedger>,
        master_key: Vec<u8>,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Self {
        Self {
            users,
            ledger,
            master_key,
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Issue a signed token for `user`. Stateless: nothing is persisted.
    pub fn issue(&self, user: &AuthUser, token_type: TokenType, ttl_secs: i64) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            token_type,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + ttl_secs,
        };

        let key = derive_signing_key(user.id, &user.password_hash, &self.master_key);
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )?;
        Ok(token)
    }

    pub fn issue_access(&self, user: &AuthUser) -> Result<String> {
        self.issue(user, TokenType::Access, self.access_ttl_secs)
    }

    pub fn issue_refresh(&self, user: &AuthUser) -> Result<String> {
        self.issue(user, TokenType::Refresh, self.refresh_ttl_secs)
    }

    /// Verify a token against `expected_type`.
    ///
    /// The subject is read from the payload *before* any signature check,
    /// because the signing key is per-user and cannot be derived until the
    /// user is known. The second decode enforces signature and expiry under
    /// that user's key. Refresh tokens additionally pass through the
    /// ledger and are burned on success (single use).
    pub async fn verify(&self, token: &str, expected_type: TokenType) -> Result<VerifiedToken> {
        let subject = Self::extract_subject(token)?;

        let user = self
            .users
            .find_by_id(subject)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let key = derive_signing_key(user.id, &user.password_hash, &self.master_key);
        let claims = Self::decode_verified(token, &key)?;

        if claims.token_type != expected_type {
            return Err(AuthError::TypeMismatch);
        }

        if expected_type == TokenType::Refresh {
            if self.ledger.contains(&claims.jti).await? {
                return Err(AuthError::Revoked);
            }
            let remaining = claims.exp - Utc::now().timestamp();
            self.ledger.put(&claims.jti, remaining).await?;
        }

        Ok(VerifiedToken { user, claims })
    }

    /// Request-authentication path. Access tokens skip the ledger; they are
    /// not individually revocable and simply expire.
    pub async fn verify_access(&self, token: &str) -> Result<VerifiedToken> {
        self.verify(token, TokenType::Access).await
    }

    /// Consume a refresh token and issue a brand-new pair. The old refresh
    /// token is burned by the verification step and cannot be reused.
    pub async fn refresh_pair(&self, refresh_token: &str) -> Result<TokenPair> {
        let verified = self.verify(refresh_token, TokenType::Refresh).await?;

        let pair = TokenPair {
            access: self.issue_access(&verified.user)?,
            refresh: self.issue_refresh(&verified.user)?,
        };

        tracing::info!(user_id = %verified.user.id, "Refresh token rotated");
        Ok(pair)
    }

    /// Decode without signature verification and pull out the subject.
    fn extract_subject(token: &str) -> Result<Uuid> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<UnverifiedClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|_| AuthError::SignatureInvalid)?;

        data.claims
            .sub
            .as_ref()
            .and_then(|value| value.as_str())
            .and_then(|value| Uuid::parse_str(value).ok())
            .ok_or(AuthError::InvalidPayload)
    }

    /// Full decode under the user's derived key. Zero leeway: a token one
    /// second past `exp` is expired.
    fn decode_verified(token: &str, key: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &DecodingKey::from_secret(key.as_bytes()), &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{InMemoryRevocationLedger, InMemoryUserStore};
    use serde_json::json;

    const MASTER_KEY: &[u8] = b"test-master-secret";
    const ACCESS_TTL: i64 = 900;
    const REFRESH_TTL: i64 = 30 * 24 * 60 * 60;

    async fn setup() -> (TokenService, AuthUser) {
        let users = Arc::new(InMemoryUserStore::new());
        let user = AuthUser {
            id: Uuid::new_v4(),
            password_hash: "argon2-hash-of-superpass".to_string(),
        };
        users.insert(user.clone()).await;

        let service = TokenService::new(
            users,
            Arc::new(InMemoryRevocationLedger::new()),
            MASTER_KEY.to_vec(),
            ACCESS_TTL,
            REFRESH_TTL,
        );
        (service, user)
    }

    #[tokio::test]
    async fn access_token_verifies_with_expected_type() {
        let (service, user) = setup().await;
        let token = service.issue_access(&user).unwrap();

        let verified = service.verify_access(&token).await.unwrap();
        assert_eq!(verified.user.id, user.id);
        assert_eq!(verified.claims.sub, user.id);
        assert_eq!(verified.claims.token_type, TokenType::Access);
        assert!(verified.claims.exp > verified.claims.iat);
        assert!(!verified.claims.jti.is_empty());
    }

    #[tokio::test]
    async fn access_token_fails_as_refresh() {
        let (service, user) = setup().await;
        let token = service.issue_access(&user).unwrap();

        let err = service.verify(&token, TokenType::Refresh).await.unwrap_err();
        assert!(matches!(err, AuthError::TypeMismatch));
    }

    #[tokio::test]
    async fn refresh_token_fails_as_access() {
        let (service, user) = setup().await;
        let token = service.issue_refresh(&user).unwrap();

        let err = service.verify_access(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::TypeMismatch));
    }

    #[tokio::test]
    async fn refresh_token_is_single_use() {
        let (service, user) = setup().await;
        let token = service.issue_refresh(&user).unwrap();

        let pair = service.refresh_pair(&token).await.unwrap();
        assert!(!pair.access.is_empty());
        assert_ne!(pair.refresh, token);

        // The first consumption burned it.
        let err = service.refresh_pair(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::Revoked));

        // The replacement refresh token works.
        service.refresh_pair(&pair.refresh).await.unwrap();
    }

    #[tokio::test]
    async fn expired_token_fails_regardless_of_valid_signature() {
        let (service, user) = setup().await;
        let token = service.issue(&user, TokenType::Refresh, -10).unwrap();

        let err = service.verify(&token, TokenType::Refresh).await.unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[tokio::test]
    async fn password_change_invalidates_outstanding_tokens() {
        let users = Arc::new(InMemoryUserStore::new());
        let user = AuthUser {
            id: Uuid::new_v4(),
            password_hash: "old-hash".to_string(),
        };
        users.insert(user.clone()).await;
        let service = TokenService::new(
            users.clone(),
            Arc::new(InMemoryRevocationLedger::new()),
            MASTER_KEY.to_vec(),
            ACCESS_TTL,
            REFRESH_TTL,
        );

        let token = service.issue_access(&user).unwrap();
        service.verify_access(&token).await.unwrap();

        users.set_password_hash(user.id, "new-hash").await;
        let err = service.verify_access(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::SignatureInvalid));
    }

    #[tokio::test]
    async fn token_for_deleted_user_fails() {
        let (service, _) = setup().await;
        let ghost = AuthUser {
            id: Uuid::new_v4(),
            password_hash: "hash".to_string(),
        };
        let token = service.issue_access(&ghost).unwrap();

        let err = service.verify_access(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn garbage_token_fails_decode() {
        let (service, _) = setup().await;
        let err = service.verify_access("not.a.jwt").await.unwrap_err();
        assert!(matches!(err, AuthError::SignatureInvalid));
    }

    #[tokio::test]
    async fn token_without_subject_is_invalid_payload() {
        let (service, _) = setup().await;
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({
                "token_type": "refresh",
                "jti": Uuid::new_v4().to_string(),
                "iat": now,
                "exp": now + 60,
            }),
            &EncodingKey::from_secret(b"whatever"),
        )
        .unwrap();

        let err = service.verify(&token, TokenType::Refresh).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidPayload));
    }

    #[tokio::test]
    async fn non_uuid_subject_is_invalid_payload() {
        let (service, _) = setup().await;
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({
                "sub": 228,
                "token_type": "refresh",
                "jti": Uuid::new_v4().to_string(),
                "iat": now,
                "exp": now + 60,
            }),
            &EncodingKey::from_secret(b"whatever"),
        )
        .unwrap();

        let err = service.verify(&token, TokenType::Refresh).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidPayload));
    }
}
