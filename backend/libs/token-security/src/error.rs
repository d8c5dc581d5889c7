use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Token-domain failures. Every variant is a definitive, non-transient
/// verdict on the presented token; callers map each to a transport
/// response via [`AuthError::code`] and never retry.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The payload decoded but carries no usable subject claim.
    #[error("Invalid token payload")]
    InvalidPayload,

    /// The subject refers to a user that no longer exists.
    #[error("User not found")]
    UserNotFound,

    /// Malformed token or HMAC mismatch under the subject's derived key.
    #[error("JWT token decode error")]
    SignatureInvalid,

    #[error("JWT token expired")]
    Expired,

    /// An access token presented as refresh, or vice versa.
    #[error("Invalid token type")]
    TypeMismatch,

    /// The refresh token was already consumed.
    #[error("JWT token revoked")]
    Revoked,

    #[error("Revocation ledger error: {0}")]
    Ledger(String),

    #[error("User store error: {0}")]
    Store(String),
}

impl AuthError {
    /// Stable error code for the transport error payload.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidPayload => "invalid_payload",
            AuthError::UserNotFound => "user_not_found",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::Expired => "token_expired",
            AuthError::TypeMismatch => "token_type_mismatch",
            AuthError::Revoked => "token_revoked",
            AuthError::Ledger(_) => "ledger_error",
            AuthError::Store(_) => "store_error",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::SignatureInvalid,
        }
    }
}

impl From<redis::RedisError> for AuthError {
    fn from(err: redis::RedisError) -> Self {
        tracing::error!("Redis error: {}", err);
        AuthError::Ledger(err.to_string())
    }
}
