use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use token_security::AuthError;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    /// Stable error code for the transport payload.
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Auth(err) => err.code(),
            CatalogError::Database(_) => "database_error",
            CatalogError::Redis(_) => "redis_error",
            CatalogError::InvalidRecord(_) => "invalid_record",
            CatalogError::Internal(_) => "internal_error",
        }
    }
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        CatalogError::Database(err.to_string())
    }
}

impl From<redis::RedisError> for CatalogError {
    fn from(err: redis::RedisError) -> Self {
        tracing::error!("Redis error: {}", err);
        CatalogError::Redis(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::InvalidRecord(err.to_string())
    }
}

/// Wire shape for error responses; the transport layer serializes this
/// directly.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub detail: String,
    pub errors: Vec<BTreeMap<String, String>>,
}

impl ErrorBody {
    pub fn new(code: &str, detail: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            detail: detail.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: &str, message: &str) -> Self {
        let mut entry = BTreeMap::new();
        entry.insert(field.to_string(), message.to_string());
        self.errors.push(entry);
        self
    }
}

impl From<&CatalogError> for ErrorBody {
    fn from(err: &CatalogError) -> Self {
        ErrorBody::new(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_keep_their_stable_codes() {
        let err = CatalogError::from(AuthError::Revoked);
        assert_eq!(err.code(), "token_revoked");

        let body = ErrorBody::from(&err);
        assert_eq!(body.code, "token_revoked");
        assert_eq!(body.detail, "JWT token revoked");
    }

    #[test]
    fn error_body_serializes_field_entries() {
        let body = ErrorBody::new("invalid_payload", "Invalid token payload")
            .with_field("refresh", "token is malformed");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "invalid_payload");
        assert_eq!(json["errors"][0]["refresh"], "token is malformed");
    }
}
