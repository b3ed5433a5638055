//! Token error model.

use thiserror::Error;

/// Result type used across token handling.
pub type TokenResult<T> = Result<T, TokenError>;

/// Token handling failure.
///
/// None of these are transient: signature and claim mismatches are
/// deterministic, so callers must not retry.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Algorithm outside {HS256, HS384, HS512} (including `none`).
    #[error("unsupported signing algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    /// Not three segments, or a segment failed base64url/JSON decoding.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token issuer: expected '{expected}', found '{actual}'")]
    InvalidIssuer { expected: String, actual: String },

    #[error("invalid token audience: expected '{expected}', found {actual:?}")]
    InvalidAudience { expected: String, actual: Vec<String> },

    #[error("invalid signing key")]
    InvalidKey,

    #[error("token serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TokenError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedToken(msg.into())
    }

    /// Short stable name of the failure kind, safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            Self::MalformedToken(_) => "malformed_token",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired => "token_expired",
            Self::InvalidIssuer { .. } => "invalid_issuer",
            Self::InvalidAudience { .. } => "invalid_audience",
            Self::InvalidKey => "invalid_key",
            Self::Serialization(_) => "serialization",
        }
    }
}
