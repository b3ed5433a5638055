//! Token handler: create, write (sign), read (no verification), validate.

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use warden_core::{Claim, claim_types};

use crate::algorithm::SecurityAlgorithm;
use crate::base64url;
use crate::error::{TokenError, TokenResult};
use crate::token::{ClaimValue, JwtHeader, JwtPayload, JwtSecurityToken, expand_claims, numeric_date};

/// Token handler configuration.
#[derive(Debug, Clone, Default)]
pub struct TokenHandlerConfig {
    /// Seconds of clock skew tolerated by the `exp` check.
    pub leeway_secs: i64,
}

impl TokenHandlerConfig {
    pub const LEEWAY_ENV: &'static str = "WARDEN_TOKEN_LEEWAY_SECS";

    /// Defaults overridden by `WARDEN_TOKEN_LEEWAY_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(Self::LEEWAY_ENV) {
            match raw.trim().parse::<i64>() {
                Ok(secs) if secs >= 0 => config.leeway_secs = secs,
                _ => warn!(value = %raw, "ignoring invalid {}", Self::LEEWAY_ENV),
            }
        }
        config
    }

    pub fn with_leeway_secs(mut self, secs: i64) -> Self {
        self.leeway_secs = secs.max(0);
        self
    }
}

/// The three segments of a wire token, still encoded.
struct Segments<'a> {
    header: &'a str,
    payload: &'a str,
    signature: &'a str,
}

impl<'a> Segments<'a> {
    fn split(token: &'a str) -> TokenResult<Self> {
        let mut parts = token.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(payload), Some(signature), None) => Ok(Self {
                header,
                payload,
                signature,
            }),
            _ => Err(TokenError::malformed("expected exactly three segments")),
        }
    }

    /// The signed portion: `header "." payload`, exactly as received.
    fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }
}

/// Creates, signs, parses and verifies compact signed tokens.
///
/// A token string moves through `unparsed → parsed → verified`; there is no
/// way back. [`read_token`](Self::read_token) stops at *parsed* and must not
/// feed an authorization decision; only [`validate_token`](Self::validate_token)
/// yields a *verified* token.
#[derive(Debug, Clone, Default)]
pub struct JwtSecurityTokenHandler {
    config: TokenHandlerConfig,
}

impl JwtSecurityTokenHandler {
    pub fn new(config: TokenHandlerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TokenHandlerConfig {
        &self.config
    }

    /// Build a token from a claim mapping.
    ///
    /// A sequence value yields one claim per element under the same type. With
    /// `expires`, the token carries a single `exp` claim (unix seconds) that
    /// replaces any `exp` in the payload.
    pub fn create_token<K, V>(
        &self,
        payload: impl IntoIterator<Item = (K, V)>,
        algorithm: SecurityAlgorithm,
        expires: Option<DateTime<Utc>>,
    ) -> JwtSecurityToken
    where
        K: Into<String>,
        V: Into<ClaimValue>,
    {
        let mut claims = expand_claims(payload);
        if let Some(expires) = expires {
            claims.retain_claims(|c| c.claim_type() != claim_types::EXPIRATION);
            claims.add_claim(Claim::new(claim_types::EXPIRATION, expires.timestamp().to_string()));
        }
        JwtSecurityToken::new(claims, algorithm)
    }

    /// Serialize and sign: `<header>.<payload>.<base64url(mac)>`.
    pub fn write_token(&self, token: &JwtSecurityToken, key: &[u8]) -> TokenResult<String> {
        let unsigned = token.encode_unsigned()?;
        let mac = token.algorithm().sign(key, unsigned.as_bytes())?;
        debug!(alg = %token.algorithm(), claims = token.claims().len(), "token written");
        Ok(format!("{unsigned}.{}", base64url::encode(mac)))
    }

    /// Parse without verifying the signature or any claim.
    ///
    /// For inspecting an untrusted token (e.g. its declared algorithm) before
    /// deciding how to verify it, or for display. Never authorize on its result.
    pub fn read_token(&self, token: &str) -> TokenResult<JwtSecurityToken> {
        let segments = Segments::split(token)?;
        let parsed = decode(&segments)?;
        debug!(alg = %parsed.algorithm(), claims = parsed.claims().len(), "token read");
        Ok(parsed)
    }

    /// Parse and fully verify against the current time.
    pub fn validate_token(
        &self,
        token: &str,
        key: &[u8],
        issuer: Option<&str>,
        audience: Option<&str>,
    ) -> TokenResult<JwtSecurityToken> {
        self.validate_token_at(token, key, issuer, audience, Utc::now())
    }

    /// Parse and fully verify against `now`.
    ///
    /// The signature is recomputed with the algorithm the token declares and
    /// compared in constant time. Then every claim check runs:
    /// - `exp` present and `exp <= now` → [`TokenError::TokenExpired`]
    ///   (a repeated `exp` or `iss` is [`TokenError::MalformedToken`])
    /// - expected issuer given, `iss` present and different → [`TokenError::InvalidIssuer`]
    /// - expected audience given, `aud` present and none equal → [`TokenError::InvalidAudience`]
    ///
    /// When several checks fail, the first in that order is returned.
    pub fn validate_token_at(
        &self,
        token: &str,
        key: &[u8],
        issuer: Option<&str>,
        audience: Option<&str>,
        now: DateTime<Utc>,
    ) -> TokenResult<JwtSecurityToken> {
        let segments = Segments::split(token).inspect_err(log_rejection)?;
        let parsed = decode(&segments).inspect_err(log_rejection)?;

        verify_signature(&segments, parsed.algorithm(), key).inspect_err(log_rejection)?;

        let failures: Vec<TokenError> = [
            self.check_expiry(&parsed, now),
            check_issuer(&parsed, issuer),
            check_audience(&parsed, audience),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        for failure in &failures {
            log_rejection(failure);
        }

        match failures.into_iter().next() {
            Some(first) => Err(first),
            None => {
                debug!(alg = %parsed.algorithm(), "token validated");
                Ok(parsed)
            }
        }
    }

    fn check_expiry(&self, token: &JwtSecurityToken, now: DateTime<Utc>) -> TokenResult<()> {
        let Some(raw) = token.single_registered(claim_types::EXPIRATION)? else {
            return Ok(());
        };

        let exp = numeric_date(raw).ok_or_else(|| TokenError::malformed("'exp' is not a numeric date"))?;

        if exp + self.config.leeway_secs as f64 <= now.timestamp() as f64 {
            return Err(TokenError::TokenExpired);
        }
        Ok(())
    }
}

fn decode(segments: &Segments<'_>) -> TokenResult<JwtSecurityToken> {
    let header = base64url::decode(segments.header)
        .map_err(|e| TokenError::malformed(format!("header encoding: {e}")))?;
    let payload = base64url::decode(segments.payload)
        .map_err(|e| TokenError::malformed(format!("payload encoding: {e}")))?;

    Ok(JwtSecurityToken::from_parts(
        JwtHeader::from_json(&header)?,
        JwtPayload::from_json(&payload)?,
    ))
}

fn verify_signature(segments: &Segments<'_>, algorithm: SecurityAlgorithm, key: &[u8]) -> TokenResult<()> {
    let expected = base64url::encode(algorithm.sign(key, segments.signing_input().as_bytes())?);

    // Compared in encoded form, so any altered signature byte is a mismatch.
    if bool::from(expected.as_bytes().ct_eq(segments.signature.as_bytes())) {
        Ok(())
    } else {
        Err(TokenError::InvalidSignature)
    }
}

fn check_issuer(token: &JwtSecurityToken, expected: Option<&str>) -> TokenResult<()> {
    match (expected, token.single_registered(claim_types::ISSUER)?) {
        (Some(expected), Some(actual)) if actual != expected => Err(TokenError::InvalidIssuer {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }),
        _ => Ok(()),
    }
}

fn check_audience(token: &JwtSecurityToken, expected: Option<&str>) -> TokenResult<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let audience = token.audience();
    if audience.is_empty() || audience.contains(&expected) {
        Ok(())
    } else {
        Err(TokenError::InvalidAudience {
            expected: expected.to_string(),
            actual: audience.into_iter().map(str::to_string).collect(),
        })
    }
}

fn log_rejection(error: &TokenError) {
    warn!(kind = error.kind(), "token rejected");
}
