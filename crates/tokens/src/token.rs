//! Structured token model: header, payload and the token itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use warden_core::{Claim, ClaimsIdentity, claim_types};

use crate::algorithm::SecurityAlgorithm;
use crate::base64url;
use crate::error::{TokenError, TokenResult};

/// Authentication type of identities built from tokens.
pub const JWT_AUTHENTICATION_TYPE: &str = "jwt";

const TOKEN_TYPE: &str = "JWT";

/// Registered claims carried as JSON numbers on the wire.
const NUMERIC_CLAIMS: [&str; 3] = [
    claim_types::EXPIRATION,
    claim_types::ISSUED_AT,
    claim_types::NOT_BEFORE,
];

/// Token header: `{"alg": "...", "typ": "JWT"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JwtHeader {
    alg: SecurityAlgorithm,
    typ: String,
}

impl JwtHeader {
    pub fn new(alg: SecurityAlgorithm) -> Self {
        Self {
            alg,
            typ: TOKEN_TYPE.to_string(),
        }
    }

    pub fn algorithm(&self) -> SecurityAlgorithm {
        self.alg
    }

    pub fn token_type(&self) -> &str {
        &self.typ
    }

    /// Decode a header segment's JSON, rejecting unknown algorithms.
    pub(crate) fn from_json(bytes: &[u8]) -> TokenResult<Self> {
        #[derive(Deserialize)]
        struct RawHeader {
            alg: Option<String>,
            typ: Option<String>,
        }

        let raw: RawHeader = serde_json::from_slice(bytes)
            .map_err(|e| TokenError::malformed(format!("header: {e}")))?;

        let alg = raw
            .alg
            .ok_or_else(|| TokenError::malformed("header has no 'alg'"))?
            .parse::<SecurityAlgorithm>()?;

        if let Some(typ) = &raw.typ {
            if !typ.eq_ignore_ascii_case(TOKEN_TYPE) {
                return Err(TokenError::malformed(format!("unexpected token type '{typ}'")));
            }
        }

        Ok(Self::new(alg))
    }
}

/// A claim value as supplied when creating a token.
///
/// A sequence becomes one claim per element, all with the same claim type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimValue {
    Single(String),
    Multiple(Vec<String>),
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for ClaimValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multiple(values)
    }
}

impl From<Vec<&str>> for ClaimValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ClaimValue {
    fn from(values: [&str; N]) -> Self {
        Self::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

impl ClaimValue {
    fn into_values(self) -> Vec<String> {
        match self {
            Self::Single(value) => vec![value],
            Self::Multiple(values) => values,
        }
    }
}

/// Expand a key → value(s) mapping into claims, one per value.
pub(crate) fn expand_claims<K, V>(payload: impl IntoIterator<Item = (K, V)>) -> ClaimsIdentity
where
    K: Into<String>,
    V: Into<ClaimValue>,
{
    let mut claims = ClaimsIdentity::new();
    for (key, value) in payload {
        let claim_type: String = key.into();
        for value in value.into().into_values() {
            claims.add_claim(Claim::new(claim_type.clone(), value));
        }
    }
    claims
}

/// Token payload: the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JwtPayload {
    claims: ClaimsIdentity,
}

impl JwtPayload {
    pub fn new(claims: ClaimsIdentity) -> Self {
        Self { claims }
    }

    pub fn claims(&self) -> &ClaimsIdentity {
        &self.claims
    }

    /// JSON object form: claim types become keys, repeated types become arrays.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut object = Map::new();
        for claim in self.claims.claims() {
            let value = wire_value(claim);
            match object.get_mut(claim.claim_type()) {
                None => {
                    object.insert(claim.claim_type().to_string(), value);
                }
                Some(Value::Array(values)) => values.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            }
        }
        object
    }

    /// Rebuild claims from a payload JSON object (arrays expand to repeated claims).
    pub(crate) fn from_json(bytes: &[u8]) -> TokenResult<Self> {
        let object: Map<String, Value> = serde_json::from_slice(bytes)
            .map_err(|e| TokenError::malformed(format!("payload: {e}")))?;

        let mut claims = ClaimsIdentity::new();
        for (claim_type, value) in object {
            match value {
                Value::Array(items) => {
                    for item in items {
                        if let Some(text) = scalar_text(&claim_type, item)? {
                            claims.add_claim(Claim::new(claim_type.clone(), text));
                        }
                    }
                }
                other => {
                    if let Some(text) = scalar_text(&claim_type, other)? {
                        claims.add_claim(Claim::new(claim_type.clone(), text));
                    }
                }
            }
        }

        Ok(Self { claims })
    }
}

fn wire_value(claim: &Claim) -> Value {
    if NUMERIC_CLAIMS.contains(&claim.claim_type()) {
        // Only canonical integers become numbers, so "007" or "+5" survive the trip.
        if let Ok(n) = claim.value().parse::<i64>() {
            if n.to_string() == claim.value() {
                return Value::from(n);
            }
        }
    }
    Value::String(claim.value().to_string())
}

/// A numeric date claim value as seconds since the epoch, fractions allowed.
pub(crate) fn numeric_date(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn scalar_text(claim_type: &str, value: Value) -> TokenResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(_) | Value::Object(_) => Err(TokenError::malformed(format!(
            "claim '{claim_type}' has a nested value"
        ))),
    }
}

/// A structured, immutable token.
///
/// Constructed from claims and an algorithm; turned into its signed wire form
/// only on demand by [`crate::JwtSecurityTokenHandler::write_token`].
/// Re-signing means building a new token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwtSecurityToken {
    header: JwtHeader,
    payload: JwtPayload,
}

impl JwtSecurityToken {
    pub fn new(claims: ClaimsIdentity, algorithm: SecurityAlgorithm) -> Self {
        Self {
            header: JwtHeader::new(algorithm),
            payload: JwtPayload::new(claims),
        }
    }

    pub(crate) fn from_parts(header: JwtHeader, payload: JwtPayload) -> Self {
        Self { header, payload }
    }

    pub fn header(&self) -> &JwtHeader {
        &self.header
    }

    pub fn payload(&self) -> &JwtPayload {
        &self.payload
    }

    pub fn algorithm(&self) -> SecurityAlgorithm {
        self.header.algorithm()
    }

    pub fn claims(&self) -> &ClaimsIdentity {
        self.payload.claims()
    }

    /// Expiry from the `exp` claim, if present and a numeric date.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let exp = numeric_date(self.registered(claim_types::EXPIRATION)?)?;
        let secs = exp.floor();
        let nanos = ((exp - secs) * 1e9) as u32;
        DateTime::from_timestamp(secs as i64, nanos)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.registered(claim_types::ISSUER)
    }

    /// All `aud` values (an audience may be a list).
    pub fn audience(&self) -> Vec<&str> {
        self.claims()
            .find_claims(|c| c.claim_type() == claim_types::AUDIENCE)
            .into_iter()
            .map(Claim::value)
            .collect()
    }

    pub fn subject(&self) -> Option<&str> {
        self.registered(claim_types::SUBJECT)
    }

    /// The claims as an identity authenticated by this token.
    ///
    /// Only meaningful for a token returned by `validate_token`.
    pub fn into_identity(self) -> ClaimsIdentity {
        ClaimsIdentity::authenticated(JWT_AUTHENTICATION_TYPE)
            .with_claims(self.payload.claims.claims().iter().cloned())
    }

    /// `base64url(header) "." base64url(payload)`: the signing input.
    pub fn encode_unsigned(&self) -> TokenResult<String> {
        let header = serde_json::to_vec(&self.header)?;
        let payload = serde_json::to_vec(&self.payload.to_json())?;
        Ok(format!("{}.{}", base64url::encode(header), base64url::encode(payload)))
    }

    /// Registered claims match their type exactly.
    pub(crate) fn registered(&self, claim_type: &str) -> Option<&str> {
        self.claims()
            .find_claim(|c| c.claim_type() == claim_type)
            .map(Claim::value)
    }

    /// Like [`registered`](Self::registered), but a repeated claim is malformed.
    pub(crate) fn single_registered(&self, claim_type: &str) -> TokenResult<Option<&str>> {
        let claims = self.claims().find_claims(|c| c.claim_type() == claim_type);
        match claims.as_slice() {
            [] => Ok(None),
            &[claim] => Ok(Some(claim.value())),
            _ => Err(TokenError::malformed(format!("'{claim_type}' must hold a single value"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_serializes_alg_then_typ() {
        let json = serde_json::to_string(&JwtHeader::new(SecurityAlgorithm::Hs256)).unwrap();
        assert_eq!(json, r#"{"alg":"HS256","typ":"JWT"}"#);
    }

    #[test]
    fn header_rejects_unknown_algorithm_as_unsupported() {
        let err = JwtHeader::from_json(br#"{"alg":"none","typ":"JWT"}"#).unwrap_err();
        assert!(matches!(err, TokenError::UnsupportedAlgorithm(a) if a == "none"));
    }

    #[test]
    fn header_requires_alg_and_jwt_type() {
        assert!(matches!(
            JwtHeader::from_json(br#"{"typ":"JWT"}"#),
            Err(TokenError::MalformedToken(_))
        ));
        assert!(matches!(
            JwtHeader::from_json(br#"{"alg":"HS256","typ":"JWE"}"#),
            Err(TokenError::MalformedToken(_))
        ));
        assert!(JwtHeader::from_json(br#"{"alg":"HS256"}"#).is_ok());
    }

    #[test]
    fn expand_repeats_claim_type_per_sequence_element() {
        let claims = expand_claims([
            ("sub", ClaimValue::from("u1")),
            ("role", ClaimValue::from(["admin", "editor"])),
        ]);

        let pairs: Vec<(&str, &str)> = claims
            .claims()
            .iter()
            .map(|c| (c.claim_type(), c.value()))
            .collect();
        assert_eq!(pairs, vec![("sub", "u1"), ("role", "admin"), ("role", "editor")]);
    }

    #[test]
    fn payload_json_groups_repeated_types_and_numbers_registered_times() {
        let payload = JwtPayload::new(expand_claims([
            ("sub", ClaimValue::from("u1")),
            ("role", ClaimValue::from(["admin", "editor"])),
            ("exp", ClaimValue::from("1700000000")),
        ]));

        assert_eq!(
            Value::Object(payload.to_json()),
            serde_json::json!({
                "sub": "u1",
                "role": ["admin", "editor"],
                "exp": 1700000000
            })
        );
    }

    #[test]
    fn payload_from_json_stringifies_scalars_and_skips_nulls() {
        let payload =
            JwtPayload::from_json(br#"{"exp":1700000000,"admin":true,"nick":null,"aud":["a","b"]}"#).unwrap();

        let pairs: Vec<String> = payload.claims().claims().iter().map(|c| c.to_string()).collect();
        assert_eq!(pairs, vec!["exp=1700000000", "admin=true", "aud=a", "aud=b"]);
    }

    #[test]
    fn payload_rejects_nested_objects_and_non_objects() {
        assert!(matches!(
            JwtPayload::from_json(br#"{"address":{"city":"x"}}"#),
            Err(TokenError::MalformedToken(_))
        ));
        assert!(matches!(
            JwtPayload::from_json(br#"["sub"]"#),
            Err(TokenError::MalformedToken(_))
        ));
    }

    #[test]
    fn accessors_read_registered_claims() {
        let token = JwtSecurityToken::new(
            expand_claims([
                ("iss", ClaimValue::from("svc-a")),
                ("sub", ClaimValue::from("u1")),
                ("aud", ClaimValue::from(["api", "web"])),
                ("exp", ClaimValue::from("1700000000")),
            ]),
            SecurityAlgorithm::Hs256,
        );

        assert_eq!(token.issuer(), Some("svc-a"));
        assert_eq!(token.subject(), Some("u1"));
        assert_eq!(token.audience(), vec!["api", "web"]);
        assert_eq!(token.expires_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn into_identity_is_authenticated() {
        let token = JwtSecurityToken::new(
            expand_claims([("role", ClaimValue::from("admin"))]),
            SecurityAlgorithm::Hs384,
        );
        let identity = token.into_identity();
        assert!(identity.is_authenticated());
        assert_eq!(identity.authentication_type(), Some(JWT_AUTHENTICATION_TYPE));
        assert!(identity.has_claim("role", "admin"));
    }

    #[test]
    fn only_canonical_integers_become_json_numbers() {
        let payload = JwtPayload::new(expand_claims([
            ("iat", ClaimValue::from("007")),
            ("nbf", ClaimValue::from("+5")),
            ("exp", ClaimValue::from("-0")),
        ]));
        let json = payload.to_json();
        assert_eq!(json["iat"], Value::from("007"));
        assert_eq!(json["nbf"], Value::from("+5"));
        assert_eq!(json["exp"], Value::from("-0"));

        let bytes = serde_json::to_vec(&json).unwrap();
        let read = JwtPayload::from_json(&bytes).unwrap();
        assert_eq!(read, payload);
    }

    #[test]
    fn expires_at_accepts_fractional_dates() {
        let token = JwtSecurityToken::new(
            expand_claims([("exp", ClaimValue::from("1.7e9"))]),
            SecurityAlgorithm::Hs256,
        );
        assert_eq!(token.expires_at().unwrap().timestamp(), 1_700_000_000);

        let token = JwtSecurityToken::new(
            expand_claims([("exp", ClaimValue::from("1700000000.5"))]),
            SecurityAlgorithm::Hs256,
        );
        assert_eq!(token.expires_at().unwrap().timestamp_subsec_millis(), 500);
    }

    #[test]
    fn repeated_registered_claim_is_malformed() {
        let token = JwtSecurityToken::new(
            expand_claims([("exp", ClaimValue::from(["9999999999", "1"]))]),
            SecurityAlgorithm::Hs256,
        );
        assert!(matches!(
            token.single_registered(claim_types::EXPIRATION),
            Err(TokenError::MalformedToken(_))
        ));
        assert_eq!(token.single_registered(claim_types::ISSUER).unwrap(), None);
    }
}
