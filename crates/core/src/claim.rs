//! Claims: typed key/value facts about a principal.

use serde::{Deserialize, Serialize};

/// Well-known claim types.
pub mod claim_types {
    /// Canonical role claim type.
    pub const ROLE: &str = "role";
    pub const NAME: &str = "name";
    pub const SUBJECT: &str = "sub";
    pub const ISSUER: &str = "iss";
    pub const AUDIENCE: &str = "aud";
    /// Expiration time, unix seconds.
    pub const EXPIRATION: &str = "exp";
    pub const ISSUED_AT: &str = "iat";
    pub const NOT_BEFORE: &str = "nbf";
}

/// A single claim.
///
/// Claims are immutable once constructed. There is no identity-based
/// equality at the authorization layer: callers match claims with
/// predicates over type/value (see [`crate::ClaimsIdentity::find_claims`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "type")]
    claim_type: String,
    value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }

    pub fn claim_type(&self) -> &str {
        &self.claim_type
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// ASCII case-insensitive claim type comparison.
    pub fn is_type(&self, claim_type: &str) -> bool {
        self.claim_type.eq_ignore_ascii_case(claim_type)
    }
}

impl core::fmt::Display for Claim {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}={}", self.claim_type, self.value)
    }
}
