//! Supported signing algorithms and MAC computation.

use core::str::FromStr;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha384, Sha512};

use crate::error::{TokenError, TokenResult};

/// The closed set of token signing algorithms (HMAC family).
///
/// Anything else, `none` included, is rejected when parsed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityAlgorithm {
    #[serde(rename = "HS256")]
    Hs256,
    #[serde(rename = "HS384")]
    Hs384,
    #[serde(rename = "HS512")]
    Hs512,
}

macro_rules! hmac_digest {
    ($digest:ty, $key:expr, $message:expr) => {{
        let mut mac = Hmac::<$digest>::new_from_slice($key).map_err(|_| TokenError::InvalidKey)?;
        mac.update($message);
        Ok(mac.finalize().into_bytes().to_vec())
    }};
}

impl SecurityAlgorithm {
    pub const ALL: [SecurityAlgorithm; 3] = [Self::Hs256, Self::Hs384, Self::Hs512];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hs256 => "HS256",
            Self::Hs384 => "HS384",
            Self::Hs512 => "HS512",
        }
    }

    /// Compute the raw MAC of `message` under `key`.
    pub fn sign(&self, key: &[u8], message: &[u8]) -> TokenResult<Vec<u8>> {
        match self {
            Self::Hs256 => hmac_digest!(Sha256, key, message),
            Self::Hs384 => hmac_digest!(Sha384, key, message),
            Self::Hs512 => hmac_digest!(Sha512, key, message),
        }
    }
}

impl core::fmt::Display for SecurityAlgorithm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurityAlgorithm {
    type Err = TokenError;

    /// Exact, case-sensitive match on the registered names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(Self::Hs256),
            "HS384" => Ok(Self::Hs384),
            "HS512" => Ok(Self::Hs512),
            other => Err(TokenError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_registered_names() {
        for alg in SecurityAlgorithm::ALL {
            assert_eq!(alg.as_str().parse::<SecurityAlgorithm>().unwrap(), alg);
        }

        for bad in ["none", "hs256", "RS256", ""] {
            let err = bad.parse::<SecurityAlgorithm>().unwrap_err();
            assert!(matches!(err, TokenError::UnsupportedAlgorithm(ref a) if a == bad));
        }
    }

    #[test]
    fn mac_lengths_follow_digest_size() {
        let lengths: Vec<usize> = SecurityAlgorithm::ALL
            .iter()
            .map(|alg| alg.sign(b"k", b"msg").unwrap().len())
            .collect();
        assert_eq!(lengths, vec![32, 48, 64]);
    }

    #[test]
    fn hs256_matches_rfc4231_case_2() {
        let mac = SecurityAlgorithm::Hs256
            .sign(b"Jefe", b"what do ya want for nothing?")
            .unwrap();
        let hex: String = mac.iter().map(|b| format!("{b:02x}")).collect();
        assert_eq!(
            hex,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn hs384_uses_sha384() {
        let mac = SecurityAlgorithm::Hs384
            .sign(b"Jefe", b"what do ya want for nothing?")
            .unwrap();
        let hex: String = mac.iter().map(|b| format!("{b:02x}")).collect();
        assert_eq!(
            hex,
            "af45d2e376484031617f78d2b58a6b1b9c7ef464f5a01b47e42ec3736322445e8e2240ca5e69e2c78b3239ecfab21649"
        );
    }

    #[test]
    fn serializes_as_registered_name() {
        let json = serde_json::to_string(&SecurityAlgorithm::Hs512).unwrap();
        assert_eq!(json, "\"HS512\"");
    }
}
