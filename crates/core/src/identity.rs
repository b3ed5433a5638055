//! Claims identity: an ordered collection of claims.

use serde::{Deserialize, Serialize};

use crate::claim::{Claim, claim_types};

/// An ordered collection of claims describing one identity.
///
/// Insertion order is preserved but carries no meaning. Duplicates are legal:
/// a principal with two roles carries two `role` claims.
///
/// An identity is authenticated iff it carries an authentication type
/// (e.g. `"jwt"`); [`ClaimsIdentity::new`] creates an anonymous identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsIdentity {
    authentication_type: Option<String>,
    claims: Vec<Claim>,
}

impl ClaimsIdentity {
    /// Create an anonymous (unauthenticated) identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an identity authenticated by the given mechanism.
    pub fn authenticated(authentication_type: impl Into<String>) -> Self {
        Self {
            authentication_type: Some(authentication_type.into()),
            claims: Vec::new(),
        }
    }

    pub fn with_claims(mut self, claims: impl IntoIterator<Item = Claim>) -> Self {
        self.claims.extend(claims);
        self
    }

    pub fn authentication_type(&self) -> Option<&str> {
        self.authentication_type.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authentication_type.is_some()
    }

    pub fn add_claim(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// First claim matching the predicate, in insertion order.
    pub fn find_claim<P>(&self, predicate: P) -> Option<&Claim>
    where
        P: Fn(&Claim) -> bool,
    {
        self.claims.iter().find(|&c| predicate(c))
    }

    /// All claims matching the predicate (possibly empty).
    pub fn find_claims<P>(&self, predicate: P) -> Vec<&Claim>
    where
        P: Fn(&Claim) -> bool,
    {
        self.claims.iter().filter(|&c| predicate(c)).collect()
    }

    /// Value of the first claim with the given type (case-insensitive).
    pub fn find_claim_value(&self, claim_type: &str) -> Option<&str> {
        self.find_claim(|c| c.is_type(claim_type)).map(Claim::value)
    }

    /// Whether a claim with this type (case-insensitive) and exact value exists.
    pub fn has_claim(&self, claim_type: &str, value: &str) -> bool {
        self.claims
            .iter()
            .any(|c| c.is_type(claim_type) && c.value() == value)
    }

    /// Values of all `role` claims.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.claims
            .iter()
            .filter(|c| c.is_type(claim_types::ROLE))
            .map(Claim::value)
    }

    /// Remove every claim of the given type (case-insensitive).
    pub fn remove_claims(&mut self, claim_type: &str) {
        self.claims.retain(|c| !c.is_type(claim_type));
    }

    /// Keep only the claims matching the predicate, preserving order.
    pub fn retain_claims<P>(&mut self, predicate: P)
    where
        P: Fn(&Claim) -> bool,
    {
        self.claims.retain(|c| predicate(c));
    }
}

impl FromIterator<Claim> for ClaimsIdentity {
    fn from_iter<I: IntoIterator<Item = Claim>>(iter: I) -> Self {
        Self::new().with_claims(iter)
    }
}

impl<'a> IntoIterator for &'a ClaimsIdentity {
    type Item = &'a Claim;
    type IntoIter = core::slice::Iter<'a, Claim>;

    fn into_iter(self) -> Self::IntoIter {
        self.claims.iter()
    }
}
