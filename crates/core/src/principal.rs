//! The principal contract consumed by authorization.

use crate::{Claim, ClaimsIdentity};

/// Source of claims for an authorization decision.
///
/// The authorization layer only *reads* through this trait; it never
/// constructs principals itself. Implement it for whatever identity type the
/// host application materializes (session user, verified token, service account).
pub trait ClaimsPrincipal: Send + Sync {
    /// Whether the principal was authenticated by some mechanism.
    fn is_authenticated(&self) -> bool;

    /// All claims matching the predicate.
    fn find_claims(&self, predicate: &dyn Fn(&Claim) -> bool) -> Vec<&Claim>;

    /// Whether at least one claim matches the predicate.
    fn has_any(&self, predicate: &dyn Fn(&Claim) -> bool) -> bool {
        !self.find_claims(predicate).is_empty()
    }
}

impl ClaimsPrincipal for ClaimsIdentity {
    fn is_authenticated(&self) -> bool {
        ClaimsIdentity::is_authenticated(self)
    }

    fn find_claims(&self, predicate: &dyn Fn(&Claim) -> bool) -> Vec<&Claim> {
        ClaimsIdentity::find_claims(self, predicate)
    }
}
