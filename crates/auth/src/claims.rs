use async_trait::async_trait;
use tracing::debug;
use warden_core::{Claim, ClaimsPrincipal};

use crate::context::AuthorizationContext;
use crate::requirement::{AuthorizationHandler, AuthorizationRequirement};

/// Requires a claim of a given type, optionally restricted to a set of values.
///
/// - The claim type is matched **case-insensitively** (ASCII).
/// - Allowed values are matched **case-sensitively** (exact equality).
/// - An empty allowed-value set means "the claim being present is enough".
///
/// The asymmetry between type and value matching is deliberate; changing it
/// would change existing authorization outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsRequirement {
    claim_type: String,
    allowed_values: Vec<String>,
}

impl ClaimsRequirement {
    pub fn new<V>(claim_type: impl Into<String>, allowed_values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<String>,
    {
        Self {
            claim_type: claim_type.into(),
            allowed_values: allowed_values.into_iter().map(Into::into).collect(),
        }
    }

    /// Require the claim type to be present, with any value.
    pub fn any_value(claim_type: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            allowed_values: Vec::new(),
        }
    }

    pub fn claim_type(&self) -> &str {
        &self.claim_type
    }

    pub fn allowed_values(&self) -> &[String] {
        &self.allowed_values
    }

    /// Whether the principal carries a matching claim.
    pub fn is_satisfied_by(&self, user: &dyn ClaimsPrincipal) -> bool {
        user.has_any(&|claim: &Claim| self.matches(claim))
    }

    fn matches(&self, claim: &Claim) -> bool {
        claim.is_type(&self.claim_type)
            && (self.allowed_values.is_empty()
                || self.allowed_values.iter().any(|allowed| allowed == claim.value()))
    }
}

impl AuthorizationRequirement for ClaimsRequirement {
    fn handler(&self) -> &dyn AuthorizationHandler {
        self
    }

    fn describe(&self) -> String {
        if self.allowed_values.is_empty() {
            format!("claim '{}'", self.claim_type)
        } else {
            format!("claim '{}' in {:?}", self.claim_type, self.allowed_values)
        }
    }
}

#[async_trait]
impl AuthorizationHandler for ClaimsRequirement {
    async fn handle(
        &self,
        context: &AuthorizationContext,
        requirement: &dyn AuthorizationRequirement,
    ) -> anyhow::Result<()> {
        let Some(user) = context.user() else {
            return Ok(());
        };

        if self.is_satisfied_by(user) {
            context.succeed(requirement);
        } else {
            debug!(claim_type = %self.claim_type, "no matching claim");
        }
        Ok(())
    }
}
