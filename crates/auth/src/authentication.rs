use async_trait::async_trait;
use tracing::debug;

use crate::context::AuthorizationContext;
use crate::requirement::{AuthorizationHandler, AuthorizationRequirement};

/// Requires an authenticated principal.
///
/// Seeded as the first requirement of every policy built by
/// [`crate::AuthorizationPolicyBuilder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthenticationRequirement;

impl AuthorizationRequirement for AuthenticationRequirement {
    fn handler(&self) -> &dyn AuthorizationHandler {
        self
    }

    fn describe(&self) -> String {
        "authenticated principal".to_string()
    }
}

#[async_trait]
impl AuthorizationHandler for AuthenticationRequirement {
    async fn handle(
        &self,
        context: &AuthorizationContext,
        requirement: &dyn AuthorizationRequirement,
    ) -> anyhow::Result<()> {
        match context.user() {
            Some(user) if user.is_authenticated() => context.succeed(requirement),
            Some(_) => debug!("principal present but not authenticated"),
            None => debug!("no principal in context"),
        }
        Ok(())
    }
}
