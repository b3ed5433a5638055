use std::borrow::Cow;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use warden_core::{ClaimsPrincipal, claim_types};

use crate::claims::ClaimsRequirement;
use crate::context::AuthorizationContext;
use crate::requirement::{AuthorizationHandler, AuthorizationRequirement};

/// Role name used for role-based requirements.
///
/// Roles are opaque strings at this layer; they are matched against the
/// values of `role` claims.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Role {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// Requires membership in at least one of the given roles.
///
/// A claims requirement over the canonical `role` claim type. An empty role
/// set never succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolesRequirement {
    roles: Vec<Role>,
    claims: ClaimsRequirement,
}

impl RolesRequirement {
    pub fn new<R>(roles: impl IntoIterator<Item = R>) -> Self
    where
        R: Into<Role>,
    {
        let roles: Vec<Role> = roles.into_iter().map(Into::into).collect();
        let claims = ClaimsRequirement::new(
            claim_types::ROLE,
            roles.iter().map(|r| r.as_str().to_string()),
        );
        Self { roles, claims }
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn is_satisfied_by(&self, user: &dyn ClaimsPrincipal) -> bool {
        !self.roles.is_empty() && self.claims.is_satisfied_by(user)
    }
}

impl AuthorizationRequirement for RolesRequirement {
    fn handler(&self) -> &dyn AuthorizationHandler {
        self
    }

    fn describe(&self) -> String {
        let roles: Vec<&str> = self.roles.iter().map(Role::as_str).collect();
        format!("any role of {roles:?}")
    }
}

#[async_trait]
impl AuthorizationHandler for RolesRequirement {
    async fn handle(
        &self,
        context: &AuthorizationContext,
        requirement: &dyn AuthorizationRequirement,
    ) -> anyhow::Result<()> {
        if let Some(user) = context.user() {
            if self.is_satisfied_by(user) {
                context.succeed(requirement);
            }
        }
        Ok(())
    }
}
