//! Authorization policies and the builder that assembles them.

use std::collections::HashMap;
use std::sync::Arc;

use crate::authentication::AuthenticationRequirement;
use crate::claims::ClaimsRequirement;
use crate::requirement::AuthorizationRequirement;
use crate::roles::{Role, RolesRequirement};

/// A named, immutable, ordered set of requirements, all of which must succeed.
#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    name: String,
    requirements: Vec<Arc<dyn AuthorizationRequirement>>,
}

impl AuthorizationPolicy {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requirements(&self) -> &[Arc<dyn AuthorizationRequirement>] {
        &self.requirements
    }
}

/// Accumulates requirements and freezes them into an [`AuthorizationPolicy`].
///
/// Every builder starts with an [`AuthenticationRequirement`] that cannot be
/// removed through this API. `build()` takes a snapshot: the builder stays
/// usable and later additions only show up in later builds.
#[derive(Debug, Clone)]
pub struct AuthorizationPolicyBuilder {
    name: String,
    requirements: Vec<Arc<dyn AuthorizationRequirement>>,
}

impl AuthorizationPolicyBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirements: vec![Arc::new(AuthenticationRequirement)],
        }
    }

    /// Append any requirement, including externally defined ones.
    pub fn add_requirement<R>(&mut self, requirement: R) -> &mut Self
    where
        R: AuthorizationRequirement + 'static,
    {
        self.requirements.push(Arc::new(requirement));
        self
    }

    /// Append an already shared requirement.
    pub fn add_shared_requirement(&mut self, requirement: Arc<dyn AuthorizationRequirement>) -> &mut Self {
        self.requirements.push(requirement);
        self
    }

    /// Require a claim type; with no allowed values, presence is enough.
    pub fn require_claim<V>(
        &mut self,
        claim_type: impl Into<String>,
        allowed_values: impl IntoIterator<Item = V>,
    ) -> &mut Self
    where
        V: Into<String>,
    {
        self.add_requirement(ClaimsRequirement::new(claim_type, allowed_values))
    }

    pub fn require_role<R>(&mut self, roles: impl IntoIterator<Item = R>) -> &mut Self
    where
        R: Into<Role>,
    {
        self.add_requirement(RolesRequirement::new(roles))
    }

    pub fn build(&self) -> AuthorizationPolicy {
        AuthorizationPolicy {
            name: self.name.clone(),
            requirements: self.requirements.clone(),
        }
    }
}

/// Registry of named policies.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationOptions {
    policies: HashMap<String, AuthorizationPolicy>,
}

impl AuthorizationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and register a policy under `name`, replacing any previous one.
    pub fn add_policy<F>(&mut self, name: impl Into<String>, configure: F) -> &mut Self
    where
        F: FnOnce(&mut AuthorizationPolicyBuilder),
    {
        let mut builder = AuthorizationPolicyBuilder::new(name);
        configure(&mut builder);
        self.insert_policy(builder.build())
    }

    pub fn insert_policy(&mut self, policy: AuthorizationPolicy) -> &mut Self {
        self.policies.insert(policy.name.clone(), policy);
        self
    }

    pub fn policy(&self, name: &str) -> Option<&AuthorizationPolicy> {
        self.policies.get(name)
    }

    pub fn policy_names(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }
}
