//! `warden-auth`: claims-based authorization evaluation (policy → decision).
//!
//! This crate is intentionally decoupled from HTTP, storage and token formats:
//! it only reads claims through [`warden_core::ClaimsPrincipal`].

pub mod authentication;
pub mod authorize;
pub mod claims;
pub mod context;
pub mod policy;
pub mod requirement;
pub mod roles;

pub use authentication::AuthenticationRequirement;
pub use authorize::{AuthorizationDecision, AuthorizationEvaluator, EvaluationError, EvaluatorConfig};
pub use claims::ClaimsRequirement;
pub use context::AuthorizationContext;
pub use policy::{AuthorizationOptions, AuthorizationPolicy, AuthorizationPolicyBuilder};
pub use requirement::{AuthorizationHandler, AuthorizationRequirement};
pub use roles::{Role, RolesRequirement};
