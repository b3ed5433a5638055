//! Requirement/handler capability pair.

use async_trait::async_trait;

use crate::context::AuthorizationContext;

/// A declarative fact a policy demands of a principal.
///
/// Every requirement exposes the handler that checks it. The built-in
/// requirements are their own handlers; external requirements may return any
/// handler object.
pub trait AuthorizationRequirement: Send + Sync + core::fmt::Debug {
    fn handler(&self) -> &dyn AuthorizationHandler;

    /// Short human-readable description, used in logs and denial reports.
    fn describe(&self) -> String {
        format!("{self:?}")
    }
}

/// Code that checks a requirement against an evaluation context.
///
/// The only externally observable effect of a handler is calling
/// [`AuthorizationContext::succeed`] with the requirement zero or one time.
/// Not finding a match is **not** an error: return `Ok(())` and leave the
/// requirement pending. `Err` is reserved for faults (e.g. a claim store that
/// could not be reached) and aborts the whole evaluation.
#[async_trait]
pub trait AuthorizationHandler: Send + Sync {
    async fn handle(
        &self,
        context: &AuthorizationContext,
        requirement: &dyn AuthorizationRequirement,
    ) -> anyhow::Result<()>;
}
