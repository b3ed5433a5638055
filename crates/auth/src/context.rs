//! Per-evaluation authorization state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;
use warden_core::ClaimsPrincipal;

use crate::requirement::AuthorizationRequirement;

/// State of a single authorization evaluation.
///
/// Holds the principal under evaluation, the requirements being checked and
/// which of them have succeeded. Success flags are append-only: a requirement
/// can be marked succeeded, never un-marked, and marking is safe from
/// concurrently running handlers.
///
/// Invariant: the succeeded set is always a subset of the requirements.
pub struct AuthorizationContext {
    user: Option<Arc<dyn ClaimsPrincipal>>,
    requirements: Vec<Arc<dyn AuthorizationRequirement>>,
    succeeded: Vec<AtomicBool>,
}

impl AuthorizationContext {
    pub fn new(
        user: Option<Arc<dyn ClaimsPrincipal>>,
        requirements: impl IntoIterator<Item = Arc<dyn AuthorizationRequirement>>,
    ) -> Self {
        let requirements: Vec<_> = requirements.into_iter().collect();
        let succeeded = requirements.iter().map(|_| AtomicBool::new(false)).collect();
        Self {
            user,
            requirements,
            succeeded,
        }
    }

    pub fn user(&self) -> Option<&dyn ClaimsPrincipal> {
        self.user.as_deref()
    }

    pub fn requirements(&self) -> &[Arc<dyn AuthorizationRequirement>] {
        &self.requirements
    }

    /// Mark a requirement as succeeded.
    ///
    /// Requirements are matched by identity (the same allocation that was
    /// registered in this context). A requirement that is not part of the
    /// context is ignored.
    pub fn succeed(&self, requirement: &dyn AuthorizationRequirement) {
        let mut matched = false;
        for (registered, flag) in self.requirements.iter().zip(&self.succeeded) {
            if is_same(registered, requirement) {
                flag.store(true, Ordering::Release);
                matched = true;
            }
        }

        if !matched {
            warn!(
                requirement = %requirement.describe(),
                "ignoring success for a requirement outside this context"
            );
        }
    }

    pub fn has_succeeded(&self, requirement: &dyn AuthorizationRequirement) -> bool {
        self.requirements
            .iter()
            .zip(&self.succeeded)
            .any(|(registered, flag)| is_same(registered, requirement) && flag.load(Ordering::Acquire))
    }

    /// Requirements that have succeeded so far.
    pub fn succeeded(&self) -> Vec<Arc<dyn AuthorizationRequirement>> {
        self.partition(true)
    }

    /// Requirements that have not (yet) succeeded.
    pub fn pending(&self) -> Vec<Arc<dyn AuthorizationRequirement>> {
        self.partition(false)
    }

    /// True iff there is at least one requirement and every one has succeeded.
    pub fn all_succeeded(&self) -> bool {
        !self.requirements.is_empty() && self.succeeded.iter().all(|f| f.load(Ordering::Acquire))
    }

    fn partition(&self, state: bool) -> Vec<Arc<dyn AuthorizationRequirement>> {
        self.requirements
            .iter()
            .zip(&self.succeeded)
            .filter(|(_, flag)| flag.load(Ordering::Acquire) == state)
            .map(|(requirement, _)| Arc::clone(requirement))
            .collect()
    }
}

impl core::fmt::Debug for AuthorizationContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthorizationContext")
            .field("has_user", &self.user.is_some())
            .field("requirements", &self.requirements.len())
            .field("succeeded", &self.succeeded().len())
            .finish()
    }
}

fn is_same(registered: &Arc<dyn AuthorizationRequirement>, candidate: &dyn AuthorizationRequirement) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(registered), candidate)
}
