//! Policy evaluation: run every handler, then reduce to a decision.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use warden_core::ClaimsPrincipal;

use crate::context::AuthorizationContext;
use crate::policy::{AuthorizationOptions, AuthorizationPolicy};
use crate::requirement::AuthorizationRequirement;

/// Outcome of a completed evaluation.
#[derive(Debug, Clone)]
pub enum AuthorizationDecision {
    Allow,
    Deny {
        /// Requirements whose handlers did not succeed them.
        unsatisfied: Vec<Arc<dyn AuthorizationRequirement>>,
    },
}

impl AuthorizationDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn unsatisfied(&self) -> &[Arc<dyn AuthorizationRequirement>] {
        match self {
            Self::Allow => &[],
            Self::Deny { unsatisfied } => unsatisfied,
        }
    }
}

/// An evaluation that did not reach a decision.
///
/// Callers must treat every variant as "not authorized", and report it
/// distinctly from [`AuthorizationDecision::Deny`].
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("evaluation aborted: handler for {requirement} faulted")]
    HandlerFault {
        requirement: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("evaluation aborted: cancelled")]
    Cancelled,

    #[error("evaluation aborted: timed out after {0:?}")]
    TimedOut(Duration),

    #[error("unknown authorization policy '{0}'")]
    UnknownPolicy(String),
}

/// Evaluator configuration.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Upper bound for running all handlers of one evaluation.
    pub timeout: Option<Duration>,
    /// Run handlers concurrently rather than one after another.
    pub concurrent: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            concurrent: true,
        }
    }
}

impl EvaluatorConfig {
    pub const TIMEOUT_ENV: &'static str = "WARDEN_AUTHZ_TIMEOUT_MS";
    pub const CONCURRENT_ENV: &'static str = "WARDEN_AUTHZ_CONCURRENT";

    /// Defaults overridden by `WARDEN_AUTHZ_TIMEOUT_MS` / `WARDEN_AUTHZ_CONCURRENT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(Self::TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.timeout = Some(Duration::from_millis(ms)),
                Err(_) => warn!(value = %raw, "ignoring unparsable {}", Self::TIMEOUT_ENV),
            }
        }

        if let Ok(raw) = std::env::var(Self::CONCURRENT_ENV) {
            match raw.trim().parse::<bool>() {
                Ok(concurrent) => config.concurrent = concurrent,
                Err(_) => warn!(value = %raw, "ignoring unparsable {}", Self::CONCURRENT_ENV),
            }
        }

        config
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn sequential(mut self) -> Self {
        self.concurrent = false;
        self
    }
}

/// Runs a policy's handlers against a principal and reduces to a decision.
///
/// - All handlers run to completion; there is no short-circuit on the first
///   unmet requirement.
/// - The decision is `Allow` iff every requirement succeeded (logical AND).
/// - A faulting handler aborts the evaluation with an error, never a `Deny`.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationEvaluator {
    config: EvaluatorConfig,
}

impl AuthorizationEvaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub async fn authorize(
        &self,
        policy: &AuthorizationPolicy,
        user: Option<Arc<dyn ClaimsPrincipal>>,
    ) -> Result<AuthorizationDecision, EvaluationError> {
        self.authorize_with_cancellation(policy, user, &CancellationToken::new())
            .await
    }

    pub async fn authorize_with_cancellation(
        &self,
        policy: &AuthorizationPolicy,
        user: Option<Arc<dyn ClaimsPrincipal>>,
        cancel: &CancellationToken,
    ) -> Result<AuthorizationDecision, EvaluationError> {
        let context = AuthorizationContext::new(user, policy.requirements().iter().cloned());
        let decision = self.evaluate(&context, cancel).await;

        match &decision {
            Ok(d) => info!(
                policy = policy.name(),
                allowed = d.is_allowed(),
                unsatisfied = d.unsatisfied().len(),
                "authorization decided"
            ),
            Err(e) => warn!(policy = policy.name(), error = %e, "authorization aborted"),
        }

        decision
    }

    /// Evaluate a registered policy by name.
    pub async fn authorize_named(
        &self,
        options: &AuthorizationOptions,
        policy_name: &str,
        user: Option<Arc<dyn ClaimsPrincipal>>,
    ) -> Result<AuthorizationDecision, EvaluationError> {
        let policy = options
            .policy(policy_name)
            .ok_or_else(|| EvaluationError::UnknownPolicy(policy_name.to_string()))?;
        self.authorize(policy, user).await
    }

    /// Run every handler for the context's requirements, then decide.
    pub async fn evaluate(
        &self,
        context: &AuthorizationContext,
        cancel: &CancellationToken,
    ) -> Result<AuthorizationDecision, EvaluationError> {
        let bounded = async {
            match self.config.timeout {
                Some(limit) => match tokio::time::timeout(limit, self.run_handlers(context)).await {
                    Ok(result) => result,
                    Err(_) => Err(EvaluationError::TimedOut(limit)),
                },
                None => self.run_handlers(context).await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EvaluationError::Cancelled),
            result = bounded => result?,
        }

        if context.all_succeeded() {
            Ok(AuthorizationDecision::Allow)
        } else {
            Ok(AuthorizationDecision::Deny {
                unsatisfied: context.pending(),
            })
        }
    }

    async fn run_handlers(&self, context: &AuthorizationContext) -> Result<(), EvaluationError> {
        let requirements = context.requirements();

        if self.config.concurrent {
            futures::future::try_join_all(
                requirements
                    .iter()
                    .map(|requirement| invoke(context, requirement.as_ref())),
            )
            .await?;
        } else {
            for requirement in requirements {
                invoke(context, requirement.as_ref()).await?;
            }
        }

        Ok(())
    }
}

async fn invoke(
    context: &AuthorizationContext,
    requirement: &dyn AuthorizationRequirement,
) -> Result<(), EvaluationError> {
    requirement
        .handler()
        .handle(context, requirement)
        .await
        .map_err(|source| EvaluationError::HandlerFault {
            requirement: requirement.describe(),
            source,
        })?;

    debug!(
        requirement = %requirement.describe(),
        succeeded = context.has_succeeded(requirement),
        "requirement handled"
    );
    Ok(())
}
