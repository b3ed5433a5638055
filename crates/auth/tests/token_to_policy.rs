use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use warden_auth::{
    AuthorizationContext, AuthorizationEvaluator, AuthorizationHandler, AuthorizationOptions,
    AuthorizationPolicyBuilder, AuthorizationRequirement, EvaluationError, EvaluatorConfig, RolesRequirement,
};
use warden_core::{Claim, ClaimsIdentity, ClaimsPrincipal};
use warden_tokens::{ClaimValue, JwtSecurityTokenHandler, SecurityAlgorithm, TokenError};

const KEY: &[u8] = b"k";

fn signed(payload: Vec<(&str, ClaimValue)>) -> String {
    let handler = JwtSecurityTokenHandler::default();
    let token = handler.create_token(payload, SecurityAlgorithm::Hs256, None);
    handler.write_token(&token, KEY).unwrap()
}

fn principal_from(wire: &str) -> Arc<dyn ClaimsPrincipal> {
    let verified = JwtSecurityTokenHandler::default()
        .validate_token(wire, KEY, None, None)
        .unwrap();
    Arc::new(verified.into_identity())
}

#[tokio::test]
async fn editor_token_satisfies_editor_role() {
    warden_observability::init();

    let handler = JwtSecurityTokenHandler::default();
    let token = handler.create_token(
        vec![("sub", ClaimValue::from("u1")), ("role", ClaimValue::from(["admin", "editor"]))],
        SecurityAlgorithm::Hs256,
        None,
    );
    assert_eq!(token.claims().roles().count(), 2);

    let wire = handler.write_token(&token, KEY).unwrap();
    let verified = handler.validate_token(&wire, KEY, None, None).unwrap();
    assert!(verified.claims().has_claim("role", "admin"));
    assert!(verified.claims().has_claim("role", "editor"));

    let policy = AuthorizationPolicyBuilder::new("editors")
        .add_requirement(RolesRequirement::new(["editor"]))
        .build();
    let user: Arc<dyn ClaimsPrincipal> = Arc::new(verified.into_identity());

    let decision = AuthorizationEvaluator::default()
        .authorize(&policy, Some(user))
        .await
        .unwrap();
    assert!(decision.is_allowed());
}

#[tokio::test]
async fn read_only_token_is_not_an_authenticated_principal() {
    let wire = signed(vec![("role", ClaimValue::from("admin"))]);

    // Parsed but unverified claims must be wrapped explicitly; they carry no authentication.
    let parsed = JwtSecurityTokenHandler::default().read_token(&wire).unwrap();
    let user: Arc<dyn ClaimsPrincipal> =
        Arc::new(ClaimsIdentity::new().with_claims(parsed.claims().claims().iter().cloned()));

    let policy = AuthorizationPolicyBuilder::new("admins").require_role(["admin"]).build();
    let decision = AuthorizationEvaluator::default()
        .authorize(&policy, Some(user))
        .await
        .unwrap();

    assert!(!decision.is_allowed());
}

#[tokio::test]
async fn expired_token_never_reaches_authorization() {
    let handler = JwtSecurityTokenHandler::default();
    let token = handler.create_token(
        vec![("role", ClaimValue::from("admin"))],
        SecurityAlgorithm::Hs512,
        Some(Utc::now() - Duration::seconds(1)),
    );
    let wire = handler.write_token(&token, KEY).unwrap();

    assert!(matches!(
        handler.validate_token(&wire, KEY, None, None),
        Err(TokenError::TokenExpired)
    ));
}

#[tokio::test]
async fn named_policies_with_claims_and_roles() {
    let mut options = AuthorizationOptions::new();
    options
        .add_policy("newsroom", |p| {
            p.require_claim("department", ["news"]).require_role(["editor", "admin"]);
        })
        .add_policy("staff", |p| {
            p.require_claim("employee_id", Vec::<String>::new());
        });

    let evaluator = AuthorizationEvaluator::new(EvaluatorConfig::default().sequential());
    let user = principal_from(&signed(vec![
        ("Department", ClaimValue::from("news")),
        ("role", ClaimValue::from("editor")),
    ]));

    let newsroom = evaluator
        .authorize_named(&options, "newsroom", Some(Arc::clone(&user)))
        .await
        .unwrap();
    assert!(newsroom.is_allowed());

    let staff = evaluator
        .authorize_named(&options, "staff", Some(user))
        .await
        .unwrap();
    assert!(!staff.is_allowed());
    assert_eq!(staff.unsatisfied()[0].describe(), "claim 'employee_id'");
}

/// A requirement checked by a separate handler that consults a directory.
#[derive(Debug)]
struct TenantRequirement {
    directory: TenantDirectory,
}

impl AuthorizationRequirement for TenantRequirement {
    fn handler(&self) -> &dyn AuthorizationHandler {
        &self.directory
    }

    fn describe(&self) -> String {
        format!("member of tenant '{}'", self.directory.tenant)
    }
}

#[derive(Debug)]
struct TenantDirectory {
    tenant: String,
    members: Vec<String>,
}

#[async_trait]
impl AuthorizationHandler for TenantDirectory {
    async fn handle(
        &self,
        context: &AuthorizationContext,
        requirement: &dyn AuthorizationRequirement,
    ) -> anyhow::Result<()> {
        // Stand-in for a directory lookup that suspends.
        tokio::task::yield_now().await;

        let Some(user) = context.user() else {
            return Ok(());
        };
        let is_member = user
            .find_claims(&|c: &Claim| c.claim_type() == "sub")
            .iter()
            .any(|sub| self.members.iter().any(|m| m == sub.value()));

        if is_member {
            context.succeed(requirement);
        }
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn external_handlers_run_concurrently_across_tasks() {
    let acme = Arc::new(
        AuthorizationPolicyBuilder::new("acme")
            .add_requirement(TenantRequirement {
                directory: TenantDirectory {
                    tenant: "acme".to_string(),
                    members: vec!["u1".to_string()],
                },
            })
            .build(),
    );
    let user = principal_from(&signed(vec![("sub", ClaimValue::from("u1"))]));
    let stranger = principal_from(&signed(vec![("sub", ClaimValue::from("u2"))]));

    let mut tasks = Vec::new();
    for i in 0..32 {
        let policy = Arc::clone(&acme);
        let principal = if i % 2 == 0 { Arc::clone(&user) } else { Arc::clone(&stranger) };
        tasks.push(tokio::spawn(async move {
            let decision = AuthorizationEvaluator::default()
                .authorize(&policy, Some(principal))
                .await
                .unwrap();
            (i, decision.is_allowed())
        }));
    }

    for task in tasks {
        let (i, allowed) = task.await.unwrap();
        assert_eq!(allowed, i % 2 == 0);
    }
}

#[tokio::test]
async fn unknown_policy_is_an_error_not_a_denial() {
    let err = AuthorizationEvaluator::default()
        .authorize_named(&AuthorizationOptions::new(), "missing", None)
        .await
        .unwrap_err();
    assert!(matches!(err, EvaluationError::UnknownPolicy(_)));
}
