//! End-to-end tests of the request authorization flow.
//!
//! These drive the real pipeline — codec, ledger, account store, checks —
//! over an in-memory backend: issue a token, present it, and watch the
//! configured checker grant or deny with the exact expected error.

use async_trait::async_trait;

use turnstile_accounts::Account;
use turnstile_authorization::{
    AccessError, AuthConfig, AuthContext, Authenticator, Checker, ConfigError, ConfigSource,
    ErrorCode, HasRole, MatchesParam, StaticConfigSource, SuperOnly,
};
use turnstile_storage::MemoryStorageBackend;
use turnstile_token::{ClaimSet, Scope, Subject, Timestamp, TokenError};

const SECRET: &[u8] = b"shared-deployment-secret";

type Backend = MemoryStorageBackend<String, Vec<u8>>;

fn authenticator() -> Authenticator<Backend, StaticConfigSource> {
    Authenticator::new(
        Backend::default(),
        StaticConfigSource::with_secret(SECRET),
    )
}

/// Register an account holding `roles` and return it.
async fn account_with_roles(
    auth: &Authenticator<Backend, StaticConfigSource>,
    identity: &str,
    roles: &[&str],
) -> Account {
    let mut account = auth
        .accounts()
        .register(identity, "long-enough")
        .await
        .expect("registration succeeds");
    for role in roles {
        account.add_role(*role);
    }
    auth.accounts()
        .save(&mut account)
        .await
        .expect("save succeeds");
    account
}

/// Claims for a stored account, scoped to `scope`.
fn claims_for(account: &Account, scope: Scope) -> ClaimSet {
    let key = account.key().expect("stored accounts have keys");
    ClaimSet::new(
        Subject::Key(key.as_str().to_owned()),
        Timestamp::seconds_from_now(3600),
    )
    .with_scope(scope)
}

#[tokio::test]
async fn a_role_holder_with_a_scoped_token_is_granted() {
    let auth = authenticator();
    let account = account_with_roles(&auth, "editor@example.com", &["editor"]).await;

    let token = auth
        .issue(&claims_for(&account, Scope::new(["editor"])))
        .await
        .expect("token issues");

    let cx = auth.authenticate(token.as_bytes()).await;
    let checker = Checker::any().check(HasRole::new("editor"));

    let outcome = checker.then(cx, |cx| async move {
        cx.principal()
            .expect("principal resolves")
            .has_role("editor")
    });

    assert_eq!(outcome.await, Ok(true));
}

#[tokio::test]
async fn the_deployment_secret_authenticates_the_superuser() {
    let auth = authenticator();

    let cx = auth.authenticate(SECRET).await;

    assert!(cx.principal().expect("principal resolves").is_super());
    assert!(
        Checker::any()
            .check(SuperOnly)
            .evaluate(&cx)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn an_absent_token_authenticates_nobody_and_role_checks_deny() {
    let auth = authenticator();

    let cx = auth.authenticate(b"").await;

    assert!(cx.principal().expect("principal resolves").is_nobody());
    assert_eq!(
        Checker::any()
            .check(HasRole::new("editor"))
            .evaluate(&cx)
            .await,
        Err(AccessError::RoleMissing)
    );
}

#[tokio::test]
async fn an_out_of_scope_role_denies_with_scope_not_role() {
    let auth = authenticator();
    let account = account_with_roles(&auth, "admin@example.com", &["admin"]).await;

    // The account holds the role, but this token was not scoped to it.
    let token = auth
        .issue(&claims_for(&account, Scope::new(["somethingelse"])))
        .await
        .expect("token issues");
    let cx = auth.authenticate(token.as_bytes()).await;

    let checker = Checker::all()
        .check(HasRole::new("admin"))
        .check(SuperOnly);

    assert_eq!(
        checker.evaluate(&cx).await,
        Err(AccessError::RoleNotInScope)
    );
}

#[tokio::test]
async fn a_forged_token_surfaces_the_signature_failure() {
    let auth = authenticator();
    let account = account_with_roles(&auth, "editor@example.com", &["editor"]).await;

    let forged = turnstile_token::encode(
        &claims_for(&account, Scope::all()),
        b"not-the-deployment-secret",
    )
    .expect("token encodes");

    let cx = auth.authenticate(forged.as_bytes()).await;
    let outcome = Checker::any()
        .check(HasRole::new("editor"))
        .evaluate(&cx)
        .await;

    assert_eq!(outcome, Err(AccessError::Token(TokenError::BadSignature)));
    assert_eq!(
        outcome.unwrap_err().code().status_code(),
        401
    );
}

#[tokio::test]
async fn an_unknown_subject_cannot_retrieve_an_account() {
    let auth = authenticator();

    let stray = ClaimSet::new(
        Subject::Key("never-registered".to_owned()),
        Timestamp::seconds_from_now(3600),
    );
    let token = auth.issue(&stray).await.expect("token issues");

    let cx = auth.authenticate(token.as_bytes()).await;
    let outcome = Checker::any()
        .check(HasRole::new("editor"))
        .evaluate(&cx)
        .await;

    assert!(matches!(
        outcome,
        Err(AccessError::CannotRetrieveAccount(_))
    ));
    assert_eq!(
        outcome.unwrap_err().code(),
        ErrorCode::CannotRetrieveAccount
    );
}

#[tokio::test]
async fn a_single_use_token_works_once_and_then_reports_exhaustion() {
    let auth = authenticator();
    let account = account_with_roles(&auth, "guest@example.com", &["guest"]).await;

    let claims = claims_for(&account, Scope::new(["guest"]))
        .with_token_id("invite-123")
        .with_max_uses(1);
    let token = auth.issue(&claims).await.expect("token issues");

    let checker = Checker::any().check(HasRole::new("guest"));

    // First presentation spends the single use.
    let cx = auth.authenticate(token.as_bytes()).await;
    assert!(checker.evaluate(&cx).await.is_ok());

    // The second presentation is exhausted — and says so, rather than
    // hiding behind a role error.
    let cx = auth.authenticate(token.as_bytes()).await;
    assert_eq!(checker.evaluate(&cx).await, Err(AccessError::UsedUp));
}

#[tokio::test]
async fn matches_param_gates_a_route_on_the_callers_own_key() {
    let auth = authenticator();
    let account = account_with_roles(&auth, "owner@example.com", &[]).await;
    let key = account.key().expect("stored accounts have keys").clone();

    let token = auth
        .issue(&claims_for(&account, Scope::all()))
        .await
        .expect("token issues");

    let checker = Checker::any().check(MatchesParam::new("accountId"));

    let cx = auth
        .authenticate(token.as_bytes())
        .await
        .with_param("accountId", key.as_str());
    assert!(checker.evaluate(&cx).await.is_ok());

    let cx = auth
        .authenticate(token.as_bytes())
        .await
        .with_param("accountId", "someone-else");
    assert_eq!(checker.evaluate(&cx).await, Err(AccessError::IdMismatch));
}

#[tokio::test]
async fn an_unwired_context_is_a_wiring_failure_not_a_denial() {
    let cx = AuthContext::unwired();

    let outcome = Checker::any()
        .check(HasRole::new("editor"))
        .evaluate(&cx)
        .await;

    assert!(matches!(
        outcome,
        Err(AccessError::CannotRetrieveAccount(_))
    ));
}

struct BrokenConfigSource;

#[async_trait]
impl ConfigSource for BrokenConfigSource {
    async fn auth_config(&self) -> Result<AuthConfig, ConfigError> {
        Err(ConfigError("config store unreachable".to_owned()))
    }
}

#[tokio::test]
#[should_panic(expected = "could not load the auth secret")]
async fn a_missing_config_is_fatal() {
    let auth = Authenticator::new(Backend::default(), BrokenConfigSource);

    auth.authenticate(b"").await;
}
