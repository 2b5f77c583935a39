use async_trait::async_trait;

use crate::{AccessError, AuthContext};

/// A predicate over the authenticated state of a request.
///
/// Checks return `Ok(())` to grant or the *specific* [AccessError] that
/// denies — never a generic refusal. Checks are combined by a
/// [crate::Checker]; they may await the context but must not mutate shared
/// state (the ledger is charged during authentication, not here).
#[async_trait]
pub trait AuthCheck: Send + Sync {
    /// Evaluate the check against the request's authenticated state
    async fn check(&self, cx: &AuthContext) -> Result<(), AccessError>;
}

/// Grants only the Super sentinel: the caller who authenticated with the
/// deployment secret itself.
pub struct SuperOnly;

#[async_trait]
impl AuthCheck for SuperOnly {
    async fn check(&self, cx: &AuthContext) -> Result<(), AccessError> {
        if cx.principal()?.is_super() {
            Ok(())
        } else {
            Err(AccessError::Forbidden)
        }
    }
}

/// Grants when the principal holds a role *and* this token is entitled to
/// exercise it.
///
/// The conditions are evaluated in a fixed order with short-circuiting:
///
/// 1. the principal's role set must contain the role, else
///    [AccessError::RoleMissing];
/// 2. the claim set's scope must name the role or carry the wildcard, else
///    [AccessError::RoleNotInScope];
/// 3. if the token declares a use budget, the ledger must have accepted
///    this request's spend, else [AccessError::UsedUp].
///
/// The order matters: an exhausted token held by a properly entitled
/// account reports the exhaustion, never a misleading role failure.
pub struct HasRole {
    role: String,
}

impl HasRole {
    /// A check for `role`
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }
}

#[async_trait]
impl AuthCheck for HasRole {
    async fn check(&self, cx: &AuthContext) -> Result<(), AccessError> {
        let principal = cx.principal()?;
        let claims = cx.claims()?;

        if !principal.has_role(&self.role) {
            return Err(AccessError::RoleMissing);
        }
        if !claims.scope.permits(&self.role) {
            return Err(AccessError::RoleNotInScope);
        }
        cx.consumption()?;

        Ok(())
    }
}

/// Grants when the principal is a stored account whose identity key equals
/// the named route parameter — the "you may only touch your own resource"
/// rule. Sentinels are never a match: Super has no identity of its own and
/// should pass through an explicit [SuperOnly] escape hatch instead.
pub struct MatchesParam {
    param: String,
}

impl MatchesParam {
    /// A check against the route parameter `param`
    pub fn new(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
        }
    }
}

#[async_trait]
impl AuthCheck for MatchesParam {
    async fn check(&self, cx: &AuthContext) -> Result<(), AccessError> {
        let principal = cx.principal()?;

        if principal.is_super() || principal.is_nobody() {
            return Err(AccessError::IdMismatch);
        }

        let Some(key) = principal.key() else {
            return Err(AccessError::IdMismatch);
        };

        match cx.param(&self.param) {
            Some(value) if value == key.as_str() => Ok(()),
            _ => Err(AccessError::IdMismatch),
        }
    }
}

#[cfg(test)]
mod tests {
    use turnstile_accounts::Principal;
    use turnstile_token::{ClaimSet, Scope, Subject, Timestamp, TokenError};

    use super::{AuthCheck, HasRole, MatchesParam, SuperOnly};
    use crate::{AccessError, AuthContext};

    fn context_for(principal: Principal, claims: ClaimSet) -> AuthContext {
        AuthContext::new(Ok(principal), Ok(claims), Ok(()))
    }

    fn claims_with_scope(scope: Scope) -> ClaimSet {
        ClaimSet::new(Subject::Key("k".into()), Timestamp::seconds_from_now(60)).with_scope(scope)
    }

    #[tokio::test]
    async fn super_only_grants_the_sentinel_and_nothing_else() {
        let cx = context_for(Principal::Super, ClaimSet::super_sentinel());
        assert!(SuperOnly.check(&cx).await.is_ok());

        let cx = context_for(Principal::Nobody, ClaimSet::nobody_sentinel());
        assert_eq!(SuperOnly.check(&cx).await, Err(AccessError::Forbidden));
    }

    #[tokio::test]
    async fn has_role_reports_the_first_failing_condition() {
        let mut account = turnstile_accounts::Account::new_adhoc("a@b.c");
        account.add_role("tyrant");

        // Role missing comes before scope problems.
        let cx = context_for(
            Principal::Stored(account.clone()),
            claims_with_scope(Scope::all()),
        );
        assert_eq!(
            HasRole::new("emperor").check(&cx).await,
            Err(AccessError::RoleMissing)
        );

        // Role present, but this token's scope does not extend to it.
        let cx = context_for(
            Principal::Stored(account.clone()),
            claims_with_scope(Scope::new(["somethingelse"])),
        );
        assert_eq!(
            HasRole::new("tyrant").check(&cx).await,
            Err(AccessError::RoleNotInScope)
        );

        // Role present and in scope.
        let cx = context_for(
            Principal::Stored(account),
            claims_with_scope(Scope::new(["tyrant"])),
        );
        assert!(HasRole::new("tyrant").check(&cx).await.is_ok());
    }

    #[tokio::test]
    async fn has_role_surfaces_an_exhausted_budget_after_the_scope_check() {
        let mut account = turnstile_accounts::Account::new_adhoc("a@b.c");
        account.add_role("tyrant");

        let cx = AuthContext::new(
            Ok(Principal::Stored(account)),
            Ok(claims_with_scope(Scope::all())),
            Err(AccessError::UsedUp),
        );

        // Entitled in every way, but the budget is spent.
        assert_eq!(
            HasRole::new("tyrant").check(&cx).await,
            Err(AccessError::UsedUp)
        );
        // A role the account does not hold still reports the role, not the
        // budget.
        assert_eq!(
            HasRole::new("emperor").check(&cx).await,
            Err(AccessError::RoleMissing)
        );
    }

    #[tokio::test]
    async fn has_role_propagates_wiring_and_token_errors() {
        let cx = AuthContext::unwired();
        assert!(matches!(
            HasRole::new("tyrant").check(&cx).await,
            Err(AccessError::CannotRetrieveAccount(_))
        ));

        let cx = AuthContext::new(
            Err(AccessError::Token(TokenError::BadSignature)),
            Err(AccessError::Token(TokenError::BadSignature)),
            Ok(()),
        );
        assert_eq!(
            HasRole::new("tyrant").check(&cx).await,
            Err(AccessError::Token(TokenError::BadSignature))
        );
    }

    #[tokio::test]
    async fn matches_param_compares_the_identity_key() {
        let backend = turnstile_storage::MemoryStorageBackend::<String, Vec<u8>>::default();
        let store = turnstile_accounts::AccountStore::new(backend);
        let account = store
            .register("a@b.c", "long-enough")
            .await
            .expect("registration succeeds");
        let key = account.key().expect("stored accounts have keys").clone();

        let claims = ClaimSet::new(
            Subject::Key(key.as_str().to_owned()),
            Timestamp::seconds_from_now(60),
        );

        let cx = context_for(Principal::Stored(account.clone()), claims.clone())
            .with_param("accountId", key.as_str());
        assert!(MatchesParam::new("accountId").check(&cx).await.is_ok());

        let cx = context_for(Principal::Stored(account), claims)
            .with_param("accountId", "someone-else");
        assert_eq!(
            MatchesParam::new("accountId").check(&cx).await,
            Err(AccessError::IdMismatch)
        );
    }

    #[tokio::test]
    async fn matches_param_never_matches_a_sentinel() {
        let cx = context_for(Principal::Super, ClaimSet::super_sentinel())
            .with_param("accountId", "_super");

        assert_eq!(
            MatchesParam::new("accountId").check(&cx).await,
            Err(AccessError::IdMismatch)
        );
    }
}
