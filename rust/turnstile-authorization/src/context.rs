use std::collections::HashMap;

use turnstile_accounts::Principal;
use turnstile_token::ClaimSet;

use crate::AccessError;

/// The authenticated state of one request, threaded explicitly through the
/// call chain.
///
/// Each slot holds the outcome of its authentication step: the resolved
/// principal, the validated claim set, and the result of charging the
/// consumable-token ledger. Accessors surface whichever error the failing
/// step produced, so a check that needs the principal of a request with a
/// forged token reports the forgery, not a vague denial.
#[derive(Debug, Clone)]
pub struct AuthContext {
    principal: Result<Principal, AccessError>,
    claims: Result<ClaimSet, AccessError>,
    consumption: Result<(), AccessError>,
    params: HashMap<String, String>,
}

impl AuthContext {
    /// Assemble a context from the outcomes of the authentication steps
    pub fn new(
        principal: Result<Principal, AccessError>,
        claims: Result<ClaimSet, AccessError>,
        consumption: Result<(), AccessError>,
    ) -> Self {
        Self {
            principal,
            claims,
            consumption,
            params: HashMap::new(),
        }
    }

    /// A context that was never wired through authentication. Both slots
    /// report wiring errors; every meaningful check denies.
    pub fn unwired() -> Self {
        Self::new(
            Err(AccessError::CannotRetrieveAccount(
                "request was not authenticated".to_owned(),
            )),
            Err(AccessError::CannotRetrieveClaimSet(
                "request was not authenticated".to_owned(),
            )),
            Ok(()),
        )
    }

    /// Attach a decoded route parameter, as supplied by the transport's
    /// parameter extraction
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// The authenticated principal, or the error that prevented resolving
    /// one
    pub fn principal(&self) -> Result<&Principal, AccessError> {
        self.principal.as_ref().map_err(Clone::clone)
    }

    /// The validated claim set, or the error that prevented decoding one
    pub fn claims(&self) -> Result<&ClaimSet, AccessError> {
        self.claims.as_ref().map_err(Clone::clone)
    }

    /// The outcome of charging the consumable-token ledger for this request
    pub fn consumption(&self) -> Result<(), AccessError> {
        self.consumption.clone()
    }

    /// The decoded value of the named route parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// A short label for the requesting party, for log lines
    pub(crate) fn subject_label(&self) -> String {
        match &self.claims {
            Ok(claims) => claims.sub.to_string(),
            Err(_) => "<unauthenticated>".to_owned(),
        }
    }
}
