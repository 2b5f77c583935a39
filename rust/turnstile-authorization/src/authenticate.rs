use turnstile_accounts::{AccountKey, AccountStore, Principal};
use turnstile_ledger::TokenLedger;
use turnstile_storage::{StorageScan, TransactionalBackend, TurnstileStorageError};
use turnstile_token::{ClaimSet, Subject, TokenError, decode, encode};

use crate::{AccessError, AuthContext, ConfigSource};

/// Turns a presented bearer token into an [AuthContext].
///
/// This is the middleware equivalent of the request pipeline: decode the
/// token under the per-request secret, charge the consumable-token ledger
/// once if the token declares a use budget, and resolve the subject against
/// the account store. The sentinel subjects map straight onto
/// [Principal::Super] and [Principal::Nobody] without a lookup.
///
/// An absent `Authorization` header is, by the transport contract, the
/// empty token — which authenticates as Nobody.
#[derive(Clone)]
pub struct Authenticator<Backend, Config>
where
    Backend: TransactionalBackend<Key = String, Value = Vec<u8>, Error = TurnstileStorageError>
        + StorageScan,
    Config: ConfigSource,
{
    accounts: AccountStore<Backend>,
    ledger: TokenLedger<Backend>,
    config: Config,
}

impl<Backend, Config> Authenticator<Backend, Config>
where
    Backend: TransactionalBackend<Key = String, Value = Vec<u8>, Error = TurnstileStorageError>
        + StorageScan,
    Config: ConfigSource,
{
    /// An authenticator over `backend`, reading per-request configuration
    /// from `config`
    pub fn new(backend: Backend, config: Config) -> Self {
        Self {
            accounts: AccountStore::new(backend.clone()),
            ledger: TokenLedger::new(backend),
            config,
        }
    }

    /// The account store this authenticator resolves subjects against
    pub fn accounts(&self) -> &AccountStore<Backend> {
        &self.accounts
    }

    /// The consumable-token ledger this authenticator charges
    pub fn ledger(&self) -> &TokenLedger<Backend> {
        &self.ledger
    }

    /// Authenticate a presented bearer token.
    ///
    /// # Panics
    ///
    /// Panics when the configuration collaborator cannot supply a secret:
    /// no request is authenticatable without one, so a missing config is a
    /// deployment fault, not a request-level error.
    pub async fn authenticate(&self, bearer_token: &[u8]) -> AuthContext {
        let config = match self.config.auth_config().await {
            Ok(config) => config,
            Err(error) => panic!("could not load the auth secret: {error}"),
        };

        let claims = match decode(bearer_token, config.auth_secret.reveal()) {
            Ok(claims) => claims,
            Err(error) => {
                return AuthContext::new(
                    Err(AccessError::Token(error.clone())),
                    Err(AccessError::Token(error)),
                    Ok(()),
                );
            }
        };

        // Budgeted tokens are charged exactly once per request, here;
        // checks later observe the outcome rather than spending again.
        let consumption = self
            .ledger
            .use_claim_set(&claims)
            .await
            .map_err(AccessError::from);

        let principal = match &claims.sub {
            Subject::Super => Ok(Principal::Super),
            Subject::Nobody => Ok(Principal::Nobody),
            Subject::Key(key) => self
                .accounts
                .load_by_key(&AccountKey::from_raw(key.clone()))
                .await
                .map(Principal::Stored)
                .map_err(|error| {
                    tracing::debug!(%key, %error, "could not resolve token subject");
                    AccessError::CannotRetrieveAccount(format!(
                        "could not retrieve account with key {key}: {error}"
                    ))
                }),
        };

        AuthContext::new(principal, Ok(claims), consumption)
    }

    /// Issue a signed bearer token for `claims` under the current secret.
    ///
    /// # Panics
    ///
    /// Panics when the configuration collaborator cannot supply a secret,
    /// exactly as [Authenticator::authenticate] does.
    pub async fn issue(&self, claims: &ClaimSet) -> Result<String, TokenError> {
        let config = match self.config.auth_config().await {
            Ok(config) => config,
            Err(error) => panic!("could not load the auth secret: {error}"),
        };

        encode(claims, config.auth_secret.reveal())
    }
}
