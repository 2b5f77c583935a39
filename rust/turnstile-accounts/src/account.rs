use std::collections::BTreeSet;
use std::fmt::{self, Debug, Formatter};

use serde::{Deserialize, Serialize};

use turnstile_token::Timestamp;

use crate::{AccountError, AccountKey, password};

/// The persisted portion of an account row
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct AccountRecord {
    pub(crate) created_at: Timestamp,
    pub(crate) updated_at: Timestamp,
    pub(crate) identity: String,
    pub(crate) roles: BTreeSet<String>,
    pub(crate) credential: String,
}

/// Where an [Account] instance came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    /// Loaded or created through the [crate::AccountStore]
    Store,
    /// Hand-built; must never be persisted
    Adhoc,
}

/// An account that can access the platform.
///
/// Instances carry private provenance: whether they came through the store,
/// the identity key they were loaded under, and a snapshot of the stored row
/// as last observed. [crate::AccountStore::save] uses all three — an ad hoc
/// instance or one whose identity diverged from its loaded key is rejected
/// outright, and the snapshot is the baseline for conflict detection.
#[derive(Clone)]
pub struct Account {
    pub(crate) record: AccountRecord,
    pub(crate) origin: Origin,
    pub(crate) loaded_key: Option<AccountKey>,
    pub(crate) baseline: Option<Vec<u8>>,
}

impl Account {
    /// Build an account that did not come through the store. Useful for
    /// tests and dry runs; the store refuses to persist it.
    pub fn new_adhoc(identity: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            record: AccountRecord {
                created_at: now,
                updated_at: now,
                identity: identity.into(),
                roles: BTreeSet::new(),
                credential: String::new(),
            },
            origin: Origin::Adhoc,
            loaded_key: None,
            baseline: None,
        }
    }

    /// The external identity this account was registered under
    pub fn identity(&self) -> &str {
        &self.record.identity
    }

    /// Point the in-memory identity somewhere else.
    ///
    /// This does *not* move the stored row: an instance whose identity no
    /// longer matches the key it was loaded under becomes unsaveable, and
    /// [crate::AccountStore::rename_identity] is the sanctioned path.
    pub fn set_identity(&mut self, identity: impl Into<String>) {
        self.record.identity = identity.into();
    }

    /// When the account was created
    pub fn created_at(&self) -> Timestamp {
        self.record.created_at
    }

    /// When the account was last saved
    pub fn updated_at(&self) -> Timestamp {
        self.record.updated_at
    }

    /// The semantic privileges granted to this account
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.record.roles
    }

    /// Whether the account holds `role`
    pub fn has_role(&self, role: &str) -> bool {
        self.record.roles.contains(role)
    }

    /// Grant `role`
    pub fn add_role(&mut self, role: impl Into<String>) {
        self.record.roles.insert(role.into());
    }

    /// Revoke `role`
    pub fn remove_role(&mut self, role: &str) {
        self.record.roles.remove(role);
    }

    /// Replace the credential with a hash of `secret`. Secrets below
    /// [crate::MIN_SECRET_LENGTH] bytes are rejected before hashing.
    pub fn set_password(&mut self, secret: &str) -> Result<(), AccountError> {
        self.record.credential = password::hash_secret(secret)?;
        Ok(())
    }

    /// Check `candidate` against the stored credential hash
    pub fn check_password(&self, candidate: &str) -> Result<(), AccountError> {
        password::verify_secret(&self.record.credential, candidate)
    }

    /// The identity key this instance was loaded or created under, if it
    /// came through the store
    pub fn key(&self) -> Option<&AccountKey> {
        self.loaded_key.as_ref()
    }

    pub(crate) fn came_through_store(&self) -> bool {
        self.origin == Origin::Store
    }
}

impl Debug for Account {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("identity", &self.record.identity)
            .field("roles", &self.record.roles)
            .field("created_at", &self.record.created_at)
            .field("updated_at", &self.record.updated_at)
            .field("credential", &"<redacted>")
            .finish()
    }
}

/// An authenticated principal: a stored account or one of the two sentinels.
///
/// The sentinels are discriminants, not magic values — no stored account can
/// ever compare equal to them, and dispatch never relies on pointer or value
/// identity.
#[derive(Debug, Clone)]
pub enum Principal {
    /// The superuser: the caller authenticated with the deployment secret
    /// itself. Implicitly holds every role.
    Super,
    /// An unauthenticated caller. Holds no roles.
    Nobody,
    /// A principal resolved from the account store
    Stored(Account),
}

impl Principal {
    /// Whether this is the Super sentinel
    pub fn is_super(&self) -> bool {
        matches!(self, Principal::Super)
    }

    /// Whether this is the Nobody sentinel
    pub fn is_nobody(&self) -> bool {
        matches!(self, Principal::Nobody)
    }

    /// Whether the principal holds `role`. Super holds every role; Nobody
    /// holds none.
    pub fn has_role(&self, role: &str) -> bool {
        match self {
            Principal::Super => true,
            Principal::Nobody => false,
            Principal::Stored(account) => account.has_role(role),
        }
    }

    /// The storage identity key, for stored principals only
    pub fn key(&self) -> Option<&AccountKey> {
        match self {
            Principal::Stored(account) => account.key(),
            _ => None,
        }
    }
}
