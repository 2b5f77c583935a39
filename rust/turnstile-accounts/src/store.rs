use futures::try_join;

use turnstile_storage::{StorageScan, Transaction, TransactionalBackend, TurnstileStorageError};
use turnstile_token::Timestamp;

use crate::account::{AccountRecord, Origin};
use crate::{Account, AccountError, AccountKey, KeyDerivation, password};

/// The entity kind under which account rows are stored
pub const ACCOUNT_KIND: &str = "Account";

fn encode_record(record: &AccountRecord) -> Result<Vec<u8>, AccountError> {
    serde_json::to_vec(record)
        .map_err(|error| TurnstileStorageError::EncodeFailed(error.to_string()).into())
}

fn decode_record(bytes: &[u8]) -> Result<AccountRecord, AccountError> {
    serde_json::from_slice(bytes)
        .map_err(|error| TurnstileStorageError::DecodeFailed(error.to_string()).into())
}

fn map_commit_error(error: TurnstileStorageError) -> AccountError {
    match error {
        TurnstileStorageError::Conflict => AccountError::Conflict,
        other => AccountError::Storage(other),
    }
}

/// A keyed, optimistically concurrent store of [Account] rows.
///
/// Every mutation happens inside a storage transaction. Saves and removals
/// re-read the row and compare it against the snapshot the caller last
/// observed; a mismatch fails with [AccountError::Conflict] instead of
/// overwriting a competing writer's change. Identity changes only happen
/// through [AccountStore::rename_identity], which moves the row between two
/// keys atomically.
#[derive(Clone)]
pub struct AccountStore<Backend>
where
    Backend: TransactionalBackend<Key = String, Value = Vec<u8>, Error = TurnstileStorageError>
        + StorageScan,
{
    backend: Backend,
    derivation: KeyDerivation,
}

impl<Backend> AccountStore<Backend>
where
    Backend: TransactionalBackend<Key = String, Value = Vec<u8>, Error = TurnstileStorageError>
        + StorageScan,
{
    /// A store over `backend` using hashed identity keys
    pub fn new(backend: Backend) -> Self {
        Self::with_derivation(backend, KeyDerivation::default())
    }

    /// A store over `backend` with an explicit [KeyDerivation] mode
    pub fn with_derivation(backend: Backend, derivation: KeyDerivation) -> Self {
        Self {
            backend,
            derivation,
        }
    }

    /// The identity key `identity` maps to under this store's derivation
    pub fn key_for(&self, identity: &str) -> AccountKey {
        AccountKey::derive(identity, self.derivation)
    }

    fn row_key(&self, key: &AccountKey) -> String {
        format!("{ACCOUNT_KIND}/{key}")
    }

    fn descendant_prefix(&self, key: &AccountKey) -> String {
        format!("{ACCOUNT_KIND}/{key}/")
    }

    /// Create a new account for `identity`, failing with
    /// [AccountError::AlreadyExists] if the identity key is occupied.
    ///
    /// The credential is hashed before the transaction opens; hashing is
    /// deliberately slow and must not extend the transaction's window.
    pub async fn register(&self, identity: &str, secret: &str) -> Result<Account, AccountError> {
        let credential = password::hash_secret(secret)?;
        let key = self.key_for(identity);
        let row = self.row_key(&key);

        let now = Timestamp::now();
        let record = AccountRecord {
            created_at: now,
            updated_at: now,
            identity: identity.to_owned(),
            roles: Default::default(),
            credential,
        };
        let bytes = encode_record(&record)?;

        let mut txn = Transaction::begin(&self.backend);
        if txn.get(&row).await?.is_some() {
            return Err(AccountError::AlreadyExists);
        }
        txn.put(row, bytes.clone());
        // A commit conflict here means a competing register landed first.
        txn.commit().await.map_err(|error| match error {
            TurnstileStorageError::Conflict => AccountError::AlreadyExists,
            other => AccountError::Storage(other),
        })?;

        tracing::debug!(key = %key, "account registered");

        Ok(Account {
            record,
            origin: Origin::Store,
            loaded_key: Some(key),
            baseline: Some(bytes),
        })
    }

    /// Load the account registered under `identity`
    pub async fn load(&self, identity: &str) -> Result<Account, AccountError> {
        self.load_by_key(&self.key_for(identity)).await
    }

    /// Load the account at an already-derived identity key, e.g. the
    /// subject of a validated claim set
    pub async fn load_by_key(&self, key: &AccountKey) -> Result<Account, AccountError> {
        let row = self.row_key(key);
        let Some(bytes) = self.backend.get(&row).await? else {
            return Err(AccountError::NotFound);
        };

        let record = decode_record(&bytes)?;

        Ok(Account {
            record,
            origin: Origin::Store,
            loaded_key: Some(key.clone()),
            baseline: Some(bytes),
        })
    }

    /// Validate that `account` is persistable at its loaded key. Rejects
    /// without touching storage; see [AccountError::Unsaveable].
    fn saveable_key(&self, account: &Account) -> Result<AccountKey, AccountError> {
        if !account.came_through_store() {
            return Err(AccountError::Unsaveable);
        }
        let Some(loaded_key) = account.key() else {
            return Err(AccountError::Unsaveable);
        };
        if self.key_for(account.identity()) != *loaded_key {
            return Err(AccountError::Unsaveable);
        }
        Ok(loaded_key.clone())
    }

    /// Persist `account`, stamping a fresh last-modified timestamp.
    ///
    /// Fails with [AccountError::Unsaveable] for instances that did not come
    /// through the store or whose identity diverged from their loaded key,
    /// and with [AccountError::Conflict] when the stored row no longer
    /// matches the state this instance last observed.
    pub async fn save(&self, account: &mut Account) -> Result<(), AccountError> {
        let key = self.saveable_key(account)?;
        let Some(baseline) = account.baseline.clone() else {
            return Err(AccountError::Unsaveable);
        };
        let row = self.row_key(&key);

        let mut txn = Transaction::begin(&self.backend);
        match txn.get(&row).await? {
            Some(current) if current == baseline => {}
            // Changed underneath us, or removed entirely.
            _ => return Err(AccountError::Conflict),
        }

        account.record.updated_at = Timestamp::now();
        let bytes = encode_record(&account.record)?;
        txn.put(row, bytes.clone());
        txn.commit().await.map_err(map_commit_error)?;

        account.baseline = Some(bytes);

        Ok(())
    }

    /// Atomically move the account registered under `old_identity` to
    /// `new_identity`.
    ///
    /// Both rows are read concurrently; the deletion of the old row and the
    /// write of the new one land in a single atomic commit, so readers never
    /// observe the principal at both keys or at neither.
    pub async fn rename_identity(
        &self,
        old_identity: &str,
        new_identity: &str,
    ) -> Result<(), AccountError> {
        let old_key = self.key_for(old_identity);
        let new_key = self.key_for(new_identity);
        let old_row = self.row_key(&old_key);
        let new_row = self.row_key(&new_key);

        let (old_state, new_state) = try_join!(
            self.backend.resolve(&old_row),
            self.backend.resolve(&new_row)
        )?;

        let Some((old_bytes, old_edition)) = old_state else {
            return Err(AccountError::NotFound);
        };
        if new_state.is_some() {
            return Err(AccountError::AlreadyExists);
        }

        let mut record = decode_record(&old_bytes)?;
        record.identity = new_identity.to_owned();
        record.updated_at = Timestamp::now();
        let new_bytes = encode_record(&record)?;

        self.backend
            .commit(
                vec![(old_row.clone(), Some(old_edition)), (new_row.clone(), None)],
                vec![(old_row, None), (new_row, Some(new_bytes))],
            )
            .await
            .map_err(map_commit_error)?;

        tracing::debug!(from = %old_key, to = %new_key, "account identity renamed");

        Ok(())
    }

    /// Remove `account` along with every row that structurally descends from
    /// its key, after re-checking for a competing change exactly as
    /// [AccountStore::save] does.
    pub async fn remove(&self, account: &Account) -> Result<(), AccountError> {
        let key = self.saveable_key(account)?;
        let Some(baseline) = account.baseline.clone() else {
            return Err(AccountError::Unsaveable);
        };
        let row = self.row_key(&key);

        let mut txn = Transaction::begin(&self.backend);
        match txn.get(&row).await? {
            Some(current) if current == baseline => {}
            _ => return Err(AccountError::Conflict),
        }

        let descendants = self
            .backend
            .keys_with_prefix(&self.descendant_prefix(&key))
            .await?;
        for descendant in descendants {
            txn.delete(descendant);
        }
        txn.delete(row);

        txn.commit().await.map_err(map_commit_error)?;

        tracing::debug!(key = %key, "account removed");

        Ok(())
    }
}
