use turnstile_storage::{Transaction, TransactionalBackend, TurnstileStorageError};
use turnstile_token::ClaimSet;

use crate::counter::{decode_count, encode_count};
use crate::LedgerError;

/// The entity kind under which per-token use counts are stored
pub const TOKEN_USE_KIND: &str = "TokenUse";

/// Exact use accounting for budget-limited claim sets.
///
/// A claim set that declares a maximum-use budget (`u`) must also carry a
/// unique token id (`jti`); the ledger tracks how many times each token id
/// has been spent and refuses the spend that would exceed the budget.
///
/// Each token's count is deliberately a **single** storage row rather than a
/// [crate::ShardedCounter]. Sharding the count would raise per-token write
/// throughput, but shard sums are not linearizable, which would weaken the
/// budget to "approximately at most the limit". Exactness is the point of a
/// budget, and distinct tokens already land on distinct rows.
#[derive(Clone)]
pub struct TokenLedger<Backend>
where
    Backend: TransactionalBackend<Key = String, Value = Vec<u8>, Error = TurnstileStorageError>,
{
    backend: Backend,
}

impl<Backend> TokenLedger<Backend>
where
    Backend: TransactionalBackend<Key = String, Value = Vec<u8>, Error = TurnstileStorageError>,
{
    /// A ledger over `backend`
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Spend one use of `claims`.
    ///
    /// Claim sets without a budget are unconditionally usable and never
    /// touch storage. For budgeted claim sets the check-then-increment is a
    /// single atomic transaction: with one use remaining, concurrent spends
    /// of the same token id can never both succeed — the loser surfaces
    /// either [LedgerError::UsedUp] or the storage conflict, and the ledger
    /// never retries on the caller's behalf.
    pub async fn use_claim_set(&self, claims: &ClaimSet) -> Result<(), LedgerError> {
        let Some(limit) = claims.max_uses() else {
            return Ok(());
        };
        let Some(token_id) = claims.token_id() else {
            return Err(LedgerError::InvalidConsumableToken);
        };

        let row = format!("{TOKEN_USE_KIND}/{token_id}");

        let mut txn = Transaction::begin(&self.backend);
        let used = match txn.get(&row).await? {
            Some(bytes) => decode_count(&bytes)?,
            None => 0,
        };

        if used >= limit {
            tracing::debug!(token_id, limit, "token budget exhausted");
            return Err(LedgerError::UsedUp);
        }

        txn.put(row, encode_count(used + 1)?);
        txn.commit().await?;

        Ok(())
    }
}
