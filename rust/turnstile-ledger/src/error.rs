use thiserror::Error;

use turnstile_storage::TurnstileStorageError;

/// Errors produced by counters and the consumable-token ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The requested shard count is outside the supported range
    #[error("Bad number of shards; min is 1, max is 1000")]
    BadShardCount,

    /// A claim set declares a use budget but carries no token id, so its
    /// consumption cannot be tracked
    #[error("Token declares a use budget but no token id")]
    InvalidConsumableToken,

    /// The token's use budget is exhausted
    #[error("Token has been used up")]
    UsedUp,

    /// The underlying storage substrate failed
    #[error(transparent)]
    Storage(#[from] TurnstileStorageError),
}
