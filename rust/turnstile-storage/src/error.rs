use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug)]
pub enum TurnstileStorageError {
    /// An error that occurs when working with a storage backend
    #[error("Storage backend error: {0}")]
    StorageBackend(String),

    /// A transaction lost an optimistic-concurrency race: a row in its read
    /// set was rewritten by a competing transaction before the commit.
    #[error("Transaction conflict: a competing change was committed first")]
    Conflict,

    /// An error that occurs while encoding a record for storage
    #[error("Failed to encode a record: {0}")]
    EncodeFailed(String),

    /// An error that occurs while decoding a stored record
    #[error("Failed to decode a record: {0}")]
    DecodeFailed(String),

    /// The caller's deadline elapsed before the operation completed
    #[error("Operation cancelled before completion")]
    Cancelled,
}
