use thiserror::Error;

use turnstile_storage::TurnstileStorageError;

/// Errors produced by account operations
#[derive(Error, Debug)]
pub enum AccountError {
    /// An account already occupies the identity key
    #[error("An account with that identity already exists")]
    AlreadyExists,

    /// No account exists at the identity key
    #[error("No account exists for that identity")]
    NotFound,

    /// A competing change to the account was committed first
    #[error("A competing change to the account has already been made")]
    Conflict,

    /// The instance is not saveable: it was hand-built rather than loaded
    /// through the store, or its identity no longer matches the key it was
    /// loaded under
    #[error("This account cannot be saved")]
    Unsaveable,

    /// The supplied secret is below the minimum length
    #[error("Password is too short")]
    PasswordTooShort,

    /// The supplied secret does not match the stored credential hash
    #[error("Credential verification failed")]
    BadCredential,

    /// The underlying storage substrate failed
    #[error(transparent)]
    Storage(#[from] TurnstileStorageError),
}
