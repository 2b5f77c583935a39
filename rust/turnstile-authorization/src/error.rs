use serde::Serialize;
use thiserror::Error;

use turnstile_ledger::LedgerError;
use turnstile_token::TokenError;

/// The terminal error of an authorization decision.
///
/// Every way a request can be denied has its own kind; the transport layer
/// maps each to a stable [ErrorCode]. Denials never leak internal state:
/// messages name the failing rule, not stored credentials or other
/// principals' keys.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessError {
    /// The presented bearer token failed verification
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The token's use budget is exhausted
    #[error("Token has been used up")]
    UsedUp,

    /// The token declares a use budget but no token id
    #[error("Token declares a use budget but no token id")]
    InvalidConsumableToken,

    /// The token's subject could not be resolved to an account
    #[error("Could not retrieve the account for this request: {0}")]
    CannotRetrieveAccount(String),

    /// No claim set reached the authorization layer; the request context
    /// was never wired through authentication
    #[error("Could not retrieve the claim set for this request: {0}")]
    CannotRetrieveClaimSet(String),

    /// The account does not hold the required role
    #[error("Account does not have the required role")]
    RoleMissing,

    /// The account holds the role, but this token's scope does not extend
    /// to it
    #[error("Role is not in the token's scope")]
    RoleNotInScope,

    /// The account is not the principal the route addresses
    #[error("Account does not match the requested resource")]
    IdMismatch,

    /// Denied with no more specific rule; the terminal error of a
    /// superuser-only check
    #[error("You do not have permission to access this resource")]
    Forbidden,

    /// The storage substrate failed while evaluating the request
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl From<LedgerError> for AccessError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::UsedUp => AccessError::UsedUp,
            LedgerError::InvalidConsumableToken => AccessError::InvalidConsumableToken,
            LedgerError::BadShardCount => AccessError::Storage(error.to_string()),
            LedgerError::Storage(storage) => AccessError::Storage(storage.to_string()),
        }
    }
}

impl AccessError {
    /// The stable code the transport layer serializes for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AccessError::Token(TokenError::Malformed) => ErrorCode::MalformedToken,
            AccessError::Token(TokenError::InvalidAlgorithm) => ErrorCode::InvalidAlgorithm,
            AccessError::Token(TokenError::InvalidHeaderType) => ErrorCode::InvalidHeaderType,
            AccessError::Token(TokenError::BadSignature) => ErrorCode::BadSignature,
            AccessError::Token(TokenError::Expired) => ErrorCode::TokenExpired,
            AccessError::Token(TokenError::Serialization(_)) => ErrorCode::InternalError,
            AccessError::UsedUp => ErrorCode::TokenUsedUp,
            AccessError::InvalidConsumableToken => ErrorCode::InvalidConsumableToken,
            AccessError::CannotRetrieveAccount(_) => ErrorCode::CannotRetrieveAccount,
            AccessError::CannotRetrieveClaimSet(_) => ErrorCode::CannotRetrieveClaimSet,
            AccessError::RoleMissing => ErrorCode::RoleMissing,
            AccessError::RoleNotInScope => ErrorCode::RoleNotInScope,
            AccessError::IdMismatch => ErrorCode::IdMismatch,
            AccessError::Forbidden => ErrorCode::Forbidden,
            AccessError::Storage(_) => ErrorCode::InternalError,
        }
    }
}

/// Stable error codes for access denials.
///
/// These codes are the contract with the transport collaborator: each maps
/// to an HTTP status via [ErrorCode::status_code], and the set only ever
/// grows. Telemetry keys on them to tell re-authenticate-and-retry failures
/// (expired tokens) from reject-outright failures (forged signatures).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // 400 Bad Request - the token cannot be processed at all
    /// The token is not structurally a bearer token
    MalformedToken,
    /// The token declares a use budget but no token id
    InvalidConsumableToken,

    // 401 Unauthorized - authentication failed
    /// The header declares an unsupported algorithm
    InvalidAlgorithm,
    /// The header declares an unsupported container type
    InvalidHeaderType,
    /// The signature does not match the computed MAC
    BadSignature,
    /// The claim set has expired
    TokenExpired,
    /// The token's subject has no account
    CannotRetrieveAccount,
    /// No claim set was wired into the request context
    CannotRetrieveClaimSet,

    // 403 Forbidden - authenticated, but denied
    /// The token's use budget is exhausted
    TokenUsedUp,
    /// The account does not hold the required role
    RoleMissing,
    /// The token's scope does not extend to the required role
    RoleNotInScope,
    /// The account is not the principal the route addresses
    IdMismatch,
    /// Denied by a superuser-only rule
    Forbidden,

    // 500 Internal Server Error
    /// The trust layer itself failed
    InternalError,
}

impl ErrorCode {
    /// The HTTP status the transport layer responds with for this code
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCode::MalformedToken | ErrorCode::InvalidConsumableToken => 400,

            ErrorCode::InvalidAlgorithm
            | ErrorCode::InvalidHeaderType
            | ErrorCode::BadSignature
            | ErrorCode::TokenExpired
            | ErrorCode::CannotRetrieveAccount
            | ErrorCode::CannotRetrieveClaimSet => 401,

            ErrorCode::TokenUsedUp
            | ErrorCode::RoleMissing
            | ErrorCode::RoleNotInScope
            | ErrorCode::IdMismatch
            | ErrorCode::Forbidden => 403,

            ErrorCode::InternalError => 500,
        }
    }
}

/// The serializable body of a denial response: a stable code plus a
/// human-readable message that never leaks internal state.
#[derive(Debug, Clone, Serialize)]
pub struct Denial {
    /// The stable error code
    pub code: ErrorCode,
    /// Human-readable description of the denial
    pub message: String,
}

impl From<&AccessError> for Denial {
    fn from(error: &AccessError) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
        }
    }
}
