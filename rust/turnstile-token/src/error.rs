use thiserror::Error;

/// Errors produced while encoding or verifying bearer tokens.
///
/// Each failure mode is a distinct, stable kind. Telemetry and the transport
/// layer rely on the distinction: an [TokenError::Expired] token should
/// prompt re-authentication, a [TokenError::BadSignature] token should be
/// rejected outright.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token is not structurally a three-segment bearer token, or a
    /// segment failed base64/JSON decoding
    #[error("Not a valid bearer token")]
    Malformed,

    /// The header declares an algorithm other than HS256
    #[error("Algorithm isn't HS256")]
    InvalidAlgorithm,

    /// The header declares a type other than JWT
    #[error("Header isn't type JWT")]
    InvalidHeaderType,

    /// The signature segment does not match the computed MAC
    #[error("Signatures don't match")]
    BadSignature,

    /// The claim set's expiry is not in the future
    #[error("Token has expired")]
    Expired,

    /// The claim set could not be serialized while encoding a token
    #[error("Failed to serialize claims: {0}")]
    Serialization(String),
}
