use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{ClaimSet, Timestamp, TokenError};

type HmacSha256 = Hmac<Sha256>;

/// The fixed token header: HMAC-SHA256, JWT container
const HEADER_JSON: &[u8] = br#"{"typ":"JWT","alg":"HS256"}"#;

#[derive(Serialize, Deserialize)]
struct Header {
    typ: String,
    alg: String,
}

fn mac_for(secret: &[u8]) -> Result<HmacSha256, TokenError> {
    HmacSha256::new_from_slice(secret)
        .map_err(|error| TokenError::Serialization(error.to_string()))
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    // Length is not secret; content comparison is constant-time.
    left.len() == right.len() && bool::from(left.ct_eq(right))
}

/// Encode `claims` as a signed bearer token.
///
/// The output is `base64url(header) "." base64url(payload) "."
/// base64url(hmac_sha256(header "." payload))`, all segments unpadded.
/// Reserved claim names are dropped from the private bag before encoding so
/// the payload can never carry a duplicated reserved field.
pub fn encode(claims: &ClaimSet, secret: &[u8]) -> Result<String, TokenError> {
    let mut claims = claims.clone();
    claims.strip_reserved();

    let payload = serde_json::to_vec(&claims)
        .map_err(|error| TokenError::Serialization(error.to_string()))?;

    let mut token = String::new();
    token.push_str(&URL_SAFE_NO_PAD.encode(HEADER_JSON));
    token.push('.');
    token.push_str(&URL_SAFE_NO_PAD.encode(payload));

    let mut mac = mac_for(secret)?;
    mac.update(token.as_bytes());
    let signature = mac.finalize().into_bytes();

    token.push('.');
    token.push_str(&URL_SAFE_NO_PAD.encode(signature));

    Ok(token)
}

/// Verify `token` against `secret` and return its claim set.
///
/// Two special cases are checked first:
///
/// - A token equal to `secret` itself (raw bytes, constant time, no `.`
///   separators) authenticates the Super sentinel. This lets a deploying
///   operator bootstrap access knowing only the shared secret.
/// - The empty token authenticates the Nobody sentinel.
///
/// Every other presented token must be a structurally valid three-segment
/// bearer token with a matching signature and an unexpired claim set. Each
/// failure maps to its own [TokenError] kind; see the crate documentation
/// for the full check order.
pub fn decode(token: &[u8], secret: &[u8]) -> Result<ClaimSet, TokenError> {
    let separator_count = token.iter().filter(|byte| **byte == b'.').count();

    if separator_count == 0 && constant_time_eq(token, secret) {
        return Ok(ClaimSet::super_sentinel());
    }

    if token.is_empty() {
        return Ok(ClaimSet::nobody_sentinel());
    }

    if separator_count != 2 {
        return Err(TokenError::Malformed);
    }

    let mut segments = token.split(|byte| *byte == b'.');
    let header_segment = segments.next().ok_or(TokenError::Malformed)?;
    let payload_segment = segments.next().ok_or(TokenError::Malformed)?;
    let signature_segment = segments.next().ok_or(TokenError::Malformed)?;

    let header_json = URL_SAFE_NO_PAD
        .decode(header_segment)
        .map_err(|_| TokenError::Malformed)?;
    let header: Header =
        serde_json::from_slice(&header_json).map_err(|_| TokenError::Malformed)?;

    if header.alg != "HS256" {
        return Err(TokenError::InvalidAlgorithm);
    }
    if header.typ != "JWT" {
        return Err(TokenError::InvalidHeaderType);
    }

    let their_signature = URL_SAFE_NO_PAD
        .decode(signature_segment)
        .map_err(|_| TokenError::Malformed)?;

    let mut mac = mac_for(secret)?;
    mac.update(header_segment);
    mac.update(b".");
    mac.update(payload_segment);
    mac.verify_slice(&their_signature)
        .map_err(|_| TokenError::BadSignature)?;

    let payload_json = URL_SAFE_NO_PAD
        .decode(payload_segment)
        .map_err(|_| TokenError::Malformed)?;
    let mut claims: ClaimSet =
        serde_json::from_slice(&payload_json).map_err(|_| TokenError::Malformed)?;

    if !claims.exp.is_after(Timestamp::now()) {
        return Err(TokenError::Expired);
    }

    claims.strip_reserved();

    Ok(claims)
}
