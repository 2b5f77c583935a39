use std::fmt::{self, Display, Formatter};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// How external identities map onto storage keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyDerivation {
    /// Hash the identity into a fixed-width, URL-safe key. The default:
    /// identities never leak into row keys and every key has the same shape.
    #[default]
    Hashed,
    /// Use the identity string verbatim as the key
    Verbatim,
}

/// The storage identity of a principal.
///
/// Keys are derived deterministically from an external identity (typically
/// an email address) so the same identity always resolves to the same row.
/// In [KeyDerivation::Hashed] mode the key is the first 128 bits of the
/// identity's SHA-256 digest, base64url unpadded — fixed-width and
/// collision-resistant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountKey(String);

impl AccountKey {
    /// Derive the key for `identity` under the given derivation mode
    pub fn derive(identity: &str, derivation: KeyDerivation) -> Self {
        match derivation {
            KeyDerivation::Verbatim => Self(identity.to_owned()),
            KeyDerivation::Hashed => {
                let digest = Sha256::digest(identity.as_bytes());
                Self(URL_SAFE_NO_PAD.encode(&digest[..16]))
            }
        }
    }

    /// Wrap an already-derived key, e.g. one presented as a token subject
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AccountKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
