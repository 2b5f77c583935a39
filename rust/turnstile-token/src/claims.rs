use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::Timestamp;

/// The wire marker for the Super sentinel subject
pub const SUPER_SUBJECT: &str = "_super";

/// The wire marker for the Nobody sentinel subject
pub const NOBODY_SUBJECT: &str = "_nobody";

/// The scope entry meaning "every role the subject holds"
pub const ALL_SCOPE: &str = "*";

/// Claim names with reserved meanings. These are stripped out of the
/// private-claims bag whenever a claim set is decoded or encoded, so
/// application code can never read a forged reserved field from the private
/// area.
const RESERVED_CLAIMS: [&str; 6] = ["sub", "iat", "exp", "aud", "scope", "iss"];

/// The subject of a claim set: either a stored principal's identity key or
/// one of the two sentinel principals.
///
/// Sentinels are a tagged variant rather than magic key values so that
/// dispatch never depends on string comparison against somebody's actual
/// identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// The superuser sentinel, authenticated by the deployment secret
    Super,
    /// The unauthenticated sentinel
    Nobody,
    /// The identity key of a stored principal
    Key(String),
}

impl Subject {
    /// The wire representation of this subject
    pub fn as_str(&self) -> &str {
        match self {
            Subject::Super => SUPER_SUBJECT,
            Subject::Nobody => NOBODY_SUBJECT,
            Subject::Key(key) => key,
        }
    }
}

impl Display for Subject {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Subject {
    fn from(value: &str) -> Self {
        match value {
            SUPER_SUBJECT => Subject::Super,
            NOBODY_SUBJECT => Subject::Nobody,
            key => Subject::Key(key.to_owned()),
        }
    }
}

impl Serialize for Subject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Subject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Subject::from(raw.as_str()))
    }
}

/// The set of capabilities a specific token may exercise, independent of the
/// subject's full role set.
///
/// On the wire a scope is a single comma-joined string, not a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope(std::collections::BTreeSet<String>);

impl Scope {
    /// A scope over the given entries
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(entries.into_iter().map(Into::into).collect())
    }

    /// The wildcard scope: every role the subject holds
    pub fn all() -> Self {
        Self::new([ALL_SCOPE])
    }

    /// Whether the scope has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the scope names `entry` verbatim
    pub fn contains(&self, entry: &str) -> bool {
        self.0.contains(entry)
    }

    /// Whether the scope permits exercising `role`, either by naming it or
    /// via the wildcard entry
    pub fn permits(&self, role: &str) -> bool {
        self.0.contains(role) || self.0.contains(ALL_SCOPE)
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let joined = self.0.iter().cloned().collect::<Vec<_>>().join(",");
        serializer.serialize_str(&joined)
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Scope(
            raw.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_owned)
                .collect(),
        ))
    }
}

/// The decoded payload of a bearer token.
///
/// A claim set is never persisted; consumption state for budget-limited
/// tokens lives in the ledger, keyed by the token id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// The subject this token speaks for
    pub sub: Subject,

    /// Absolute expiry, Unix seconds; a token is valid strictly before this
    pub exp: Timestamp,

    /// The capabilities this specific token may exercise
    #[serde(default, skip_serializing_if = "Scope::is_empty")]
    pub scope: Scope,

    /// Free-form private claims, including the optional token id (`jti`) and
    /// maximum-use budget (`u`)
    #[serde(flatten)]
    private: BTreeMap<String, Value>,
}

impl ClaimSet {
    /// A claim set for `sub` expiring at `exp`
    pub fn new(sub: Subject, exp: Timestamp) -> Self {
        Self {
            sub,
            exp,
            scope: Scope::default(),
            private: BTreeMap::new(),
        }
    }

    /// The claim set presented by a holder of the deployment secret itself
    pub fn super_sentinel() -> Self {
        Self::new(Subject::Super, Timestamp::far_future())
    }

    /// The claim set presented by an unauthenticated caller
    pub fn nobody_sentinel() -> Self {
        Self::new(Subject::Nobody, Timestamp::far_future())
    }

    /// Replace the scope
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Attach a unique token id (`jti`)
    pub fn with_token_id(mut self, token_id: impl Into<String>) -> Self {
        self.private
            .insert("jti".to_owned(), Value::String(token_id.into()));
        self
    }

    /// Attach a maximum-use budget (`u`). A budget without a token id is
    /// rejected by the ledger, not here.
    pub fn with_max_uses(mut self, max_uses: i64) -> Self {
        self.private.insert("u".to_owned(), Value::from(max_uses));
        self
    }

    /// Set a free-form private claim
    pub fn set_private(&mut self, name: impl Into<String>, value: Value) {
        self.private.insert(name.into(), value);
    }

    /// The unique token id, if this token carries one
    pub fn token_id(&self) -> Option<&str> {
        self.private.get("jti").and_then(Value::as_str)
    }

    /// The maximum-use budget, if this token declares one
    pub fn max_uses(&self) -> Option<i64> {
        self.private.get("u").and_then(Value::as_i64)
    }

    /// The free-form private claims
    pub fn private(&self) -> &BTreeMap<String, Value> {
        &self.private
    }

    /// Remove reserved claim names from the private bag
    pub(crate) fn strip_reserved(&mut self) {
        for name in RESERVED_CLAIMS {
            self.private.remove(name);
        }
    }
}
