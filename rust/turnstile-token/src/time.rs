use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Seconds in ten years, the lifetime granted to sentinel claim sets.
const TEN_YEARS_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

/// A point in time expressed as whole seconds since the Unix epoch.
///
/// This is the only representation of time that crosses the wire: token
/// expiries are absolute Unix seconds, and comparisons are plain integer
/// comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The current time, truncated to whole seconds
    pub fn now() -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as i64)
            .unwrap_or(0);
        Self(seconds)
    }

    /// Construct from raw Unix seconds
    pub fn from_unix(seconds: i64) -> Self {
        Self(seconds)
    }

    /// A point `seconds` from now
    pub fn seconds_from_now(seconds: i64) -> Self {
        Self(Self::now().0 + seconds)
    }

    /// The far-future expiry used by sentinel claim sets
    pub fn far_future() -> Self {
        Self::seconds_from_now(TEN_YEARS_SECONDS)
    }

    /// The raw Unix-seconds value
    pub fn unix(&self) -> i64 {
        self.0
    }

    /// Whether this point is strictly after `other`
    pub fn is_after(&self, other: Timestamp) -> bool {
        self.0 > other.0
    }
}
