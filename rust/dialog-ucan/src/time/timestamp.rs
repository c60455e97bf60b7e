//! Seconds-since-epoch timestamps used for `exp`/`nbf`.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::error::TimestampRangeError;

/// A UCAN timestamp: whole seconds since the Unix epoch.
///
/// Wire-encoded as a plain unsigned integer, matching every `exp`/`nbf`
/// field in the UCAN IPLD schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Wrap a raw Unix-seconds value.
    #[must_use]
    pub const fn from_unix(seconds: u64) -> Self {
        Self(seconds)
    }

    /// The wrapped Unix-seconds value.
    #[must_use]
    pub const fn to_unix(self) -> u64 {
        self.0
    }

    /// The current time, truncated to whole seconds.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampRangeError`] if the system clock is set before
    /// the Unix epoch.
    pub fn now() -> Result<Self, TimestampRangeError> {
        Self::try_from(dialog_common::time::now())
    }
}

impl TryFrom<SystemTime> for Timestamp {
    type Error = TimestampRangeError;

    fn try_from(time: SystemTime) -> Result<Self, Self::Error> {
        let duration = time
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TimestampRangeError::BeforeEpoch)?;
        Ok(Self(duration.as_secs()))
    }
}

impl From<Timestamp> for SystemTime {
    fn from(timestamp: Timestamp) -> Self {
        UNIX_EPOCH + Duration::from_secs(timestamp.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_unix_seconds() {
        let ts = Timestamp::from_unix(1_700_000_000);
        assert_eq!(ts.to_unix(), 1_700_000_000);
    }

    #[test]
    fn orders_by_value() {
        assert!(Timestamp::from_unix(1) < Timestamp::from_unix(2));
    }

    #[test]
    fn rejects_times_before_the_epoch() {
        let before = UNIX_EPOCH - Duration::from_secs(1);
        assert!(Timestamp::try_from(before).is_err());
    }
}
