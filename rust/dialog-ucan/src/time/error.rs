//! Errors constructing a [`Timestamp`][super::Timestamp].

/// A [`SystemTime`][std::time::SystemTime] could not be represented as a
/// [`Timestamp`][super::Timestamp].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimestampRangeError {
    /// The time is earlier than the Unix epoch.
    #[error("timestamp is before the Unix epoch")]
    BeforeEpoch,
}
