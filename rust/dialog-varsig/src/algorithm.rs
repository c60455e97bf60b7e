//! Signature algorithm identity for Varsig headers.

pub mod eddsa;

use std::fmt::Debug;

/// A signature algorithm identifiable by its varsig tag sequence.
///
/// The header encodes an algorithm as a leading multicodec-style prefix
/// tag followed by zero or more configuration tags (e.g. the hash
/// function used). `try_from_tags` is the inverse of `prefix` +
/// `config_tags` and returns the unconsumed remainder so the caller
/// (the `Codec` tag) can keep parsing.
pub trait SignatureAlgorithm: Default + Clone + Copy + PartialEq + Debug {
    /// Leading tag identifying this algorithm family.
    fn prefix(&self) -> u64;

    /// Additional configuration tags (e.g. hash function) following the prefix.
    fn config_tags(&self) -> Vec<u64>;

    /// Parse an algorithm and its configuration from a tag sequence,
    /// returning the algorithm plus the remaining unconsumed tags.
    fn try_from_tags(tags: &[u64]) -> Option<(Self, &[u64])>;
}
