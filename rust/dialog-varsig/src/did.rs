//! `did:key` decentralized identifiers.

use base58::{FromBase58, ToBase58};
use std::{fmt, str::FromStr};

/// Multicodec tag for an Ed25519 public key (`ed25519-pub`).
const ED25519_PUB_TAG: u64 = 0xed;

/// A decentralized identifier, represented in `did:key` form.
///
/// The core treats a `Did` as opaque beyond equality and string
/// conversion; key material is recovered only by the signer/verifier
/// implementations that know their own algorithm (see
/// [`dialog_credentials::ed25519`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Did(String);

/// Errors parsing a `did:key` string.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DidParseError {
    /// Missing the `did:key:` prefix.
    #[error("not a did:key URI: {0}")]
    MissingPrefix(String),

    /// The multibase/base58btc payload failed to decode.
    #[error("invalid base58btc payload: {0}")]
    InvalidBase58(String),

    /// The multicodec varint prefix was truncated or malformed.
    #[error("truncated multicodec prefix")]
    TruncatedPrefix,
}

impl Did {
    /// Wrap an already-formatted `did:key:z...` string without validation.
    #[must_use]
    pub fn new_unchecked(did: String) -> Self {
        Self(did)
    }

    /// Borrow the underlying `did:key:z...` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build a `did:key` from a raw Ed25519 public key.
    #[must_use]
    pub fn from_ed25519_public_key(public_key: &[u8; 32]) -> Self {
        let mut buf = Vec::with_capacity(2 + 32);
        leb128::write::unsigned(&mut buf, ED25519_PUB_TAG).expect("write to Vec never fails");
        buf.extend_from_slice(public_key);
        Self(format!("did:key:z{}", buf.to_base58()))
    }

    /// Recover the raw Ed25519 public key, if this DID encodes one.
    ///
    /// # Errors
    ///
    /// Returns [`DidParseError`] if the DID is not `did:key`, the base58btc
    /// payload is invalid, or the multicodec tag is not `ed25519-pub`.
    pub fn to_ed25519_public_key(&self) -> Result<[u8; 32], DidParseError> {
        let rest = self
            .0
            .strip_prefix("did:key:z")
            .ok_or_else(|| DidParseError::MissingPrefix(self.0.clone()))?;
        let bytes = rest
            .from_base58()
            .map_err(|_| DidParseError::InvalidBase58(rest.to_string()))?;
        let mut cursor = std::io::Cursor::new(bytes.as_slice());
        let tag =
            leb128::read::unsigned(&mut cursor).map_err(|_| DidParseError::TruncatedPrefix)?;
        if tag != ED25519_PUB_TAG {
            return Err(DidParseError::MissingPrefix(self.0.clone()));
        }
        let key_start = cursor.position() as usize;
        bytes[key_start..]
            .try_into()
            .map_err(|_| DidParseError::TruncatedPrefix)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Did {
    type Err = DidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with("did:") {
            return Err(DidParseError::MissingPrefix(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl serde::Serialize for Did {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Did {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ed25519_did_round_trips() {
        let key = [7u8; 32];
        let did = Did::from_ed25519_public_key(&key);
        assert!(did.to_string().starts_with("did:key:z"));
        assert_eq!(did.to_ed25519_public_key().unwrap(), key);
    }

    #[test]
    fn string_round_trip_via_display_and_from_str() {
        let did = Did::from_ed25519_public_key(&[9u8; 32]);
        let reparsed: Did = did.to_string().parse().unwrap();
        assert_eq!(did, reparsed);
    }

    #[test]
    fn rejects_non_did_strings() {
        assert!("not-a-did".parse::<Did>().is_err());
    }
}
