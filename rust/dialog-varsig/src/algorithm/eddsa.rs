//! Ed25519 signature algorithm.

use super::SignatureAlgorithm;
use crate::signature::Signature;
use signature::SignatureEncoding;

/// Varsig prefix tag for Ed25519 (per the [varsig signature algorithm table]).
///
/// [varsig signature algorithm table]: https://github.com/ChainAgnostic/varsig/blob/main/README.md#signature-algorithm
const EDDSA_TAG: u64 = 0xed;

/// Multicodec tag for SHA2-512, the hash EdDSA signs over internally.
const SHA2_512_TAG: u64 = 0x13;

/// The Ed25519 (EdDSA over Curve25519) signature algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Ed25519;

impl SignatureAlgorithm for Ed25519 {
    fn prefix(&self) -> u64 {
        EDDSA_TAG
    }

    fn config_tags(&self) -> Vec<u64> {
        vec![SHA2_512_TAG]
    }

    fn try_from_tags(tags: &[u64]) -> Option<(Self, &[u64])> {
        match tags {
            [EDDSA_TAG, SHA2_512_TAG, rest @ ..] => Some((Ed25519, rest)),
            _ => None,
        }
    }
}

/// An Ed25519 signature, portable between native (`ed25519_dalek`) and
/// `WebCrypto`-backed signers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Ed25519Signature(#[serde(with = "serde_bytes")] [u8; 64]);

impl Ed25519Signature {
    /// Raw signature bytes.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; 64] {
        self.0
    }
}

impl From<ed25519_dalek::Signature> for Ed25519Signature {
    fn from(sig: ed25519_dalek::Signature) -> Self {
        Self(sig.to_bytes())
    }
}

impl From<Ed25519Signature> for ed25519_dalek::Signature {
    fn from(sig: Ed25519Signature) -> Self {
        ed25519_dalek::Signature::from_bytes(&sig.0)
    }
}

impl TryFrom<&[u8]> for Ed25519Signature {
    type Error = signature::Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; 64] = bytes.try_into().map_err(|_| signature::Error::new())?;
        Ok(Self(array))
    }
}

impl From<Ed25519Signature> for Box<[u8]> {
    fn from(sig: Ed25519Signature) -> Self {
        sig.0.to_vec().into_boxed_slice()
    }
}

impl SignatureEncoding for Ed25519Signature {
    type Repr = Box<[u8]>;
}

impl Signature for Ed25519Signature {
    type Algorithm = Ed25519;
}
