//! Varsig header, signature trait, and signing/verification re-exports.

pub mod signer;
pub mod verifier;

use super::{Codec, Format, SignatureAlgorithm};
use ::signature::SignatureEncoding;
use dialog_common::{ConditionalSend, ConditionalSync};
use serde::{Deserialize, Serialize};
pub use signer::Signer;
use std::{fmt::Debug, marker::PhantomData};
pub use verifier::Verifier;

/// Cryptographic signature produced by `Signer` and verified by `Verifier`.
pub trait Signature: SignatureEncoding + Debug + ConditionalSend + ConditionalSync {
    /// The signature algorithm that produces this signature type.
    type Algorithm: SignatureAlgorithm + ConditionalSend + ConditionalSync;
}

/// Variable signature configuration that ties signature algorithm
/// to payload encoding, which can be used to sign / verify cryptographic
/// signatures conforming to [varsig] specification.
///
/// [varsig]:https://github.com/ChainAgnostic/varsig/blob/main/README.md
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct Varsig<A: SignatureAlgorithm, C, T> {
    algorithm: A,
    codec: C,
    _data: PhantomData<T>,
}

impl<V: SignatureAlgorithm, C, T> Varsig<V, C, T> {
    /// Create a new Varsig header.
    ///
    /// The signature algorithm is constructed via `Default`.
    ///
    /// ## Parameters
    ///
    /// - `codec`: The codec to use for encoding the payload.
    pub fn new(codec: C) -> Self {
        Varsig {
            algorithm: V::default(),
            codec,
            _data: PhantomData,
        }
    }

    /// Get the [signature algorithm] for this varsig configuration.
    ///
    /// [signature algorithm]: <https://github.com/ChainAgnostic/varsig/blob/main/README.md#signature-algorithm>
    pub const fn algorithm(&self) -> &V {
        &self.algorithm
    }

    /// Get the `Codec` used for [payload encoding] in this varsig configuration.
    ///
    /// [payload encoding]: <https://github.com/ChainAgnostic/varsig/blob/main/README.md#payload-encoding>
    pub const fn codec(&self) -> &C {
        &self.codec
    }

    /// Encode a payload using this header's codec.
    ///
    /// # Errors
    ///
    /// Returns the codec's encoding error if encoding fails.
    pub fn encode(&self, payload: &T) -> Result<Vec<u8>, C::EncodingError>
    where
        C: Codec<T>,
        T: Serialize,
    {
        let mut buffer = Vec::new();
        self.codec.encode_payload(payload, &mut buffer)?;
        Ok(buffer)
    }
}

impl<V: SignatureAlgorithm, C: Format, T> Serialize for Varsig<V, C, T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut bytes = Vec::new();

        // Varsig tag
        leb128::write::unsigned(&mut bytes, 0x34).map_err(|e| {
            serde::ser::Error::custom(format!(
                "unable to varsig prefix tag write into new owned vec: {e}"
            ))
        })?;

        // Version tag
        leb128::write::unsigned(&mut bytes, 0x01).map_err(|e| {
            serde::ser::Error::custom(format!(
                "unable to write varsig version tag into owned vec with one element: {e}"
            ))
        })?;

        // Signature algorithm tag
        leb128::write::unsigned(&mut bytes, self.algorithm.prefix()).map_err(|e| {
            serde::ser::Error::custom(format!(
                "unable to write signature algorithm prefix tag: {e}"
            ))
        })?;

        for segment in &self.algorithm.config_tags() {
            leb128::write::unsigned(&mut bytes, *segment).map_err(|e| {
                serde::ser::Error::custom(format!(
                    "unable to write varsig config segment into owned vec {segment}: {e}",
                ))
            })?;
        }

        // Codec tag
        leb128::write::unsigned(&mut bytes, self.codec.multicodec_code()).map_err(|e| {
            serde::ser::Error::custom(format!(
                "unable to write varsig version tag into owned vec with one element: {e}"
            ))
        })?;

        serializer.serialize_bytes(&bytes)
    }
}

impl<'de, V: SignatureAlgorithm, C: Format, T> Deserialize<'de> for Varsig<V, C, T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes: serde_bytes::ByteBuf =
            serde::Deserialize::deserialize(deserializer).map_err(|e| {
                serde::de::Error::custom(format!("unable to deserialize varsig header: {e}"))
            })?;

        let mut cursor = std::io::Cursor::new(bytes.as_slice());
        let len = bytes.len() as u64;

        let varsig_tag = leb128::read::unsigned(&mut cursor).map_err(|e| {
            serde::de::Error::custom(format!("unable to read leb128 unsigned: {e}"))
        })?;
        if varsig_tag != 0x34 {
            return Err(serde::de::Error::custom(format!(
                "expected varsig tag 0x34, found {varsig_tag:#x}"
            )));
        }

        let version_tag = leb128::read::unsigned(&mut cursor).map_err(|e| {
            serde::de::Error::custom(format!("unable to read leb128 unsigned: {e}"))
        })?;
        if version_tag != 0x01 {
            return Err(serde::de::Error::custom(format!(
                "expected varsig version tag 0x01, found {version_tag:#x}"
            )));
        }

        let mut remaining = Vec::new();
        while cursor.position() < len {
            let seg = leb128::read::unsigned(&mut cursor).map_err(|e| {
                serde::de::Error::custom(format!("unable to read leb128 unsigned segment: {e}"))
            })?;
            remaining.push(seg);
        }

        let (algorithm, more) = V::try_from_tags(remaining.as_slice()).ok_or_else(|| {
            serde::de::Error::custom("unable to create signature algorithm from tags")
        })?;
        let codec = C::try_from_tags(more)
            .ok_or_else(|| serde::de::Error::custom("unable to create codec from tags"))?;

        Ok(Varsig {
            algorithm,
            codec,
            _data: std::marker::PhantomData,
        })
    }
}
