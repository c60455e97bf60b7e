//! DAG-CBOR codec for Varsig-enveloped payloads.

use dialog_varsig::{Codec, Format};
use serde::{Serialize, de::DeserializeOwned};
use std::io::{BufRead, Write};

/// Multicodec code for DAG-CBOR.
pub const DAG_CBOR_CODE: u64 = 0x71;

/// The DAG-CBOR codec, as required by every token and archive wire format
/// in this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CborCodec;

impl Format for CborCodec {
    fn multicodec_code(&self) -> u64 {
        DAG_CBOR_CODE
    }

    fn try_from_tags(code: &[u64]) -> Option<Self> {
        match code {
            [DAG_CBOR_CODE, ..] => Some(CborCodec),
            _ => None,
        }
    }
}

impl<T: Serialize + DeserializeOwned> Codec<T> for CborCodec {
    type EncodingError = serde_ipld_dagcbor::EncodeError<std::collections::TryReserveError>;
    type DecodingError = serde_ipld_dagcbor::DecodeError<std::io::Error>;

    fn encode_payload<W: Write>(
        &self,
        payload: &T,
        buffer: &mut W,
    ) -> Result<(), Self::EncodingError> {
        serde_ipld_dagcbor::to_writer(buffer, payload)
    }

    fn decode_payload<R: BufRead>(&self, reader: &mut R) -> Result<T, Self::DecodingError> {
        serde_ipld_dagcbor::from_reader(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_tags() {
        let codec = CborCodec;
        assert_eq!(codec.multicodec_code(), DAG_CBOR_CODE);
        assert_eq!(CborCodec::try_from_tags(&[DAG_CBOR_CODE]), Some(CborCodec));
        assert_eq!(CborCodec::try_from_tags(&[0x55]), None);
    }

    #[test]
    fn encodes_and_decodes_a_payload() {
        let codec = CborCodec;
        let mut buf = Vec::new();
        codec.encode_payload(&"hello".to_string(), &mut buf).unwrap();
        let decoded: String = codec.decode_payload(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, "hello");
    }
}
