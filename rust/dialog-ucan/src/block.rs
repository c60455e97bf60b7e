//! Content-addressed byte blocks.

use crate::cid::cid_for_dagcbor_bytes;
use ipld_core::cid::Cid;
use serde::Serialize;

/// A content-addressed sequence of DAG-CBOR bytes.
///
/// Equality and hashing are over [`Block::cid`] alone.
#[derive(Debug, Clone)]
pub struct Block {
    cid: Cid,
    bytes: Vec<u8>,
}

impl Block {
    /// Wrap already-encoded DAG-CBOR bytes, computing their CID.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        let cid = cid_for_dagcbor_bytes(&bytes);
        Self { cid, bytes }
    }

    /// Encode `value` to DAG-CBOR and wrap the result as a block.
    ///
    /// # Errors
    ///
    /// Returns the DAG-CBOR encoder's error if `value` fails to encode.
    pub fn encode<T: Serialize>(
        value: &T,
    ) -> Result<Self, serde_ipld_dagcbor::EncodeError<std::collections::TryReserveError>> {
        let bytes = serde_ipld_dagcbor::to_vec(value)?;
        Ok(Self::new(bytes))
    }

    /// Wrap bytes with a CID already known to be correct (e.g. read back from
    /// an archive whose framing already validated the hash).
    #[must_use]
    pub const fn from_parts(cid: Cid, bytes: Vec<u8>) -> Self {
        Self { cid, bytes }
    }

    /// This block's content address.
    #[must_use]
    pub const fn cid(&self) -> &Cid {
        &self.cid
    }

    /// This block's raw bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether `bytes` actually hashes to `cid` under the DAG-CBOR/SHA2-256
    /// scheme this crate uses.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        cid_for_dagcbor_bytes(&self.bytes) == self.cid
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.cid == other.cid
    }
}

impl Eq for Block {}

impl std::hash::Hash for Block {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.cid.hash(state);
    }
}
