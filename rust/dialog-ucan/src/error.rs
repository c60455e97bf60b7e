//! Error types for token decoding and archive encoding.
//!
//! These are the codec-level failures a caller can hit before a
//! [`Delegation`][crate::delegation::Delegation] ever reaches the
//! proof-chain validator in `dialog-capability`. Rejections that depend
//! on *other* delegations (audience mismatch, expired proof, unsatisfied
//! capability) live there instead, in `CapabilityError`.

/// Failure to decode a DAG-CBOR token envelope into a [`Delegation`][crate::delegation::Delegation].
#[derive(Debug, thiserror::Error)]
pub enum TokenDecodeError {
    /// The DAG-CBOR bytes did not parse as an envelope.
    #[error("malformed token envelope: {0}")]
    Malformed(#[from] serde_ipld_dagcbor::DecodeError<std::io::Error>),

    /// The envelope's signature bytes did not match the expected signature type.
    #[error("invalid signature encoding: {0}")]
    InvalidSignature(#[source] signature::Error),
}

/// Failure to produce or consume a CARv1-like archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The archive's descriptor block was missing or did not name a root CID.
    #[error("missing or malformed archive descriptor")]
    MissingDescriptor,

    /// The container did not name exactly one root.
    #[error("archive must have exactly one root, found {0}")]
    WrongRootCount(usize),

    /// The descriptor's variant key did not name a supported spec/version.
    #[error("unsupported archive descriptor tag: {0}")]
    UnsupportedTag(String),

    /// A root CID named by the descriptor has no matching block in the archive.
    #[error("root {0} not present among archive blocks")]
    MissingRoot(ipld_core::cid::Cid),

    /// A varint length prefix ran past the end of the archive bytes.
    #[error("truncated archive: {0}")]
    Truncated(#[from] std::io::Error),

    /// A block's declared CID did not match the hash of its bytes.
    #[error("block content does not match its CID: {0}")]
    HashMismatch(ipld_core::cid::Cid),

    /// The descriptor or a block failed to DAG-CBOR encode/decode.
    #[error("archive codec error: {0}")]
    Codec(#[from] serde_ipld_dagcbor::DecodeError<std::io::Error>),
}
