//! Content addressing for DAG-CBOR-encoded values.
//!
//! Every [`Block`][crate::block::Block], [`Delegation`][crate::delegation::Delegation]
//! and archive descriptor is addressed the same way: SHA2-256 over the
//! canonical DAG-CBOR bytes, wrapped as a CIDv1 tagged with the DAG-CBOR
//! multicodec.

use ipld_core::{
    cid::{Cid, multihash::Multihash},
    ipld::Ipld,
};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Multicodec code for DAG-CBOR (`0x71`).
pub const DAG_CBOR_CODE: u64 = 0x71;

/// Multihash code for SHA2-256 (`0x12`).
pub const SHA2_256_CODE: u64 = 0x12;

/// Content-address a value by its canonical DAG-CBOR encoding.
///
/// # Panics
///
/// Panics if `value` cannot be encoded as DAG-CBOR. Every payload type in
/// this crate implements `Serialize` in a way that always succeeds.
#[must_use]
pub fn to_dagcbor_cid<T: Serialize>(value: &T) -> Cid {
    let bytes = serde_ipld_dagcbor::to_vec(value).expect("value encodes to DAG-CBOR");
    cid_for_dagcbor_bytes(&bytes)
}

/// Content-address already-encoded DAG-CBOR bytes.
#[must_use]
pub fn cid_for_dagcbor_bytes(bytes: &[u8]) -> Cid {
    let digest = Sha256::digest(bytes);
    let multihash =
        Multihash::wrap(SHA2_256_CODE, digest.as_slice()).expect("sha2-256 digest fits multihash");
    Cid::new_v1(DAG_CBOR_CODE, multihash)
}

/// Runtime discriminant distinguishing an unresolved [`Ipld::Link`] from any
/// other IPLD value.
#[must_use]
pub const fn is_link(ipld: &Ipld) -> bool {
    matches!(ipld, Ipld::Link(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_produce_the_same_cid() {
        let a = to_dagcbor_cid(&"hello");
        let b = to_dagcbor_cid(&"hello");
        assert_eq!(a, b);
    }

    #[test]
    fn different_bytes_produce_different_cids() {
        let a = to_dagcbor_cid(&"hello");
        let b = to_dagcbor_cid(&"goodbye");
        assert_ne!(a, b);
    }

    #[test]
    fn cid_tags_dag_cbor_and_sha2_256() {
        let cid = to_dagcbor_cid(&"hello");
        assert_eq!(cid.codec(), DAG_CBOR_CODE);
        assert_eq!(cid.hash().code(), SHA2_256_CODE);
    }

    #[test]
    fn is_link_discriminates_ipld_link() {
        let cid = to_dagcbor_cid(&"hello");
        assert!(is_link(&Ipld::Link(cid)));
        assert!(!is_link(&Ipld::Null));
    }
}
