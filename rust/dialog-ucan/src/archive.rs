//! CARv1-like archive container.
//!
//! Packs a [`Delegation`][crate::delegation::Delegation] and every block it
//! can reach into a single byte stream: a DAG-CBOR header naming the
//! roots, followed by each block as `<varint length><CID bytes><data>`.

use crate::{
    block::Block,
    delegation::{Delegation, store::BlockStore},
    envelope::payload_tag::PayloadTag,
    error::ArchiveError,
};
use dialog_varsig::Signature;
use ipld_core::{cid::Cid, ipld::Ipld};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    io::{Read, Write},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArchiveHeader {
    version: u8,
    roots: Vec<Cid>,
}

/// A delegation plus every block reachable from it, packaged for wire
/// transport.
#[derive(Debug, Clone)]
pub struct Archive {
    /// The single descriptor-block root ("roots = [descriptor]").
    pub roots: Vec<Cid>,
    /// Every block in the container, including the descriptor block.
    pub blocks: Vec<Block>,
}

impl Archive {
    /// Walk `delegation`'s reachable blocks and package them with a
    /// version-tagged descriptor root.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::TokenDecodeError`] if walking the
    /// delegation's blocks fails.
    pub fn produce<S>(delegation: &Delegation<S>) -> Result<Self, crate::error::TokenDecodeError>
    where
        S: Signature + for<'de> Deserialize<'de>,
    {
        let mut blocks = delegation.iterate_blocks()?;

        let mut descriptor: BTreeMap<String, Ipld> = BTreeMap::new();
        descriptor.insert(
            crate::delegation::DelegationPayload::tag(),
            Ipld::Link(delegation.cid()),
        );
        let descriptor_block =
            Block::encode(&descriptor).expect("archive descriptor encodes to DAG-CBOR");
        let root = *descriptor_block.cid();
        blocks.push(descriptor_block);

        Ok(Self {
            roots: vec![root],
            blocks,
        })
    }

    /// Resolve this archive's root back into a [`Delegation`] view, with
    /// every other block loaded into `store`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] if the root is missing, the descriptor is
    /// malformed or names an unsupported tag, or a block's bytes don't
    /// hash to its declared CID.
    pub fn into_delegation<S>(self) -> Result<Delegation<S>, ArchiveError>
    where
        S: Signature + for<'de> Deserialize<'de>,
    {
        if self.roots.len() != 1 {
            return Err(ArchiveError::WrongRootCount(self.roots.len()));
        }
        let descriptor_cid = self.roots[0];

        let store = BlockStore::new();
        let mut descriptor_bytes: Option<Vec<u8>> = None;
        for block in self.blocks {
            if !block.is_valid() {
                return Err(ArchiveError::HashMismatch(*block.cid()));
            }
            if *block.cid() == descriptor_cid {
                descriptor_bytes = Some(block.bytes().to_vec());
            } else {
                store.insert(block);
            }
        }

        let descriptor_bytes = descriptor_bytes.ok_or(ArchiveError::MissingDescriptor)?;
        let descriptor: BTreeMap<String, Ipld> =
            serde_ipld_dagcbor::from_reader(descriptor_bytes.as_slice())?;

        let expected_tag = crate::delegation::DelegationPayload::tag();
        let root_link = descriptor
            .get(&expected_tag)
            .ok_or_else(|| ArchiveError::UnsupportedTag(expected_tag.clone()))
            .and_then(|value| match value {
                Ipld::Link(cid) => Ok(*cid),
                _ => Err(ArchiveError::MissingDescriptor),
            })?;

        let root_block = store
            .get(&root_link)
            .ok_or(ArchiveError::MissingRoot(root_link))?;

        Delegation::view(root_block.bytes(), store).map_err(|error| match error {
            crate::error::TokenDecodeError::Malformed(decode_error) => {
                ArchiveError::Codec(decode_error)
            }
            crate::error::TokenDecodeError::InvalidSignature(_) => {
                ArchiveError::MissingDescriptor
            }
        })
    }

    /// Serialize this archive to its CARv1-like byte form.
    ///
    /// # Panics
    ///
    /// Panics if the header fails to DAG-CBOR encode, which does not
    /// happen for the header shape this type produces.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();

        let header = ArchiveHeader {
            version: 1,
            roots: self.roots.clone(),
        };
        let header_bytes =
            serde_ipld_dagcbor::to_vec(&header).expect("archive header encodes to DAG-CBOR");
        write_framed(&mut out, &header_bytes);

        for block in &self.blocks {
            let mut framed = block.cid().to_bytes();
            framed.extend_from_slice(block.bytes());
            write_framed(&mut out, &framed);
        }

        out
    }

    /// Parse a CARv1-like byte stream back into an [`Archive`].
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] if the byte stream is truncated or a
    /// frame's CID prefix fails to parse.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let mut cursor = bytes;

        let header_bytes = read_framed(&mut cursor)?;
        let header: ArchiveHeader = serde_ipld_dagcbor::from_reader(header_bytes.as_slice())?;

        let mut blocks = Vec::new();
        while !cursor.is_empty() {
            let frame = read_framed(&mut cursor)?;
            let (cid, len) = Cid::read_bytes(frame.as_slice())
                .map_err(|_| ArchiveError::MissingDescriptor)?;
            let data = frame[len..].to_vec();
            blocks.push(Block::from_parts(cid, data));
        }

        Ok(Self {
            roots: header.roots,
            blocks,
        })
    }
}

fn write_framed(out: &mut Vec<u8>, frame: &[u8]) {
    leb128::write::unsigned(out, frame.len() as u64).expect("writing to a Vec never fails");
    out.extend_from_slice(frame);
}

fn read_framed(cursor: &mut &[u8]) -> Result<Vec<u8>, ArchiveError> {
    let len = leb128::read::unsigned(cursor)
        .map_err(|_| ArchiveError::Truncated(std::io::Error::from(std::io::ErrorKind::UnexpectedEof)))?
        as usize;
    if cursor.len() < len {
        return Err(ArchiveError::Truncated(std::io::Error::from(
            std::io::ErrorKind::UnexpectedEof,
        )));
    }
    let (frame, rest) = cursor.split_at(len);
    *cursor = rest;
    Ok(frame.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Ability, Capability, Resource};
    use dialog_credentials::ed25519::Ed25519Signer;
    use dialog_varsig::{eddsa::Ed25519Signature, Principal};
    use testresult::TestResult;

    #[tokio::test]
    async fn archive_round_trips_a_self_issued_delegation() -> TestResult {
        let issuer = Ed25519Signer::import(&[7u8; 32]).await?;
        let audience = Ed25519Signer::import(&[8u8; 32]).await?.did();

        let delegation = Delegation::<Ed25519Signature>::builder()
            .issuer(issuer)
            .audience(audience)
            .capabilities(vec![Capability::new(
                Ability::parse("store/add"),
                Resource::Uri(url::Url::parse("https://example.com/alice")?),
            )])
            .expiration(crate::time::Timestamp::from_unix(2_000_000_000))
            .try_build()
            .await?;

        let archive = Archive::produce(&delegation)?;
        let bytes = archive.to_bytes();

        let parsed = Archive::from_bytes(&bytes)?;
        let restored = parsed.into_delegation::<Ed25519Signature>()?;

        assert_eq!(restored.cid(), delegation.cid());
        assert_eq!(restored.capabilities(), delegation.capabilities());
        Ok(())
    }

    #[tokio::test]
    async fn archive_carries_the_proof_chain() -> TestResult {
        let alice = Ed25519Signer::import(&[10u8; 32]).await?;
        let alice_did = alice.did();
        let bob = Ed25519Signer::import(&[11u8; 32]).await?;
        let bob_did = bob.did();
        let carol_did = Ed25519Signer::import(&[12u8; 32]).await?.did();

        let cap = Capability::new(
            Ability::parse("store/add"),
            Resource::Uri(url::Url::parse(&format!("https://example.com/{alice_did}"))?),
        );

        let proof = Delegation::<Ed25519Signature>::builder()
            .issuer(alice)
            .audience(bob_did)
            .capabilities(vec![cap.clone()])
            .expiration(crate::time::Timestamp::from_unix(2_000_000_000))
            .try_build()
            .await?;

        let invocation = Delegation::<Ed25519Signature>::builder()
            .issuer(bob)
            .audience(carol_did)
            .capabilities(vec![cap])
            .proofs_from(vec![proof.clone()])?
            .expiration(crate::time::Timestamp::from_unix(2_000_000_000))
            .try_build()
            .await?;

        let archive = Archive::produce(&invocation)?;
        assert!(archive.blocks.len() >= 3, "descriptor + invocation root + proof root");

        let bytes = archive.to_bytes();
        let restored = Archive::from_bytes(&bytes)?.into_delegation::<Ed25519Signature>()?;

        let resolved_proofs = restored.proofs()?;
        assert_eq!(resolved_proofs.len(), 1);
        assert!(matches!(resolved_proofs[0], crate::delegation::Proof::Resolved(_)));
        Ok(())
    }
}
