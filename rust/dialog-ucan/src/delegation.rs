//! UCAN delegation: the signed payload (component B) and the lazy,
//! block-store-backed view over it (component C).
//!
//! The spec for UCAN Delegations can be found at
//! [the GitHub repo](https://github.com/ucan-wg/delegation/).

pub mod builder;
pub mod store;

use crate::{
    capability::Capability,
    cid::to_dagcbor_cid,
    envelope::{Envelope, EnvelopePayload, payload_tag::PayloadTag},
    error::TokenDecodeError,
    time::{TimeRange, Timestamp},
};
use dialog_varsig::{Signature, Verifier, did::Did};
use ipld_core::{cid::Cid, ipld::Ipld};
use once_cell::sync::OnceCell;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, MapAccess, Visitor},
};
use std::{fmt::Debug, sync::Mutex};
use store::BlockStore;

/// A single proof reference from a delegation's `prf` list: either a
/// [`Delegation`] already materialized from the block store, or a bare
/// [`Cid`] the caller must fetch.
#[derive(Clone)]
pub enum Proof<S: Signature> {
    /// The proof delegation's block was present in the store.
    Resolved(Box<Delegation<S>>),
    /// No block for this link was in the store.
    Unresolved(Cid),
}

impl<S: Signature> Debug for Proof<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolved(d) => f.debug_tuple("Resolved").field(&d.cid()).finish(),
            Self::Unresolved(cid) => f.debug_tuple("Unresolved").field(cid).finish(),
        }
    }
}

/// A UCAN viewed as a node in a proof chain.
///
/// Comprises a signed root block plus a [`BlockStore`] holding any proof
/// delegations and caveat-referenced data blocks that travel with it.
/// Immutable once constructed, except that [`attach`](Self::attach) may
/// extend the store up until [`iterate_blocks`](Self::iterate_blocks) (and
/// therefore [`archive`](Self::archive)) is first called.
pub struct Delegation<S: Signature> {
    root_cid: Cid,
    root_bytes: Vec<u8>,
    envelope: Envelope<S, DelegationPayload>,
    store: BlockStore,
    proofs_cache: OnceCell<Vec<Proof<S>>>,
    blocks_consumed: Mutex<bool>,
}

impl<S: Signature> Clone for Delegation<S> {
    fn clone(&self) -> Self {
        Self {
            root_cid: self.root_cid,
            root_bytes: self.root_bytes.clone(),
            envelope: self.envelope.clone(),
            store: self.store.clone(),
            proofs_cache: self.proofs_cache.clone(),
            blocks_consumed: Mutex::new(*self.blocks_consumed.lock().expect("lock poisoned")),
        }
    }
}

impl<S: Signature> Delegation<S> {
    /// Creates a blank [`DelegationBuilder`][builder::DelegationBuilder] instance.
    #[must_use]
    pub fn builder() -> builder::DelegationBuilder<S> {
        builder::DelegationBuilder::new()
    }

    /// Wrap an already-decoded envelope as the root of a fresh delegation
    /// view, backed by `store`. Used by [`delegate`][builder] after signing
    /// and by [`view`](Self::view) after decoding received bytes.
    fn from_envelope(envelope: Envelope<S, DelegationPayload>, store: BlockStore) -> Self {
        let root_bytes = serde_ipld_dagcbor::to_vec(&envelope).expect("envelope encodes to DAG-CBOR");
        let root_cid = to_dagcbor_cid(&envelope);
        Self {
            root_cid,
            root_bytes,
            envelope,
            store,
            proofs_cache: OnceCell::new(),
            blocks_consumed: Mutex::new(false),
        }
    }

    /// Construct a view over an already-signed root block plus a block
    /// store holding whatever proof/caveat blocks travel with it
    /// without consuming the delegation's own bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TokenDecodeError`] if `bytes` does not decode as a
    /// [`DelegationPayload`] envelope under signature type `S`.
    pub fn view(bytes: &[u8], store: BlockStore) -> Result<Self, TokenDecodeError>
    where
        S: for<'de> Deserialize<'de>,
    {
        let envelope: Envelope<S, DelegationPayload> = serde_ipld_dagcbor::from_reader(bytes)?;
        let root_cid = to_dagcbor_cid(&envelope);
        Ok(Self {
            root_cid,
            root_bytes: bytes.to_vec(),
            envelope,
            store,
            proofs_cache: OnceCell::new(),
            blocks_consumed: Mutex::new(false),
        })
    }

    /// Construct a view over a block already known to be present in
    /// `store` (used when materializing a proof link).
    fn from_block(block: &crate::block::Block, store: BlockStore) -> Result<Self, TokenDecodeError>
    where
        S: for<'de> Deserialize<'de>,
    {
        Self::view(block.bytes(), store)
    }

    /// This delegation's content address.
    #[must_use]
    pub const fn cid(&self) -> Cid {
        self.root_cid
    }

    /// This delegation's canonical DAG-CBOR bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.root_bytes
    }

    /// The decoded payload. Decoding happens once,
    /// at construction, so this is a plain accessor rather than a cache.
    #[must_use]
    pub const fn data(&self) -> &DelegationPayload {
        &self.envelope.1.payload
    }

    /// Getter for the `issuer` field.
    #[must_use]
    pub const fn issuer(&self) -> &Did {
        &self.data().issuer
    }

    /// Getter for the `audience` field.
    #[must_use]
    pub const fn audience(&self) -> &Did {
        &self.data().audience
    }

    /// Getter for the `capabilities` field.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.data().capabilities
    }

    /// Getter for the `facts` field.
    #[must_use]
    pub fn facts(&self) -> &[Ipld] {
        &self.data().facts
    }

    /// Getter for the `expiration` field.
    #[must_use]
    pub const fn expiration(&self) -> Timestamp {
        self.data().expiration
    }

    /// Getter for the `notBefore` field.
    #[must_use]
    pub const fn not_before(&self) -> Option<Timestamp> {
        self.data().not_before
    }

    /// Getter for the `nonce` field.
    #[must_use]
    pub fn nonce(&self) -> Option<&str> {
        self.data().nonce.as_deref()
    }

    /// The raw `prf` links, unresolved.
    #[must_use]
    pub fn proof_links(&self) -> &[Cid] {
        &self.data().proofs
    }

    /// For each link in `data().proofs`, a [`Proof::Resolved`] delegation
    /// view if its block is present in the store, else a bare
    /// [`Proof::Unresolved`] link. Memoized.
    ///
    /// # Errors
    ///
    /// Returns [`TokenDecodeError`] if a present block fails to decode as a
    /// delegation envelope.
    pub fn proofs(&self) -> Result<&[Proof<S>], TokenDecodeError>
    where
        S: for<'de> Deserialize<'de>,
    {
        self.proofs_cache
            .get_or_try_init(|| {
                self.proof_links()
                    .iter()
                    .map(|cid| match self.store.get(cid) {
                        Some(block) => Delegation::from_block(&block, self.store.clone())
                            .map(|delegation| Proof::Resolved(Box::new(delegation))),
                        None => Ok(Proof::Unresolved(*cid)),
                    })
                    .collect()
            })
            .map(Vec::as_slice)
    }

    /// Depth-first, post-order traversal of every resolved ancestor
    /// delegation reachable through [`proofs`](Self::proofs). Children are
    /// yielded before the delegation that references them; this delegation
    /// itself is never yielded.
    ///
    /// # Errors
    ///
    /// Returns [`TokenDecodeError`] if any reachable proof block fails to decode.
    pub fn iterate(&self) -> Result<Vec<&Delegation<S>>, TokenDecodeError>
    where
        S: for<'de> Deserialize<'de>,
    {
        let mut out = Vec::new();
        self.iterate_into(&mut out)?;
        Ok(out)
    }

    fn iterate_into<'a>(&'a self, out: &mut Vec<&'a Delegation<S>>) -> Result<(), TokenDecodeError>
    where
        S: for<'de> Deserialize<'de>,
    {
        for proof in self.proofs()? {
            if let Proof::Resolved(delegation) = proof {
                delegation.iterate_into(out)?;
                out.push(delegation);
            }
        }
        Ok(())
    }

    /// Yields the root block plus every block reachable via `proofs` and
    /// via caveat-embedded links. Marks
    /// this delegation's blocks as consumed, after which
    /// [`attach`](Self::attach) is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`TokenDecodeError`] if any reachable proof block fails to decode.
    pub fn iterate_blocks(&self) -> Result<Vec<crate::block::Block>, TokenDecodeError>
    where
        S: for<'de> Deserialize<'de>,
    {
        *self.blocks_consumed.lock().expect("lock poisoned") = true;

        let mut out = vec![crate::block::Block::from_parts(
            self.root_cid,
            self.root_bytes.clone(),
        )];
        let mut seen = std::collections::HashSet::new();
        seen.insert(self.root_cid);
        self.collect_blocks(&mut out, &mut seen)?;
        Ok(out)
    }

    fn collect_blocks(
        &self,
        out: &mut Vec<crate::block::Block>,
        seen: &mut std::collections::HashSet<Cid>,
    ) -> Result<(), TokenDecodeError>
    where
        S: for<'de> Deserialize<'de>,
    {
        for proof in self.proofs()? {
            if let Proof::Resolved(delegation) = proof
                && seen.insert(delegation.root_cid)
            {
                out.push(crate::block::Block::from_parts(
                    delegation.root_cid,
                    delegation.root_bytes.clone(),
                ));
                delegation.collect_blocks(out, seen)?;
            }
        }

        for capability in self.capabilities() {
            for value in capability.nb.values() {
                collect_embedded_links(value, &mut |cid| {
                    if seen.insert(cid)
                        && let Some(block) = self.store.get(&cid)
                    {
                        out.push(block);
                    }
                });
            }
        }

        Ok(())
    }

    /// Add a block that a caveat references, if this delegation's blocks
    /// have not yet been walked by [`iterate_blocks`](Self::iterate_blocks)
    /// or [`archive`](Self::archive).
    ///
    /// # Errors
    ///
    /// Returns [`AttachError::AlreadyConsumed`] if blocks were already walked.
    pub fn attach(&self, block: crate::block::Block) -> Result<(), AttachError> {
        if *self.blocks_consumed.lock().expect("lock poisoned") {
            return Err(AttachError::AlreadyConsumed);
        }
        self.store.insert(block);
        Ok(())
    }

    /// Produce an archive container for this delegation.
    ///
    /// # Errors
    ///
    /// Returns [`TokenDecodeError`] if blocks fail to walk.
    pub fn archive(&self) -> Result<crate::archive::Archive, TokenDecodeError>
    where
        S: for<'de> Deserialize<'de>,
    {
        crate::archive::Archive::produce(self)
    }

    /// Verify only the signature of this delegation using a resolver.
    ///
    /// # Errors
    ///
    /// Returns a [`SignatureVerificationError`] if signature verification fails.
    pub async fn verify_signature<R>(
        &self,
        resolver: &R,
    ) -> Result<(), SignatureVerificationError<R::Error>>
    where
        R: dialog_varsig::resolver::Resolver<S>,
    {
        let payload = self
            .envelope
            .1
            .encode()
            .map_err(SignatureVerificationError::EncodingError)?;
        let verifier = resolver
            .resolve(self.issuer())
            .await
            .map_err(SignatureVerificationError::ResolutionError)?;
        Verifier::verify(&verifier, &payload, &self.envelope.0)
            .await
            .map_err(SignatureVerificationError::VerificationError)
    }
}

impl<S: Signature> Debug for Delegation<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delegation")
            .field("cid", &self.root_cid)
            .field("payload", &self.data())
            .finish()
    }
}

impl<S: Signature> PartialEq for Delegation<S> {
    fn eq(&self, other: &Self) -> bool {
        self.root_cid == other.root_cid
    }
}

/// Failure adding a block via [`Delegation::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AttachError {
    /// [`Delegation::iterate_blocks`] (or `archive()`) already walked this
    /// delegation's blocks; attaching afterward could silently change an
    /// already-produced archive.
    #[error("cannot attach a block after this delegation's blocks were walked")]
    AlreadyConsumed,
}

/// The unsigned content of a [`Delegation`] (the token payload,
/// minus `signature`, which lives in the enclosing [`Envelope`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelegationPayload {
    #[serde(rename = "iss")]
    pub(crate) issuer: Did,

    #[serde(rename = "aud")]
    pub(crate) audience: Did,

    #[serde(rename = "can")]
    pub(crate) capabilities: Vec<Capability>,

    #[serde(rename = "prf", default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) proofs: Vec<Cid>,

    #[serde(rename = "fct", default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) facts: Vec<Ipld>,

    #[serde(rename = "exp")]
    pub(crate) expiration: Timestamp,

    #[serde(rename = "nbf", skip_serializing_if = "Option::is_none")]
    pub(crate) not_before: Option<Timestamp>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) nonce: Option<String>,
}

impl<'de> Deserialize<'de> for DelegationPayload {
    fn deserialize<T>(deserializer: T) -> Result<Self, T::Error>
    where
        T: Deserializer<'de>,
    {
        struct PayloadVisitor;

        impl<'de> Visitor<'de> for PayloadVisitor {
            type Value = DelegationPayload;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map with keys iss,aud,can,prf,fct,exp,nbf,nonce")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut issuer: Option<Did> = None;
                let mut audience: Option<Did> = None;
                let mut capabilities: Option<Vec<Capability>> = None;
                let mut proofs: Option<Vec<Cid>> = None;
                let mut facts: Option<Vec<Ipld>> = None;
                let mut expiration: Option<Timestamp> = None;
                let mut not_before: Option<Option<Timestamp>> = None;
                let mut nonce: Option<Option<String>> = None;

                while let Some(key) = map.next_key::<std::borrow::Cow<'de, str>>()? {
                    match key.as_ref() {
                        "iss" => {
                            if issuer.is_some() {
                                return Err(de::Error::duplicate_field("iss"));
                            }
                            issuer = Some(map.next_value()?);
                        }
                        "aud" => {
                            if audience.is_some() {
                                return Err(de::Error::duplicate_field("aud"));
                            }
                            audience = Some(map.next_value()?);
                        }
                        "can" => {
                            if capabilities.is_some() {
                                return Err(de::Error::duplicate_field("can"));
                            }
                            capabilities = Some(map.next_value()?);
                        }
                        "prf" => {
                            if proofs.is_some() {
                                return Err(de::Error::duplicate_field("prf"));
                            }
                            proofs = Some(map.next_value()?);
                        }
                        "fct" => {
                            if facts.is_some() {
                                return Err(de::Error::duplicate_field("fct"));
                            }
                            facts = Some(map.next_value()?);
                        }
                        "exp" => {
                            if expiration.is_some() {
                                return Err(de::Error::duplicate_field("exp"));
                            }
                            expiration = Some(map.next_value()?);
                        }
                        "nbf" => {
                            if not_before.is_some() {
                                return Err(de::Error::duplicate_field("nbf"));
                            }
                            not_before = Some(map.next_value()?);
                        }
                        "nonce" => {
                            if nonce.is_some() {
                                return Err(de::Error::duplicate_field("nonce"));
                            }
                            nonce = Some(map.next_value()?);
                        }
                        other => {
                            return Err(de::Error::unknown_field(
                                other,
                                &["iss", "aud", "can", "prf", "fct", "exp", "nbf", "nonce"],
                            ));
                        }
                    }
                }

                let issuer = issuer.ok_or_else(|| de::Error::missing_field("iss"))?;
                let audience = audience.ok_or_else(|| de::Error::missing_field("aud"))?;
                let capabilities =
                    capabilities.ok_or_else(|| de::Error::missing_field("can"))?;
                let expiration = expiration.ok_or_else(|| de::Error::missing_field("exp"))?;

                Ok(DelegationPayload {
                    issuer,
                    audience,
                    capabilities,
                    proofs: proofs.unwrap_or_default(),
                    facts: facts.unwrap_or_default(),
                    expiration,
                    not_before: not_before.unwrap_or(None),
                    nonce: nonce.unwrap_or(None),
                })
            }
        }

        deserializer.deserialize_map(PayloadVisitor)
    }
}

/// Walk an `nb` caveat value for embedded [`Ipld::Link`]s (the
/// `ucan/attachments` pattern).
fn collect_embedded_links(value: &Ipld, visit: &mut impl FnMut(Cid)) {
    match value {
        Ipld::Link(cid) => visit(*cid),
        Ipld::List(items) => {
            for item in items {
                collect_embedded_links(item, visit);
            }
        }
        Ipld::Map(entries) => {
            for item in entries.values() {
                collect_embedded_links(item, visit);
            }
        }
        _ => {}
    }
}

/// Error type for delegation signature verification.
#[derive(Debug, thiserror::Error)]
pub enum SignatureVerificationError<E: std::error::Error = signature::Error> {
    /// Payload encoding failed.
    #[error("encoding error: {0}")]
    EncodingError(serde_ipld_dagcbor::EncodeError<std::collections::TryReserveError>),

    /// DID resolution failed.
    #[error("resolution error: {0}")]
    ResolutionError(E),

    /// Cryptographic verification failed.
    #[error("verification error: {0}")]
    VerificationError(signature::Error),
}

impl<S: Signature> From<&Delegation<S>> for TimeRange {
    fn from(delegation: &Delegation<S>) -> Self {
        Self::new(delegation.not_before(), Some(delegation.expiration()))
    }
}

impl PayloadTag for DelegationPayload {
    fn spec_id() -> &'static str {
        "ucan"
    }

    fn version() -> &'static str {
        "0.9.1"
    }
}
