//! Type-state builder for [`Delegation`].

use super::{Delegation, DelegationPayload, store::BlockStore};
use crate::{
    capability::Capability,
    envelope::{Envelope, EnvelopePayload},
    time::Timestamp,
};
use dialog_varsig::{Did, Principal, Signature, Signer};
use ipld_core::{cid::Cid, ipld::Ipld};
use serde::{Deserialize, Serialize};

use crate::sealed::{
    CapabilitiesOrUnset, DidOrUnset, IssuerOrUnset, ProofsOrUnset, Unset,
};

/// Builds a [`Delegation`] from its required fields, enforcing at compile
/// time that `issuer`, `audience`, and `capabilities` are all set before
/// [`try_build`](Self::try_build) becomes callable.
///
/// `proofs` and `expiration`/`not_before`/`nonce`/`facts` are optional:
/// a delegation with no proofs is a self-issued (root) capability grant
/// (the self-issue short-circuit validators check for), and `expiration` defaults
/// to "never" only if explicitly set that way by the caller — the UCAN
/// wire format always carries an `exp`, so [`try_build`](Self::try_build)
/// requires one.
pub struct DelegationBuilder<S: Signature, I = Unset, A = Unset, C = Unset, P = Unset> {
    issuer: I,
    audience: A,
    capabilities: C,
    proofs: P,
    expiration: Option<Timestamp>,
    not_before: Option<Timestamp>,
    nonce: Option<String>,
    facts: Vec<Ipld>,
    store: BlockStore,
    _signature: std::marker::PhantomData<S>,
}

impl<S: Signature> DelegationBuilder<S> {
    /// A blank builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            issuer: Unset,
            audience: Unset,
            capabilities: Unset,
            proofs: Unset,
            expiration: None,
            not_before: None,
            nonce: None,
            facts: Vec::new(),
            store: BlockStore::new(),
            _signature: std::marker::PhantomData,
        }
    }
}

impl<S: Signature> Default for DelegationBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Signature, I: IssuerOrUnset<S>, A, C, P> DelegationBuilder<S, I, A, C, P> {
    /// Set the issuer: anything that can sign payloads of type `S`.
    pub fn issuer<I2: IssuerOrUnset<S>>(self, issuer: I2) -> DelegationBuilder<S, I2, A, C, P> {
        DelegationBuilder {
            issuer,
            audience: self.audience,
            capabilities: self.capabilities,
            proofs: self.proofs,
            expiration: self.expiration,
            not_before: self.not_before,
            nonce: self.nonce,
            facts: self.facts,
            store: self.store,
            _signature: std::marker::PhantomData,
        }
    }
}

impl<S: Signature, I, A: DidOrUnset, C, P> DelegationBuilder<S, I, A, C, P> {
    /// Set the audience DID.
    pub fn audience<A2: DidOrUnset>(self, audience: A2) -> DelegationBuilder<S, I, A2, C, P> {
        DelegationBuilder {
            issuer: self.issuer,
            audience,
            capabilities: self.capabilities,
            proofs: self.proofs,
            expiration: self.expiration,
            not_before: self.not_before,
            nonce: self.nonce,
            facts: self.facts,
            store: self.store,
            _signature: std::marker::PhantomData,
        }
    }
}

impl<S: Signature, I, A, C: CapabilitiesOrUnset, P> DelegationBuilder<S, I, A, C, P> {
    /// Set the granted capabilities.
    pub fn capabilities<C2: CapabilitiesOrUnset>(
        self,
        capabilities: C2,
    ) -> DelegationBuilder<S, I, A, C2, P> {
        DelegationBuilder {
            issuer: self.issuer,
            audience: self.audience,
            capabilities,
            proofs: self.proofs,
            expiration: self.expiration,
            not_before: self.not_before,
            nonce: self.nonce,
            facts: self.facts,
            store: self.store,
            _signature: std::marker::PhantomData,
        }
    }
}

impl<S: Signature, I, A, C, P: ProofsOrUnset> DelegationBuilder<S, I, A, C, P> {
    /// Set the proof links by CID (use [`proofs_from`](Self::proofs_from)
    /// to also import the proofs' own blocks into this delegation's store).
    pub fn proofs<P2: ProofsOrUnset>(self, proofs: P2) -> DelegationBuilder<S, I, A, C, P2> {
        DelegationBuilder {
            issuer: self.issuer,
            audience: self.audience,
            capabilities: self.capabilities,
            proofs,
            expiration: self.expiration,
            not_before: self.not_before,
            nonce: self.nonce,
            facts: self.facts,
            store: self.store,
            _signature: std::marker::PhantomData,
        }
    }
}

impl<S, I, A, C, P> DelegationBuilder<S, I, A, C, P>
where
    S: Signature + for<'de> Deserialize<'de>,
{
    /// Set the proof links from already-materialized proof delegations,
    /// importing every block each one can reach (its own root plus its
    /// ancestors' roots and caveat-referenced blocks) into this builder's
    /// store, so the delegation produced by
    /// [`try_build_with_store`](Self::try_build_with_store) has a
    /// self-contained, archivable block DAG.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::TokenDecodeError`] if walking a proof's
    /// blocks fails.
    pub fn proofs_from(
        self,
        proofs: Vec<Delegation<S>>,
    ) -> Result<DelegationBuilder<S, I, A, C, Vec<Cid>>, crate::error::TokenDecodeError> {
        let mut cids = Vec::with_capacity(proofs.len());
        for proof in &proofs {
            cids.push(proof.cid());
            for block in proof.iterate_blocks()? {
                self.store.insert(block);
            }
        }
        Ok(DelegationBuilder {
            issuer: self.issuer,
            audience: self.audience,
            capabilities: self.capabilities,
            proofs: cids,
            expiration: self.expiration,
            not_before: self.not_before,
            nonce: self.nonce,
            facts: self.facts,
            store: self.store,
            _signature: std::marker::PhantomData,
        })
    }
}

impl<S: Signature, I, A, C, P> DelegationBuilder<S, I, A, C, P> {
    /// Set the expiration (`exp`). Required before
    /// [`try_build`](Self::try_build) will accept the builder.
    #[must_use]
    pub fn expiration(mut self, expiration: Timestamp) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Set the not-before bound (`nbf`).
    #[must_use]
    pub fn not_before(mut self, not_before: Timestamp) -> Self {
        self.not_before = Some(not_before);
        self
    }

    /// Set the nonce.
    #[must_use]
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Set the facts list.
    #[must_use]
    pub fn facts(mut self, facts: Vec<Ipld>) -> Self {
        self.facts = facts;
        self
    }

    /// Pre-seed the delegation's block store, e.g. with caveat-referenced
    /// blocks attached ahead of signing.
    #[must_use]
    pub fn store(mut self, store: BlockStore) -> Self {
        self.store = store;
        self
    }
}

/// Failure constructing a delegation via [`DelegationBuilder::try_build`].
#[derive(Debug, thiserror::Error)]
pub enum DelegationBuildError {
    /// No `exp` was set.
    #[error("delegation requires an expiration")]
    MissingExpiration,

    /// Signing the payload failed.
    #[error("signing failed: {0}")]
    SigningFailed(#[source] signature::Error),
}

impl<S, Iss> DelegationBuilder<S, Iss, Did, Vec<Capability>, Unset>
where
    S: Signature + Serialize + for<'de> Deserialize<'de>,
    Iss: Signer<S> + Principal,
{
    /// Construct and sign the delegation with no proofs (a self-issued
    /// capability grant), using the issuer already set on this builder.
    ///
    /// # Errors
    ///
    /// Returns [`DelegationBuildError`] if no expiration was set or
    /// signing fails.
    pub async fn try_build(self) -> Result<Delegation<S>, DelegationBuildError> {
        self.proofs(Vec::new()).try_build_inner().await
    }
}

impl<S, Iss> DelegationBuilder<S, Iss, Did, Vec<Capability>, Vec<Cid>>
where
    S: Signature + Serialize + for<'de> Deserialize<'de>,
    Iss: Signer<S> + Principal,
{
    /// Construct and sign the delegation, using the issuer and proof
    /// links already set on this builder and this builder's store.
    ///
    /// # Errors
    ///
    /// Returns [`DelegationBuildError`] if no expiration was set or
    /// signing fails.
    pub async fn try_build(self) -> Result<Delegation<S>, DelegationBuildError> {
        self.try_build_inner().await
    }

    /// As [`try_build`](Self::try_build), but replaces this builder's
    /// store with `store` first (e.g. a store pre-populated by
    /// [`proofs_from`](DelegationBuilder::proofs_from) on another builder
    /// sharing the same proofs).
    ///
    /// # Errors
    ///
    /// Returns [`DelegationBuildError`] if no expiration was set or
    /// signing fails.
    pub async fn try_build_with_store(
        self,
        store: BlockStore,
    ) -> Result<Delegation<S>, DelegationBuildError> {
        self.store(store).try_build_inner().await
    }
}

impl<S, Iss> DelegationBuilder<S, Iss, Did, Vec<Capability>, Vec<Cid>>
where
    S: Signature + Serialize + for<'de> Deserialize<'de>,
    Iss: Signer<S> + Principal,
{
    async fn try_build_inner(self) -> Result<Delegation<S>, DelegationBuildError> {
        let expiration = self
            .expiration
            .ok_or(DelegationBuildError::MissingExpiration)?;

        let payload = DelegationPayload {
            issuer: self.issuer.did(),
            audience: self.audience,
            capabilities: self.capabilities,
            proofs: self.proofs,
            facts: self.facts,
            expiration,
            not_before: self.not_before,
            nonce: self.nonce,
        };

        let envelope_payload: EnvelopePayload<S, DelegationPayload> = payload.into();
        let bytes = envelope_payload
            .encode()
            .expect("delegation payload encodes to DAG-CBOR");
        let signature = self
            .issuer
            .sign(&bytes)
            .await
            .map_err(DelegationBuildError::SigningFailed)?;

        let envelope = Envelope(signature, envelope_payload);
        Ok(Delegation::from_envelope(envelope, self.store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Ability, Resource};
    use dialog_credentials::ed25519::Ed25519Signer;
    use dialog_varsig::eddsa::Ed25519Signature;
    use testresult::TestResult;

    #[tokio::test]
    async fn builder_requires_an_expiration() -> TestResult {
        let issuer = Ed25519Signer::import(&[1u8; 32]).await?;
        let audience = Ed25519Signer::import(&[2u8; 32]).await?.did();

        let result = Delegation::<Ed25519Signature>::builder()
            .issuer(issuer)
            .audience(audience)
            .capabilities(vec![Capability::new(Ability::Any, Resource::UcanStar)])
            .try_build()
            .await;

        assert!(matches!(
            result,
            Err(DelegationBuildError::MissingExpiration)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn builder_produces_a_verifiable_delegation() -> TestResult {
        let issuer = Ed25519Signer::import(&[3u8; 32]).await?;
        let issuer_did = issuer.did();
        let audience = Ed25519Signer::import(&[4u8; 32]).await?.did();

        let delegation = Delegation::<Ed25519Signature>::builder()
            .issuer(issuer)
            .audience(audience.clone())
            .capabilities(vec![Capability::new(Ability::Any, Resource::UcanStar)])
            .expiration(Timestamp::from_unix(2_000_000_000))
            .try_build()
            .await?;

        assert_eq!(delegation.issuer(), &issuer_did);
        assert_eq!(delegation.audience(), &audience);
        Ok(())
    }
}
