//! The proof-chain validator — the hard core of this crate.
//!
//! Given a claimed capability and an invocation delegation, [`access`] walks
//! the invocation's proofs looking for a chain that justifies the claim:
//! a self-issue short-circuit, or a recursive search through proofs that
//! checks audience chaining, time bounds, and signatures, expands `ucan:*`
//! re-delegation, and asks each descriptor's `derives` predicate whether the
//! claim is entailed by what a proof actually grants.

use crate::{
    ability::match_ability,
    authority::Authority,
    error::{CapabilityError, MalformedReason},
    matcher::{Match, Matcher},
};
use async_recursion::async_recursion;
use dialog_ucan::{
    Capability, Caveats, Delegation, Resource,
    delegation::Proof,
    time::Timestamp,
};
use dialog_varsig::{Signature, resolver::Resolver};
use ipld_core::cid::Cid;
use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// A cancellation signal checked at every recursive step and before every
/// awaited operation. Cheap to clone; clones share
/// the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, not-yet-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Resolves a proof link that has no block in the invocation's own store
/// return an already-decoded [`Delegation`].
pub trait ProofResolver<S: Signature> {
    /// Resolve `link` to the delegation it names.
    fn resolve(
        &self,
        link: Cid,
    ) -> impl Future<Output = Result<Delegation<S>, CapabilityError>> + Send;
}

/// A [`ProofResolver`] that never resolves anything — every unresolved
/// proof link surfaces as [`CapabilityError::UnresolvedProof`]. The right
/// choice when the caller expects every proof to travel in the
/// invocation's own block store (e.g. after [`Delegation::view`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProofResolver;

impl<S: Signature> ProofResolver<S> for NoProofResolver {
    async fn resolve(&self, link: Cid) -> Result<Delegation<S>, CapabilityError> {
        Err(CapabilityError::UnresolvedProof(link))
    }
}

/// The chain of delegation CIDs that justified a claim, outermost first
/// outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofTrace(pub Vec<Cid>);

/// Decide whether `invocation`'s own capabilities (matched against
/// `selector`) are authorized, resolving and checking the proof chain
/// along the way.
///
/// The claim is derived from `invocation.capabilities()` by applying
/// `selector` to the first capability it recognizes; if no capability is
/// recognized or well-formed, the corresponding `Unknown`/`Malformed`
/// rejection is returned directly without attempting proof search.
///
/// # Errors
///
/// Returns [`CapabilityError::UnknownCapability`] /
/// [`CapabilityError::MalformedCapability`] if `invocation` carries no
/// capability `selector` can parse, [`CapabilityError::Cancelled`] if
/// `cancel` fires, or [`CapabilityError::InvalidClaim`] with the
/// accumulated causes if no proof chain derives the claim.
#[tracing::instrument(skip_all, fields(invocation = %invocation.cid()))]
pub async fn access<V, S, A, PR, DR>(
    invocation: &Delegation<S>,
    selector: &Matcher<V>,
    authority: &A,
    now: Timestamp,
    proof_resolver: &PR,
    did_resolver: &DR,
    cancel: &CancelToken,
) -> Result<ProofTrace, CapabilityError>
where
    V: Clone + Send + Sync,
    S: Signature + for<'de> serde::Deserialize<'de>,
    A: Authority + Sync,
    PR: ProofResolver<S> + Sync,
    DR: Resolver<S> + Sync,
{
    let claim = own_claim(invocation.capabilities(), selector)?;
    validate(&claim, invocation, selector, authority, now, proof_resolver, did_resolver, cancel).await
}

/// Match the first recognized, well-formed capability out of `capabilities`
/// against `selector`.
fn own_claim<V: Clone>(
    capabilities: &[Capability],
    selector: &Matcher<V>,
) -> Result<Match<V>, CapabilityError> {
    use crate::matcher::MatchResult;

    let mut best: Option<CapabilityError> = None;
    for capability in capabilities {
        match selector.match_one(capability) {
            MatchResult::Match(matched) => return Ok(matched),
            MatchResult::Malformed(capability, reason) => {
                best = Some(CapabilityError::MalformedCapability {
                    capability: render_capability(&capability),
                    reason,
                });
            }
            MatchResult::Unknown(capability) => {
                if best.is_none() {
                    best = Some(CapabilityError::UnknownCapability(render_capability(
                        &capability,
                    )));
                }
            }
        }
    }
    Err(best.unwrap_or_else(|| CapabilityError::UnknownCapability("<no capabilities>".to_string())))
}

#[cfg_attr(target_arch = "wasm32", async_recursion(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_recursion)]
async fn validate<V, S, A, PR, DR>(
    claim: &Match<V>,
    invocation: &Delegation<S>,
    selector: &Matcher<V>,
    authority: &A,
    now: Timestamp,
    proof_resolver: &PR,
    did_resolver: &DR,
    cancel: &CancelToken,
) -> Result<ProofTrace, CapabilityError>
where
    V: Clone + Send + Sync,
    S: Signature + for<'de> serde::Deserialize<'de>,
    A: Authority + Sync,
    PR: ProofResolver<S> + Sync,
    DR: Resolver<S> + Sync,
{
    if cancel.is_cancelled() {
        return Err(CapabilityError::Cancelled);
    }

    // Step 1: self-issue short-circuit.
    if authority.owns(&claim.capability.with, invocation.issuer())
        && invocation.capabilities().contains(&claim.capability)
    {
        return Ok(ProofTrace(vec![invocation.cid()]));
    }

    let mut causes = Vec::new();
    let resolved_proofs = invocation
        .proofs()
        .map_err(CapabilityError::Decode)?;

    for proof in resolved_proofs {
        if cancel.is_cancelled() {
            return Err(CapabilityError::Cancelled);
        }

        // Step 2: proof expansion — resolve, then check audience/time/signature.
        let delegation = match proof {
            Proof::Resolved(delegation) => (**delegation).clone(),
            Proof::Unresolved(link) => match proof_resolver.resolve(*link).await {
                Ok(delegation) => delegation,
                Err(_) => {
                    causes.push(CapabilityError::UnresolvedProof(*link));
                    continue;
                }
            },
        };

        if delegation.audience() != invocation.issuer() {
            tracing::warn!(proof = %delegation.cid(), "proof audience does not match invocation issuer");
            causes.push(CapabilityError::InvalidAudience {
                proof: delegation.cid(),
                expected: invocation.issuer().clone(),
                actual: delegation.audience().clone(),
            });
            continue;
        }

        if delegation.expiration() <= now {
            tracing::warn!(proof = %delegation.cid(), "proof expired");
            causes.push(CapabilityError::Expired {
                proof: delegation.cid(),
                now,
            });
            continue;
        }

        if let Some(not_before) = delegation.not_before()
            && not_before > now
        {
            tracing::warn!(proof = %delegation.cid(), "proof not yet valid");
            causes.push(CapabilityError::NotValidYet {
                proof: delegation.cid(),
                now,
            });
            continue;
        }

        if cancel.is_cancelled() {
            return Err(CapabilityError::Cancelled);
        }
        if delegation.verify_signature(did_resolver).await.is_err() {
            tracing::warn!(proof = %delegation.cid(), "proof signature verification failed");
            causes.push(CapabilityError::InvalidSignature {
                proof: delegation.cid(),
            });
            continue;
        }

        // Step 3: capability expansion (ucan:* re-delegation).
        let expanded = match expand_capabilities(&delegation) {
            Ok(capabilities) => capabilities,
            Err(error) => {
                causes.push(error);
                continue;
            }
        };

        // Step 4: derivation match, tried in declared order; first success wins.
        for candidate in selector.from_selector().select(&expanded) {
            match candidate.derives_from(&claim.value) {
                Ok(()) => {
                    match validate(
                        &candidate,
                        &delegation,
                        selector,
                        authority,
                        now,
                        proof_resolver,
                        did_resolver,
                        cancel,
                    )
                    .await
                    {
                        Ok(mut trace) => {
                            let mut full = vec![invocation.cid()];
                            full.append(&mut trace.0);
                            return Ok(ProofTrace(full));
                        }
                        Err(sub_error) => causes.push(sub_error),
                    }
                }
                Err(reason) => {
                    tracing::warn!(proof = %delegation.cid(), %reason, "claimed capability escalates beyond proof");
                    causes.push(CapabilityError::EscalatedCapability {
                        claim: render_capability(&claim.capability),
                        parent: render_capability(&candidate.capability),
                        reason,
                    });
                }
            }
        }
    }

    // Step 5: no proof yielded a successful trace.
    Err(CapabilityError::InvalidClaim {
        claim: render_capability(&claim.capability),
        causes,
    })
}

/// Expand a delegation's capability list: a `ucan:*`
/// capability re-delegates both the issuer's own resources and, for each
/// resolved proof, every capability whose `can` is compatible under the
/// ability-match rule — narrowed to the more specific pattern and
/// shallow-merged with the re-delegation's own caveats.
fn expand_capabilities<S: Signature>(
    delegation: &Delegation<S>,
) -> Result<Vec<Capability>, CapabilityError>
where
    S: for<'de> serde::Deserialize<'de>,
{
    let mut expanded = Vec::new();

    for capability in delegation.capabilities() {
        if !capability.is_redelegation() {
            expanded.push(capability.clone());
            continue;
        }

        let own_resource = Resource::parse(delegation.issuer().as_str()).map_err(|error| {
            CapabilityError::MalformedCapability {
                capability: render_capability(capability),
                reason: MalformedReason::new(error.to_string()),
            }
        })?;
        expanded.push(Capability::with_caveats(
            capability.can.clone(),
            own_resource,
            capability.nb.clone(),
        ));

        for proof in delegation.proofs().map_err(CapabilityError::Decode)? {
            let Proof::Resolved(proof_delegation) = proof else {
                continue;
            };
            for proof_capability in proof_delegation.capabilities() {
                if let Some(resolved_can) = match_ability(&proof_capability.can, &capability.can) {
                    expanded.push(Capability::with_caveats(
                        resolved_can,
                        proof_capability.with.clone(),
                        shallow_merge(&capability.nb, &proof_capability.nb),
                    ));
                }
            }
        }
    }

    Ok(expanded)
}

/// Overlay `outer`'s keys onto `inner`, outer winning on collision — a
/// conservative, non-recursive widening left for the `derives` predicate
/// to reject if unsatisfiable.
fn shallow_merge(outer: &Caveats, inner: &Caveats) -> Caveats {
    let mut merged = inner.clone();
    for (key, value) in outer {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn render_capability(capability: &Capability) -> String {
    format!("{} on {}", capability.can, capability.with)
}
