//! Structured failure values for every rejection reason.
//!
//! Every rejection is a first-class, tagged value — nothing crosses the
//! public API as a panic or a type-erased `Box<dyn Error>`.

use dialog_ucan::Timestamp;
use dialog_varsig::did::Did;
use ipld_core::cid::Cid;
use std::fmt;

/// A `with`-URI or caveat failed to parse against a descriptor.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct MalformedReason(pub String);

impl MalformedReason {
    /// Wrap a human-readable parse failure.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A `derives(claimed, delegated)` predicate rejected a transition.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct EscalationReason(pub String);

impl EscalationReason {
    /// Wrap a human-readable escalation reason.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Every rejection reason the capability engine can produce.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// No descriptor's `can` matched the source capability.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    /// A descriptor's `can` matched but parsing `with` or a caveat failed.
    #[error("malformed capability {capability}: {reason}")]
    MalformedCapability {
        /// The offending capability, rendered for logs.
        capability: String,
        /// Why parsing failed.
        reason: MalformedReason,
    },

    /// No proof chain derived the claim; `causes` is the accumulated,
    /// tree-shaped set of reasons every attempted path failed.
    #[error("invalid claim for {claim}:\n{}", render_causes(causes))]
    InvalidClaim {
        /// The claim that could not be derived, rendered for logs.
        claim: String,
        /// Every reason an attempted proof path was rejected.
        causes: Vec<CapabilityError>,
    },

    /// A `derives(claimed, parent)` predicate rejected a transition: the
    /// claimed capability escalates beyond what the parent proof grants.
    #[error("capability escalates beyond its parent: {reason}")]
    EscalatedCapability {
        /// The claimed capability, rendered for logs.
        claim: String,
        /// The parent capability it failed to derive from, rendered for logs.
        parent: String,
        /// Why the derivation predicate rejected the transition.
        reason: EscalationReason,
    },

    /// A proof's audience does not equal the issuer of the delegation that
    /// named it, breaking the audience chain.
    #[error("proof {proof} has audience {actual}, expected {expected}")]
    InvalidAudience {
        /// The proof whose audience chain is broken.
        proof: Cid,
        /// The issuer the proof's audience was expected to equal.
        expected: Did,
        /// The proof's actual audience.
        actual: Did,
    },

    /// A proof's signature did not verify against its claimed issuer.
    #[error("proof {proof} failed signature verification")]
    InvalidSignature {
        /// The proof whose signature failed to verify.
        proof: Cid,
    },

    /// A proof's `expiration` is at or before `now`.
    #[error("proof {proof} expired")]
    Expired {
        /// The expired proof.
        proof: Cid,
        /// The time the proof was checked against.
        now: Timestamp,
    },

    /// A proof's `notBefore` is after `now`.
    #[error("proof {proof} is not valid yet")]
    NotValidYet {
        /// The not-yet-valid proof.
        proof: Cid,
        /// The time the proof was checked against.
        now: Timestamp,
    },

    /// A proof link had no block in the store and no `resolveProof`
    /// callback (or the callback itself failed) produced one.
    #[error("proof link {0} could not be resolved")]
    UnresolvedProof(Cid),

    /// The delegation view failed to decode a block while walking proofs.
    #[error(transparent)]
    Decode(#[from] dialog_ucan::TokenDecodeError),

    /// The caller's cancel token fired before the search completed.
    #[error("validation cancelled")]
    Cancelled,
}

fn render_causes(causes: &[CapabilityError]) -> String {
    causes
        .iter()
        .map(|cause| {
            cause
                .to_string()
                .lines()
                .enumerate()
                .map(|(i, line)| {
                    if i == 0 {
                        format!("  - {line}")
                    } else {
                        format!("    {line}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Envelope wrapping a rejected session's cause with a backpointer to the
/// delegation it was rejected for, for rendering in logs.
///
/// Unlike the leaf variants of [`CapabilityError`] (derived via `thiserror`),
/// this carries its own hand-written [`fmt::Display`] because the backpointer
/// sits outside the tree [`CapabilityError::InvalidClaim`] already renders.
pub struct SessionError {
    /// The delegation whose session was rejected.
    pub delegation: Cid,
    /// The rejection.
    pub cause: CapabilityError,
}

impl SessionError {
    /// Wrap a rejection with the delegation it was rejected for.
    #[must_use]
    pub const fn new(delegation: Cid, cause: CapabilityError) -> Self {
        Self { delegation, cause }
    }
}

impl fmt::Debug for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionError")
            .field("delegation", &self.delegation)
            .field("cause", &self.cause.to_string())
            .finish()
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session {} rejected: {}", self.delegation, self.cause)
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}
