//! Resource-ownership oracle consulted by the validator's self-issue check.
//!
//! The validator itself has no notion of which DIDs own which resources —
//! that mapping is host-specific (e.g. "this `did:key` owns every
//! `https://storage.example.com/<did>/*` URI"). Implementations supply an
//! [`Authority`] to answer that question during the self-issue check.

use dialog_ucan::Resource;
use dialog_varsig::did::Did;

/// Whether `principal` may self-issue capabilities on `resource`, i.e. is
/// the resource's own authority rather than a delegate of it.
pub trait Authority {
    /// Whether `principal` controls `resource` outright.
    fn owns(&self, resource: &Resource, principal: &Did) -> bool;
}

/// An authority where every principal owns exactly the resource named by
/// its own `did:key` (the common case: `alice.did()` names the resource
/// `alice` has unconditional authority over).
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfAuthority;

impl Authority for SelfAuthority {
    fn owns(&self, resource: &Resource, principal: &Did) -> bool {
        match resource {
            Resource::Uri(url) => url.as_str() == principal.as_str(),
            Resource::UcanStar => false,
        }
    }
}
