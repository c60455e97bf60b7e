//! Typed capability matching and proof-chain validation for UCAN tokens.
//!
//! Where [`dialog_ucan`] treats a [`Capability`][dialog_ucan::Capability] as
//! an opaque `(can, with, nb)` triple, this crate turns that wire shape into
//! application-defined typed values and walks a delegation's proof chain to
//! decide whether an invocation is actually authorized.
//!
//! # Shape of the system
//!
//! - [`Descriptor`] declares how one concrete ability's capability parses
//!   into a typed value `V`, and how a claimed `V` is derived from a
//!   delegated one.
//! - [`Matcher`] combines descriptors: `or` for alternatives, `and` for
//!   conjunctions, `derive` for re-delegation, each producing a
//!   [`MatchResult`].
//! - [`Authority`] answers whether a principal may self-issue on a resource
//!   outright, with no delegation required.
//! - [`access`] runs the recursive proof-chain search: given an invocation,
//!   a matcher, an authority, and the means to resolve proof links and
//!   verify signatures, it returns the chain of delegations that justified
//!   the claim or a [`CapabilityError`] describing every rejected path.
//!
//! # Example
//!
//! ```rust,no_run
//! use dialog_capability::{Descriptor, Matcher, SelfAuthority, CancelToken, access, NoProofResolver};
//! use dialog_ucan::{Ability, Resource, delegation::Delegation};
//! use dialog_credentials::ed25519::Ed25519KeyResolver;
//! use dialog_varsig::eddsa::Ed25519Signature;
//!
//! # async fn example(
//! #     invocation: &Delegation<Ed25519Signature>,
//! #     now: dialog_ucan::time::Timestamp,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let store_add: Descriptor<String> = Descriptor::new(
//!     Ability::parse("store/add"),
//!     |with| match with {
//!         Resource::Uri(url) => Ok(url.to_string()),
//!         Resource::UcanStar => Err(dialog_capability::MalformedReason::new("no ucan:*")),
//!     },
//!     |claimed, delegated| {
//!         if claimed == delegated {
//!             Ok(())
//!         } else {
//!             Err(dialog_capability::EscalationReason::new("target mismatch"))
//!         }
//!     },
//! );
//! let matcher = Matcher::direct(store_add);
//! let trace = access(
//!     invocation,
//!     &matcher,
//!     &SelfAuthority,
//!     now,
//!     &NoProofResolver,
//!     &Ed25519KeyResolver,
//!     &CancelToken::new(),
//! ).await?;
//! # let _ = trace;
//! # Ok(())
//! # }
//! ```

mod ability;
pub use ability::*;

mod authority;
pub use authority::*;

mod descriptor;
pub use descriptor::*;

mod error;
pub use error::*;

mod matcher;
pub use matcher::*;

mod validator;
pub use validator::*;
