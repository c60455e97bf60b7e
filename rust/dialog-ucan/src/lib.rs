//! Core UCAN functionality: blocks and links (component A), the token
//! codec (component B), the delegation view (component C), and the
//! archive codec (component D).

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod archive;
pub mod block;
pub mod capability;
pub mod cid;
pub mod codec;
pub mod delegation;
pub mod envelope;
pub mod error;
pub mod time;

// Internal module backing the delegation builder's type-state.
mod sealed;

pub use archive::Archive;
pub use block::Block;
pub use capability::{Ability, Capability, Caveats, MalformedResource, Resource};
pub use delegation::{
    Delegation, Proof,
    builder::{DelegationBuildError, DelegationBuilder},
    store::BlockStore,
};
pub use error::{ArchiveError, TokenDecodeError};
pub use time::{TimeRange, Timestamp, TimestampRangeError};
