//! Type-state marker traits for [`DelegationBuilder`][crate::delegation::builder::DelegationBuilder].

use crate::capability::Capability;
use dialog_varsig::{Did, Signature};
use ipld_core::cid::Cid;

/// Placeholder for a builder field that has not been set yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unset;

#[doc(hidden)]
pub trait IssuerOrUnset<S: Signature> {}
impl<S: Signature> IssuerOrUnset<S> for Unset {}
impl<S: Signature, I: dialog_varsig::Signer<S>> IssuerOrUnset<S> for I {}

#[doc(hidden)]
pub trait DidOrUnset {}
impl DidOrUnset for Unset {}
impl DidOrUnset for Did {}

#[doc(hidden)]
pub trait CapabilitiesOrUnset {}
impl CapabilitiesOrUnset for Unset {}
impl CapabilitiesOrUnset for Vec<Capability> {}

#[doc(hidden)]
pub trait ProofsOrUnset {}
impl ProofsOrUnset for Unset {}
impl ProofsOrUnset for Vec<Cid> {}
