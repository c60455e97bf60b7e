//! Concrete key and signing types for the UCAN capability engine.
//!
//! This crate provides credential implementations that satisfy the
//! [`Principal`] and [`Signer`]/[`Verifier`] traits from `dialog-varsig`.
//!
//! Currently the only implementation is Ed25519 (enabled by the `ed25519`
//! feature, which is on by default).
//!
//! [`Principal`]: dialog_varsig::Principal
//! [`Signer`]: dialog_varsig::Signer
//! [`Verifier`]: dialog_varsig::Verifier

pub mod key;

#[cfg(feature = "ed25519")]
pub mod ed25519;
#[cfg(feature = "ed25519")]
pub use ed25519::*;
