//! Native (non-WASM) Ed25519 key types.
//!
//! `ed25519_dalek`'s `SigningKey`/`VerifyingKey` already provide every
//! operation [`super::Ed25519SigningKey`]/[`super::Ed25519VerifyingKey`]
//! need (`to_bytes`, `verifying_key`, `try_sign`/`verify` via the
//! `signature` crate's traits), so this module is a thin re-export rather
//! than a wrapper type.
pub use ed25519_dalek::{SigningKey, VerifyingKey};
