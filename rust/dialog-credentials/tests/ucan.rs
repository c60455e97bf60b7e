//! Integration tests demonstrating `Ed25519Signer`/`Ed25519KeyResolver` used
//! directly as the signer and resolver for `dialog-ucan` delegations.
//!
//! Because `Ed25519Signer` implements `Principal + Signer<Ed25519Signature>`,
//! it satisfies everything `DelegationBuilder` needs of an issuer with no
//! adapter type in between.

use dialog_credentials::ed25519::{Ed25519KeyResolver, Ed25519Signer};
use dialog_ucan::{Ability, Capability, Delegation, Resource};
use dialog_varsig::{Principal, eddsa::Ed25519Signature};
use testresult::TestResult;

async fn test_signer(seed: u8) -> Ed25519Signer {
    Ed25519Signer::import(&[seed; 32]).await.unwrap()
}

#[dialog_common::test]
async fn issue_self_signed_delegation() -> TestResult {
    let signer = test_signer(20).await;
    let resolver = Ed25519KeyResolver;

    let delegation = Delegation::<Ed25519Signature>::builder()
        .issuer(signer.clone())
        .audience(signer.did())
        .capabilities(vec![Capability::new(
            Ability::parse("storage/read"),
            Resource::Uri(url::Url::parse("https://example.com/alice")?),
        )])
        .expiration(dialog_ucan::Timestamp::from_unix(2_000_000_000))
        .try_build()
        .await?;

    delegation.verify_signature(&resolver).await?;
    assert_eq!(delegation.issuer().to_string(), signer.did().to_string());
    Ok(())
}

#[dialog_common::test]
async fn issue_delegation_to_another_principal() -> TestResult {
    let signer = test_signer(40).await;
    let audience = test_signer(41).await;
    let resolver = Ed25519KeyResolver;

    let delegation = Delegation::<Ed25519Signature>::builder()
        .issuer(signer.clone())
        .audience(audience.did())
        .capabilities(vec![Capability::new(
            Ability::parse("storage/write"),
            Resource::Uri(url::Url::parse("https://example.com/alice")?),
        )])
        .expiration(dialog_ucan::Timestamp::from_unix(2_000_000_000))
        .try_build()
        .await?;

    delegation.verify_signature(&resolver).await?;
    assert_eq!(delegation.audience().to_string(), audience.did().to_string());
    Ok(())
}

#[dialog_common::test]
async fn delegation_carries_a_wildcard_capability() -> TestResult {
    let signer = test_signer(60).await;
    let audience = test_signer(61).await;
    let resolver = Ed25519KeyResolver;

    let delegation = Delegation::<Ed25519Signature>::builder()
        .issuer(signer.clone())
        .audience(audience.did())
        .capabilities(vec![Capability::new(
            Ability::parse("*"),
            Resource::UcanStar,
        )])
        .expiration(dialog_ucan::Timestamp::from_unix(2_000_000_000))
        .try_build()
        .await?;

    assert!(matches!(delegation.capabilities()[0].can, Ability::Any));
    delegation.verify_signature(&resolver).await?;
    Ok(())
}
