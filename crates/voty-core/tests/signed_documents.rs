//! Signed documents survive the storage wire format

#![allow(clippy::unwrap_used, clippy::expect_used)]

use ed25519_dalek::SigningKey;
use proptest::prelude::*;
use serde_json::{json, Value};
use voty_core::crypto::{address_of, sign_document, verify_document, DEFAULT_SIGNING_TEMPLATE};
use voty_core::{
    Authorship, Choice, CoinType, Did, Permalink, Proposal, SignedProposal, SignedVote, Snapshot,
    SnapshotSet, Vote, VotingType,
};

fn key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

fn authorship(author: &str) -> Authorship {
    Authorship {
        author: Did::parse(author).unwrap(),
        coin_type: CoinType::CKB,
        snapshot: Snapshot::new(9_000_000),
        testnet: false,
    }
}

fn proposal(title: &str) -> Proposal {
    Proposal {
        community: Permalink::from_id("community-1").unwrap(),
        workgroup: "grants".into(),
        title: title.into(),
        voting_type: VotingType::Single,
        options: vec!["Yes".into(), "No".into()],
        snapshots: SnapshotSet::new()
            .with(CoinType::ETH, Snapshot::new(18_000_000))
            .with(CoinType::CKB, Snapshot::new(9_000_000)),
        extension: None,
    }
}

#[test]
fn test_wire_layout() {
    let signed = sign_document(
        proposal("Fund the grants round"),
        authorship("alice.bit"),
        &key(2),
        DEFAULT_SIGNING_TEMPLATE,
    )
    .unwrap();
    let wire = serde_json::to_value(&signed).unwrap();

    assert_eq!(wire["title"], "Fund the grants round");
    assert_eq!(wire["voting_type"], "single");
    assert_eq!(wire["snapshots"]["60"], "18000000");
    assert_eq!(wire["authorship"]["author"], "alice.bit");
    assert_eq!(wire["authorship"]["snapshot"], "9000000");
    assert!(wire["authorship"].get("testnet").is_none());
    assert_eq!(wire["proof"]["type"], "ed25519");
    assert!(wire.get("extension").is_none());
}

#[test]
fn test_verification_after_reparse() {
    let signed = sign_document(
        proposal("Fund the grants round"),
        authorship("alice.bit"),
        &key(2),
        DEFAULT_SIGNING_TEMPLATE,
    )
    .unwrap();
    let bytes = serde_json::to_vec(&signed).unwrap();

    let parsed: SignedProposal = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed, signed);
    assert_eq!(
        verify_document(&parsed).unwrap(),
        address_of(&key(2).verifying_key())
    );
}

#[test]
fn test_key_order_does_not_matter() {
    let signed = sign_document(
        proposal("Order"),
        authorship("alice.bit"),
        &key(2),
        DEFAULT_SIGNING_TEMPLATE,
    )
    .unwrap();
    let Value::Object(fields) = serde_json::to_value(&signed).unwrap() else {
        panic!("signed document is an object");
    };
    let reversed: serde_json::Map<String, Value> = fields.into_iter().rev().collect();

    let parsed: SignedProposal = serde_json::from_value(Value::Object(reversed)).unwrap();
    assert!(verify_document(&parsed).is_ok());
}

#[test]
fn test_edited_field_breaks_proof() {
    let signed = sign_document(
        Vote {
            proposal: Permalink::from_id("proposal-1").unwrap(),
            choice: Choice::Single(0),
            power: 12.5,
        },
        authorship("bob.bit"),
        &key(3),
        DEFAULT_SIGNING_TEMPLATE,
    )
    .unwrap();
    let mut wire = serde_json::to_value(&signed).unwrap();
    wire["power"] = json!(125.0);

    let forged: SignedVote = serde_json::from_value(wire).unwrap();
    assert!(verify_document(&forged).is_err());
}

#[test]
fn test_unknown_scheme_rejected_on_parse() {
    let signed = sign_document(
        proposal("Scheme"),
        authorship("alice.bit"),
        &key(2),
        DEFAULT_SIGNING_TEMPLATE,
    )
    .unwrap();
    let mut wire = serde_json::to_value(&signed).unwrap();
    wire["proof"]["type"] = json!("secp256k1");
    assert!(serde_json::from_value::<SignedProposal>(wire).is_err());
}

proptest! {
    #[test]
    fn prop_weighted_votes_verify_after_reparse(
        weights in prop::collection::btree_map(0usize..4, 0.0f64..1e9, 1..4),
        power in 0.0f64..1e12,
        seed in 1u8..=255,
    ) {
        let choice = Choice::Weighted(
            weights.into_iter().map(|(option, weight)| (option.to_string(), weight)).collect(),
        );
        let signed = sign_document(
            Vote {
                proposal: Permalink::from_id("proposal-1").unwrap(),
                choice,
                power,
            },
            authorship("carol.bit"),
            &key(seed),
            DEFAULT_SIGNING_TEMPLATE,
        )
        .unwrap();

        let bytes = serde_json::to_vec(&signed).unwrap();
        let parsed: SignedVote = serde_json::from_slice(&bytes).unwrap();
        prop_assert_eq!(verify_document(&parsed).unwrap(), address_of(&key(seed).verifying_key()));
    }
}
