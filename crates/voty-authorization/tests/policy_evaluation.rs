//! Policy and weight tree evaluation against in-memory chains

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_matches::assert_matches;
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;
use voty_authorization::{EvaluationError, PolicyEvaluator, Verifier};
use voty_core::{CoinType, Did, PolicyNode, Snapshot, SnapshotSet, WeightNode};
use voty_testkit::{init_tracing, TestEnv};

const CONTRACT: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

fn setup() -> (TestEnv, Verifier) {
    init_tracing();
    let env = TestEnv::new();
    let verifier = env.verifier();
    (env, verifier)
}

fn did(value: &str) -> Did {
    Did::parse(value).unwrap()
}

fn exact(dids: &[&str]) -> PolicyNode {
    PolicyNode::predicate("exact_did", vec![json!(dids)])
}

fn owns(coin_type: CoinType) -> PolicyNode {
    PolicyNode::predicate("owns_erc721", vec![json!(coin_type.value()), json!(CONTRACT)])
}

fn fixed(dids: &[&str], power: f64) -> WeightNode {
    WeightNode::leaf("exact_did_fixed_power", vec![json!(dids), json!(power)])
}

fn balance_weight() -> WeightNode {
    WeightNode::leaf(
        "erc20_balance",
        vec![json!(CoinType::MATIC.value()), json!(CONTRACT), json!(0)],
    )
}

fn snapshots(env: &TestEnv, coin_types: &[CoinType]) -> SnapshotSet {
    coin_types
        .iter()
        .map(|&coin_type| (coin_type, Snapshot::new(env.height(coin_type))))
        .collect()
}

fn required(evaluator: &PolicyEvaluator, node: &PolicyNode) -> BTreeSet<CoinType> {
    evaluator.required_coin_types(node).unwrap()
}

#[tokio::test]
async fn test_vacuous_groups() {
    let (_env, verifier) = setup();
    let evaluator = verifier.evaluator();
    let alice = did("alice.bit");
    let empty = SnapshotSet::new();

    let and = evaluator
        .evaluate_policy(&PolicyNode::and(vec![]), &alice, &empty)
        .await
        .unwrap();
    let or = evaluator
        .evaluate_policy(&PolicyNode::or(vec![]), &alice, &empty)
        .await
        .unwrap();
    assert!(and);
    assert!(!or);
}

#[tokio::test]
async fn test_nested_single_leaf_equals_leaf() {
    let (_env, verifier) = setup();
    let evaluator = verifier.evaluator();
    let empty = SnapshotSet::new();

    for (who, expected) in [("alice.bit", true), ("bob.bit", false)] {
        let leaf = exact(&["alice.bit"]);
        let nested = PolicyNode::and(vec![PolicyNode::and(vec![leaf.clone()])]);
        let direct = evaluator
            .evaluate_policy(&leaf, &did(who), &empty)
            .await
            .unwrap();
        let wrapped = evaluator
            .evaluate_policy(&nested, &did(who), &empty)
            .await
            .unwrap();
        assert_eq!(direct, expected);
        assert_eq!(wrapped, expected);
    }
}

#[tokio::test]
async fn test_short_circuit_skips_asset_leaf_but_not_prefetch() {
    let (env, verifier) = setup();
    let evaluator = verifier.evaluator();
    let policy = PolicyNode::or(vec![
        PolicyNode::and(vec![exact(&["alice.bit"])]),
        PolicyNode::and(vec![owns(CoinType::ETH)]),
    ]);

    assert_eq!(required(evaluator, &policy), BTreeSet::from([CoinType::ETH]));

    let at = snapshots(&env, &[CoinType::ETH, CoinType::CKB]);
    let allowed = evaluator
        .evaluate_policy(&policy, &did("alice.bit"), &at)
        .await
        .unwrap();
    assert!(allowed);
    assert_eq!(env.stats.calls(), 0, "first branch decides without chain reads");

    // The tree-wide requirement holds even when the first branch would succeed.
    let err = evaluator
        .evaluate_policy(&policy, &did("alice.bit"), &snapshots(&env, &[CoinType::ETH]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EvaluationError::MissingSnapshot {
            coin_type: CoinType::CKB
        }
    );
    let err = evaluator
        .evaluate_policy(&policy, &did("alice.bit"), &SnapshotSet::new())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EvaluationError::MissingSnapshot {
            coin_type: CoinType::ETH
        }
    );
}

#[tokio::test]
async fn test_asset_leaf_reads_balance_of_resolved_address() {
    let (env, verifier) = setup();
    let evaluator = verifier.evaluator();
    let bob = env.signer("bob.bit", 3);
    env.eth.set_balance(CONTRACT, &bob.address(), 1);

    let policy = PolicyNode::or(vec![
        PolicyNode::and(vec![exact(&["alice.bit"])]),
        PolicyNode::and(vec![owns(CoinType::ETH)]),
    ]);
    let at = snapshots(&env, &[CoinType::ETH, CoinType::CKB]);

    assert!(evaluator.evaluate_policy(&policy, bob.did(), &at).await.unwrap());

    let carol = env.signer("carol.bit", 4);
    assert!(!evaluator.evaluate_policy(&policy, carol.did(), &at).await.unwrap());
}

#[tokio::test]
async fn test_asset_leaf_without_resolver_snapshot() {
    let (env, verifier) = setup();
    let bob = env.signer("bob.bit", 3);
    let err = verifier
        .evaluator()
        .evaluate_policy(&owns(CoinType::ETH), bob.did(), &snapshots(&env, &[CoinType::ETH]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EvaluationError::MissingSnapshot {
            coin_type: CoinType::CKB
        }
    );
    assert!(err.is_consistency_error());
    assert_eq!(env.stats.calls(), 0, "coverage is checked before any chain read");

    let err = verifier
        .evaluator()
        .evaluate_weight(&balance_weight(), bob.did(), &snapshots(&env, &[CoinType::MATIC]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EvaluationError::MissingSnapshot {
            coin_type: CoinType::CKB
        }
    );
}

#[test]
fn test_identity_reads_follow_the_resolver() {
    let (_env, verifier) = setup();
    let evaluator = verifier.evaluator();
    let asset = evaluator.compile_policy(&owns(CoinType::ETH)).unwrap();
    let listed = evaluator.compile_policy(&exact(&["alice.bit"])).unwrap();

    assert_eq!(
        evaluator.policy_reads(&asset, &did("alice.bit")).unwrap(),
        BTreeSet::from([CoinType::ETH, CoinType::CKB])
    );
    assert_eq!(
        evaluator.policy_reads(&asset, &did("alice.eth")).unwrap(),
        BTreeSet::from([CoinType::ETH])
    );
    assert_eq!(
        evaluator.policy_reads(&listed, &did("alice.bit")).unwrap(),
        BTreeSet::new()
    );

    let weight = evaluator.compile_weight(&balance_weight()).unwrap();
    assert_eq!(
        evaluator.weight_reads(&weight, &did("bob.bit")).unwrap(),
        BTreeSet::from([CoinType::MATIC, CoinType::CKB])
    );
}

#[tokio::test]
async fn test_unknown_function_is_an_error() {
    let (_env, verifier) = setup();
    let policy = PolicyNode::or(vec![
        exact(&["alice.bit"]),
        PolicyNode::predicate("holds_governance_token", vec![]),
    ]);
    let err = verifier
        .evaluator()
        .evaluate_policy(&policy, &did("alice.bit"), &SnapshotSet::new())
        .await
        .unwrap_err();
    assert_matches!(err, EvaluationError::UnknownFunction { name } if name == "holds_governance_token");
}

#[test]
fn test_invalid_arguments_rejected_at_bind() {
    let (_env, verifier) = setup();
    let evaluator = verifier.evaluator();
    let cases = [
        PolicyNode::predicate("exact_did", vec![]),
        PolicyNode::predicate("exact_did", vec![json!("alice.bit")]),
        PolicyNode::predicate("owns_erc721", vec![json!(60), json!("0xAAA")]),
        PolicyNode::predicate("owns_erc721", vec![json!(12345), json!(CONTRACT)]),
        PolicyNode::predicate(
            "prefixes_dot_suffix_exact_match",
            vec![json!("alice.sol"), json!([])],
        ),
    ];
    for case in cases {
        assert_matches!(
            evaluator.compile_policy(&case),
            Err(EvaluationError::InvalidArguments { .. }),
            "{case:?}"
        );
    }
}

#[test]
fn test_prefix_leaf_requires_family_chain() {
    let (_env, verifier) = setup();
    let node = PolicyNode::predicate(
        "prefixes_dot_suffix_exact_match",
        vec![json!("alice.bit"), json!(["dev"])],
    );
    assert_eq!(
        required(verifier.evaluator(), &node),
        BTreeSet::from([CoinType::CKB])
    );
}

#[tokio::test]
async fn test_weight_fold() {
    let (_env, verifier) = setup();
    let evaluator = verifier.evaluator();
    let alice = did("alice.bit");
    let empty = SnapshotSet::new();

    let a = fixed(&["alice.bit"], 3.0);
    let b = fixed(&["alice.bit", "bob.bit"], 5.5);
    let sum = evaluator
        .evaluate_weight(&WeightNode::sum(vec![a.clone(), b.clone()]), &alice, &empty)
        .await
        .unwrap();
    let max = evaluator
        .evaluate_weight(&WeightNode::max(vec![a, b]), &alice, &empty)
        .await
        .unwrap();
    assert_eq!(sum, 8.5);
    assert_eq!(max, 5.5);

    for empty_group in [WeightNode::sum(vec![]), WeightNode::max(vec![])] {
        let power = evaluator
            .evaluate_weight(&empty_group, &alice, &empty)
            .await
            .unwrap();
        assert_eq!(power, 0.0);
    }
}

#[tokio::test]
async fn test_token_weight_scales_by_decimals() {
    let (env, verifier) = setup();
    let bob = env.signer("bob.bit", 3);
    env.matic
        .set_balance(CONTRACT, &bob.address(), 2_500_000_000_000_000_000);

    let node = WeightNode::leaf(
        "erc20_balance",
        vec![json!(CoinType::MATIC.value()), json!(CONTRACT), json!(18)],
    );
    let power = verifier
        .evaluator()
        .evaluate_weight(&node, bob.did(), &snapshots(&env, &[CoinType::MATIC, CoinType::CKB]))
        .await
        .unwrap();
    assert!((power - 2.5).abs() < 1e-12);
}

fn leaf_strategy() -> impl Strategy<Value = PolicyNode> {
    prop_oneof![
        Just(exact(&["alice.bit"])),
        Just(owns(CoinType::ETH)),
        Just(owns(CoinType::MATIC)),
        Just(owns(CoinType::BSC)),
        Just(PolicyNode::predicate(
            "prefixes_dot_suffix_exact_match",
            vec![json!("dao.bit"), json!([])],
        )),
    ]
}

fn nest_left(leaves: &[PolicyNode], and: bool) -> PolicyNode {
    let group = |operands| {
        if and {
            PolicyNode::and(operands)
        } else {
            PolicyNode::or(operands)
        }
    };
    leaves
        .iter()
        .cloned()
        .fold(group(vec![]), |acc, leaf| group(vec![acc, leaf]))
}

proptest! {
    #[test]
    fn prop_required_set_is_union_of_leaves(
        leaves in prop::collection::vec(leaf_strategy(), 0..12),
        split in 0usize..12,
        and in any::<bool>(),
    ) {
        let (_env, verifier) = setup();
        let evaluator = verifier.evaluator();

        let union: BTreeSet<CoinType> = leaves
            .iter()
            .flat_map(|leaf| required(evaluator, leaf))
            .collect();

        let flat = if and {
            PolicyNode::and(leaves.clone())
        } else {
            PolicyNode::or(leaves.clone())
        };
        let split = split.min(leaves.len());
        let halves = vec![
            PolicyNode::and(leaves[..split].to_vec()),
            PolicyNode::or(leaves[split..].to_vec()),
        ];
        let mixed = PolicyNode::or(halves);
        let deep = nest_left(&leaves, and);

        prop_assert_eq!(&required(evaluator, &flat), &union);
        prop_assert_eq!(&required(evaluator, &mixed), &union);
        prop_assert_eq!(&required(evaluator, &deep), &union);
    }

    #[test]
    fn prop_weight_sum_and_max(a in 0.0f64..1e6, b in 0.0f64..1e6) {
        let (_env, verifier) = setup();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let alice = did("alice.bit");
        let empty = SnapshotSet::new();
        let left = fixed(&["alice.bit"], a);
        let right = fixed(&["alice.bit"], b);

        let (sum, max) = runtime.block_on(async {
            let evaluator = verifier.evaluator();
            let sum = evaluator
                .evaluate_weight(
                    &WeightNode::sum(vec![left.clone(), right.clone()]),
                    &alice,
                    &empty,
                )
                .await
                .unwrap();
            let max = evaluator
                .evaluate_weight(&WeightNode::max(vec![left, right]), &alice, &empty)
                .await
                .unwrap();
            (sum, max)
        });

        prop_assert_eq!(sum, a + b);
        prop_assert_eq!(max, a.max(b));
    }
}
