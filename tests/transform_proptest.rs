mod util;

use std::collections::BTreeMap;

use funnel_extrapolation::factor::{IDENTITY, scale_ratio};
use funnel_extrapolation::model::{
    ActionRequest, ActionResponse, BucketCount, GroupTree, GroupValue, HistogramRequest,
    HistogramResponse, Number, Period,
};
use funnel_extrapolation::policy::scale_count;
use funnel_extrapolation::tree::scale_tree;
use funnel_extrapolation::{ExtrapolationConfig, extrapolate};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use util::{ScriptedExecutor, funnel, funnel_filter, store};

fn group_tree_strategy() -> impl Strategy<Value = GroupTree> {
    let leaf = (0i64..10_000).prop_map(|n| GroupValue::Leaf(Number::Int(n)));
    let value = leaf.prop_recursive(4, 64, 4, |inner| {
        prop::collection::btree_map("[a-z]{1,6}", inner, 1..4).prop_map(GroupValue::Node)
    });
    prop::collection::btree_map("[a-z]{1,6}", value, 0..6)
}

fn leaf_count(tree: &GroupTree) -> usize {
    tree.values()
        .map(|value| match value {
            GroupValue::Leaf(_) => 1,
            GroupValue::Node(children) => leaf_count(children),
        })
        .sum()
}

/// Walk both trees in step; every integer leaf of `after` must be the
/// truncated product of its counterpart in `before`.
fn assert_leaves_scaled(
    before: &GroupTree,
    after: &GroupTree,
    factor: f64,
) -> Result<(), TestCaseError> {
    prop_assert_eq!(before.len(), after.len());
    for ((key, old), (new_key, new)) in before.iter().zip(after) {
        prop_assert_eq!(key, new_key);
        match (old, new) {
            (GroupValue::Leaf(Number::Int(n)), GroupValue::Leaf(Number::Int(m))) => {
                prop_assert_eq!(*m, (*n as f64 * factor) as i64, "leaf {}", key);
            }
            (GroupValue::Node(old), GroupValue::Node(new)) => {
                assert_leaves_scaled(old, new, factor)?;
            }
            (old, new) => {
                return Err(TestCaseError::fail(format!(
                    "shape changed at {key}: {old:?} -> {new:?}"
                )));
            }
        }
    }
    Ok(())
}

fn buckets(counts: &[i64]) -> Vec<BucketCount> {
    counts
        .iter()
        .enumerate()
        .map(|(i, c)| BucketCount::new(i as i64, *c))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn factor_follows_ratio_formula(
        total in 0i64..1_000_000,
        scoped in 1i64..1_000_000,
        percentage in 0.5f64..=100.0,
    ) {
        let factor = scale_ratio(total, scoped, percentage);
        let expected = (total as f64 / scoped as f64) * (100.0 / percentage);
        prop_assert!((factor - expected).abs() <= expected.abs() * 1e-12);
    }

    #[test]
    fn zero_scoped_events_give_identity(total in 0i64..1_000_000, percentage in 0.5f64..=100.0) {
        prop_assert_eq!(scale_ratio(total, 0, percentage), IDENTITY);
    }

    #[test]
    fn identity_factor_keeps_counts(count in -1_000_000i64..1_000_000) {
        prop_assert_eq!(scale_count(count, IDENTITY), count);
    }

    #[test]
    fn every_leaf_is_scaled(mut tree in group_tree_strategy(), factor in 0.1f64..50.0) {
        let leaves = leaf_count(&tree);
        let before = tree.clone();
        prop_assert_eq!(scale_tree(&mut tree, factor), leaves);
        assert_leaves_scaled(&before, &tree, factor)?;
    }

    #[test]
    fn misaligned_histogram_is_unchanged(
        response_counts in prop::collection::vec(0i64..10_000, 0..8),
        base_len in 0usize..8,
    ) {
        prop_assume!(response_counts.len() != base_len);
        let config = ExtrapolationConfig::default();
        let store = store([funnel("7", 50.0)]);
        let totals = vec![40; base_len];
        let scoped = vec![10; base_len];
        let executor = ScriptedExecutor::histograms(&totals, &[("7", scoped)]);
        let request = ActionRequest::Histogram(HistogramRequest::new(
            "events",
            vec![funnel_filter(7)],
            "_timestamp",
            Period::Days,
        ));
        let original = ActionResponse::Histogram(HistogramResponse {
            counts: buckets(&response_counts),
        });

        let scaled = extrapolate(&request, original.clone(), &executor, &store, &config).unwrap();
        prop_assert_eq!(scaled, original);
    }

    #[test]
    fn aligned_histogram_scales_each_bucket(
        response_counts in prop::collection::vec(0i64..10_000, 1..8),
    ) {
        let config = ExtrapolationConfig::default();
        let store = store([funnel("7", 50.0)]);
        let len = response_counts.len();
        let executor = ScriptedExecutor::histograms(&vec![40; len], &[("7", vec![10; len])]);
        let request = ActionRequest::Histogram(HistogramRequest::new(
            "events",
            vec![funnel_filter(7)],
            "_timestamp",
            Period::Days,
        ));
        let response = ActionResponse::Histogram(HistogramResponse {
            counts: buckets(&response_counts),
        });

        let ActionResponse::Histogram(scaled) =
            extrapolate(&request, response, &executor, &store, &config).unwrap()
        else {
            panic!("expected histogram");
        };
        // (40 / 10) * (100 / 50) = 8
        let expected: Vec<i64> = response_counts.iter().map(|c| c * 8).collect();
        let actual: Vec<i64> = scaled.counts.iter().map(|b| b.count).collect();
        prop_assert_eq!(actual, expected);
    }
}

#[test]
fn empty_tree_scales_nothing() {
    let mut tree: GroupTree = BTreeMap::new();
    assert_eq!(scale_tree(&mut tree, 3.0), 0);
}
