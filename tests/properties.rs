//! Property tests for operator algebra

use std::sync::Arc;

use proptest::prelude::*;
use recast_core::config::EngineConfig;
use recast_core::diag::NullSink;
use recast_exec::Engine;
use recast_planner::Pipeline;
use serde_json::{json, Value};

fn apply(transforms: Value, input: &Value) -> Value {
    let pipeline = Pipeline::from_value(
        &json!({ "transforms": transforms }),
        &EngineConfig::default(),
    )
    .unwrap();
    Engine::default()
        .with_sink(Arc::new(NullSink))
        .run(&pipeline, input)
        .unwrap()
        .output
}

fn len(v: &Value) -> usize {
    v.as_array().map_or(0, Vec::len)
}

fn record() -> impl Strategy<Value = Value> {
    (
        -50i64..50,
        prop::sample::select(vec!["a", "b", "c", "ab"]),
        prop::option::of(0i64..3),
    )
        .prop_map(|(n, s, k)| match k {
            Some(k) => json!({"n": n, "s": s, "k": k}),
            None => json!({"n": n, "s": s}),
        })
}

fn records() -> impl Strategy<Value = Value> {
    prop::collection::vec(record(), 0..40).prop_map(Value::Array)
}

fn condition() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "n > 0",
        "n <= 10",
        "s == 'a'",
        "s contains 'b'",
        "s startswith 'a'",
        "k != null",
        "k >= 1",
    ])
}

proptest! {
    #[test]
    fn test_filter_is_idempotent(input in records(), cond in condition()) {
        let once = apply(json!([{ "filter": cond }]), &input);
        let twice = apply(json!([{ "filter": cond }]), &once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_limit_keeps_min_of_len_and_n(input in records(), n in 0usize..60) {
        let out = apply(json!([{ "limit": n }]), &input);
        prop_assert_eq!(len(&out), len(&input).min(n));
        if n == 0 {
            prop_assert_eq!(out, json!([]));
        }
    }

    #[test]
    fn test_skip_and_limit_partition_the_input(input in records(), n in 0usize..60) {
        let head = apply(json!([{ "limit": n }]), &input);
        let tail = apply(json!([{ "skip": n }]), &input);
        prop_assert_eq!(len(&head) + len(&tail), len(&input));
    }

    #[test]
    fn test_sort_desc_is_reversed_asc_for_distinct_keys(
        keys in prop::collection::hash_set(-1000i64..1000, 0..30)
    ) {
        let input = Value::Array(keys.into_iter().map(|n| json!({ "n": n })).collect());
        let asc = apply(json!([{ "sort": "n asc" }]), &input);
        let desc = apply(json!([{ "sort": "n desc" }]), &input);
        let mut reversed = asc.as_array().cloned().unwrap_or_default();
        reversed.reverse();
        prop_assert_eq!(Value::Array(reversed), desc);
    }

    #[test]
    fn test_group_sum_is_conserved(input in records()) {
        let out = apply(
            json!([{ "group": { "by": "s", "aggregations": { "total": { "op": "sum", "field": "n" } } } }]),
            &input,
        );
        let grouped: i64 = out
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["total"].as_i64().unwrap())
            .sum();
        let direct: i64 = input
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["n"].as_i64().unwrap())
            .sum();
        prop_assert_eq!(grouped, direct);
        let counted: i64 = out
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["_count"].as_i64().unwrap())
            .sum();
        prop_assert_eq!(counted as usize, len(&input));
    }

    #[test]
    fn test_distinct_shrinks_and_is_idempotent(input in records(), by_key in any::<bool>()) {
        let step = if by_key { json!([{ "distinct": ["s", "k"] }]) } else { json!([{ "distinct": null }]) };
        let once = apply(step.clone(), &input);
        prop_assert!(len(&once) <= len(&input));
        let twice = apply(step, &once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_runs_are_deterministic(input in records(), cond in condition()) {
        let steps = json!([
            { "filter": cond },
            { "compute": { "m": "n * 2 - 1" } },
            { "sort": ["s", "m desc"] },
            { "addIndex": "i" }
        ]);
        prop_assert_eq!(apply(steps.clone(), &input), apply(steps, &input));
    }
}
