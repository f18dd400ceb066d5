#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can call
// the structural invariant checker.

use crate::chained_hash_map::ChainedHashMap;
use crate::config::TableConfig;
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};

// Pool-indexed operations so shrinking moves toward earlier keys and shorter
// op lists.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, i32),
    Get(usize),
    Remove(usize),
    Mutate(usize, i32),
    Snapshot,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-c]{0,3}", 1..=24).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Put(i, v)),
            2 => idx.clone().prop_map(Op::Get),
            2 => idx.clone().prop_map(Op::Remove),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::Snapshot),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn arb_config() -> impl Strategy<Value = TableConfig> {
    (0usize..=8, prop_oneof![Just(0.25), Just(0.5), Just(0.75), Just(1.0), Just(2.0)]).prop_map(
        |(cap, lf)| {
            TableConfig::new()
                .with_initial_capacity(cap)
                .with_load_factor(lf)
        },
    )
}

// Property: state-machine equivalence against std::collections::HashMap.
// After every op:
// - structural invariants hold (cached hash, bucket placement, unique keys,
//   exact len, len / capacity below threshold);
// - `len` and per-key lookups match the model;
// - `put` returns the model's previous value; `remove` returns the model's value.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(config in arb_config(), (pool, ops) in arb_scenario()) {
        let mut sut: ChainedHashMap<str, i32> = ChainedHashMap::with_config(config).unwrap();
        let mut model: HashMap<String, i32> = HashMap::new();

        for op in ops {
            match op {
                Op::Put(i, v) => {
                    let k = &pool[i];
                    let before = sut.capacity();
                    let prev = sut.put(k, v);
                    let model_prev = model.insert(k.clone(), v);
                    prop_assert_eq!(prev, model_prev);
                    if model_prev.is_some() {
                        prop_assert_eq!(sut.capacity(), before, "overwrite must not grow");
                    }
                }
                Op::Get(i) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.get(k), model.get(k));
                    prop_assert_eq!(sut.contains_key(k), model.contains_key(k));
                }
                Op::Remove(i) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.remove(k), model.remove(k));
                    prop_assert!(sut.get(k).is_none());
                }
                Op::Mutate(i, d) => {
                    let k = &pool[i];
                    match (sut.get_mut(k), model.get_mut(k)) {
                        (Some(a), Some(b)) => {
                            *a = a.wrapping_add(d);
                            *b = b.wrapping_add(d);
                        }
                        (None, None) => {}
                        (a, b) => prop_assert!(false, "presence mismatch: {:?} vs {:?}", a, b),
                    }
                }
                Op::Snapshot => {
                    let snap: BTreeMap<String, i32> = sut
                        .entries()
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), *v))
                        .collect();
                    let expected: BTreeMap<String, i32> =
                        model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                    prop_assert_eq!(snap, expected);
                }
            }
            sut.check_invariants();
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
        }
    }
}

// Property: capacity never shrinks and only changes by powers of two.
proptest! {
    #[test]
    fn prop_capacity_monotonic(keys in proptest::collection::vec("[a-z0-9]{1,6}", 1..300)) {
        let mut m: ChainedHashMap<str, usize> = ChainedHashMap::with_capacity(1);
        let mut last = m.capacity();
        for (i, k) in keys.iter().enumerate() {
            m.put(k, i);
            if i % 3 == 0 {
                m.remove(k);
            }
            let cap = m.capacity();
            prop_assert!(cap >= last);
            prop_assert!(cap.is_power_of_two());
            prop_assert_eq!(cap % last, 0);
            last = cap;
        }
        m.check_invariants();
    }
}
