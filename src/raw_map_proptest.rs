#![cfg(test)]

// Property tests for RawSqlMap kept inside the crate so they can walk the
// chain index directly after every step.

use crate::config::MapConfig;
use crate::raw_map::RawSqlMap;
use proptest::prelude::*;
use std::collections::HashMap;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    Get(usize),
    Remove(usize),
    Contains(String),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            2 => idx.clone().prop_map(OpI::Get),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `get` returns the last value put for a live key and `None` otherwise.
// - `remove` reports true exactly when the model held the key.
// - `len` tracks live keys; `slot_count` grows by one per put and never shrinks.
// - Every chain node sits in `hash mod buckets` and points at an issued slot,
//   including across rehashes forced by a tiny initial bucket count.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario(), buckets in 1usize..=4) {
        let config = MapConfig::builder().initial_bucket_count(buckets).build().unwrap();
        let mut sut: RawSqlMap<i32> = RawSqlMap::with_config(config).unwrap();
        let mut model: HashMap<String, i32> = HashMap::new();
        let mut puts = 0usize;

        for op in ops {
            match op {
                OpI::Put(i, v) => {
                    let k = &pool[i];
                    sut.put(k, v).unwrap();
                    model.insert(k.clone(), v);
                    puts += 1;
                }
                OpI::Get(i) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.get(k).unwrap(), model.get(k));
                }
                OpI::Remove(i) => {
                    let k = &pool[i];
                    let removed = sut.remove(k).unwrap();
                    prop_assert_eq!(removed, model.remove(k).is_some());
                    prop_assert_eq!(sut.get(k).unwrap(), None);
                }
                OpI::Contains(s) => {
                    prop_assert_eq!(sut.contains_key(&s), model.contains_key(&s));
                }
            }

            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            prop_assert_eq!(sut.slot_count(), puts);
            sut.assert_consistent();
        }

        let stats = sut.stats();
        prop_assert_eq!(stats.entries + stats.orphaned_slots, stats.slots);
        for (k, v) in &model {
            prop_assert_eq!(sut.get(k).unwrap(), Some(v));
        }
    }
}

// Property: overwrite churn on a fixed key set keeps `len` constant while the
// slot array grows monotonically, and the final values win.
proptest! {
    #[test]
    fn prop_update_churn_orphans_slots(keys in 1usize..=6, rounds in 1usize..=20) {
        let mut sut: RawSqlMap<usize> = RawSqlMap::new().unwrap();
        for r in 0..rounds {
            for k in 0..keys {
                sut.put(&format!("k{}", k), r * 100 + k).unwrap();
            }
            prop_assert_eq!(sut.len(), keys);
        }
        prop_assert_eq!(sut.slot_count(), keys * rounds);
        prop_assert_eq!(sut.stats().orphaned_slots, keys * (rounds - 1));
        for k in 0..keys {
            prop_assert_eq!(sut.get(&format!("k{}", k)).unwrap(), Some(&((rounds - 1) * 100 + k)));
        }
    }
}
