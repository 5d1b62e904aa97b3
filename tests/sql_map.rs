// SqlMap integration test suite.
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Round trip: after put(k, v), get(k) == v, across rehashes.
// - Upsert: last write wins; entry count grows once per distinct key.
// - Removal: true exactly once per live key; absent afterwards.
// - Identity: keys compare by content, not by caller allocation.
// - Serialization: concurrent writers under the lock lose no updates.
// - Lifecycle: a destroyed handle reports UseAfterFree.
use sql_map::{Interner, MapConfig, MapError, PutError, RawSqlMap, SqlMap};
use std::sync::{Arc, Barrier};
use std::thread;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Test: the reference walkthrough.
// Verifies: put/get/remove interplay on two keys.
#[test]
fn alice_and_bob_scenario() {
    init_tracing();
    let m = SqlMap::new().unwrap();
    m.put("alice", 42).unwrap();
    m.put("bob", 7).unwrap();
    assert_eq!(m.get("alice").unwrap(), Some(42));
    assert!(m.remove("alice").unwrap());
    assert_eq!(m.get("alice").unwrap(), None);
    assert_eq!(m.get("bob").unwrap(), Some(7));
    assert!(!m.remove("alice").unwrap());
}

// Test: last-write-wins upsert.
// Assumes: overwrites append a new slot.
// Verifies: value replaced, len grows by exactly one, slot count by two.
#[test]
fn upsert_counts_one_entry() {
    let m = SqlMap::new().unwrap();
    let before = m.len().unwrap();
    m.put("k", "v1").unwrap();
    m.put("k", "v2").unwrap();
    assert_eq!(m.get("k").unwrap(), Some("v2"));
    assert_eq!(m.len().unwrap(), before + 1);
    let stats = m.stats().unwrap();
    assert_eq!(stats.slots, 2);
    assert_eq!(stats.orphaned_slots, 1);
}

// Test: never-inserted keys.
// Verifies: get is None, contains_key is false, remove is false.
#[test]
fn unknown_key_is_absent() {
    let m: SqlMap<u32> = SqlMap::new().unwrap();
    assert_eq!(m.get("nope").unwrap(), None);
    assert!(!m.contains_key("nope").unwrap());
    assert!(!m.remove("nope").unwrap());
    assert!(m.is_empty().unwrap());
}

// Test: remove then reinsert.
// Verifies: remove is true once, then false until the key is put again.
#[test]
fn remove_reinsert_cycle() {
    let m = SqlMap::new().unwrap();
    for round in 0..3 {
        m.put("cycle", round).unwrap();
        assert_eq!(m.get("cycle").unwrap(), Some(round));
        assert!(m.remove("cycle").unwrap());
        assert!(!m.remove("cycle").unwrap());
        assert_eq!(m.get("cycle").unwrap(), None);
    }
    assert_eq!(m.stats().unwrap().slots, 3);
}

// Test: rehash preserves every binding.
// Assumes: 1031 buckets and a 0.70 threshold, so 1000 keys force growth.
// Verifies: at least one rehash happened and all keys round-trip.
#[test]
fn round_trip_survives_rehash() {
    init_tracing();
    let m = SqlMap::new().unwrap();
    let n = 1_000usize;
    for i in 0..n {
        m.put(&format!("row:{}", i), i).unwrap();
    }
    let stats = m.stats().unwrap();
    assert!(stats.rehashes >= 1);
    assert!(stats.buckets >= 2062);
    for i in 0..n {
        assert_eq!(m.get(&format!("row:{}", i)).unwrap(), Some(i));
    }
    assert_eq!(m.len().unwrap(), n);
}

// Test: content identity of keys.
// Verifies: a separately built String with equal text finds the entry.
#[test]
fn equal_text_is_same_key() {
    let m = SqlMap::new().unwrap();
    m.put("x", 1).unwrap();
    let fresh: String = "x".chars().collect();
    assert_eq!(m.get(&fresh).unwrap(), Some(1));
    m.put(&fresh, 2).unwrap();
    assert_eq!(m.len().unwrap(), 1);
    assert_eq!(m.get("x").unwrap(), Some(2));
}

// Test: serialized concurrent writers with a start barrier.
// Assumes: the table lock covers rehash.
// Verifies: every distinct key written from any thread is retrievable.
#[test]
fn concurrent_distinct_puts_all_land() {
    let threads = 8;
    let per_thread = 500;
    let m = Arc::new(
        SqlMap::with_config(MapConfig::builder().initial_bucket_count(16).build().unwrap())
            .unwrap(),
    );
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let m = Arc::clone(&m);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    m.put(&format!("{}:{}", t, i), (t, i)).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(m.len().unwrap(), threads * per_thread);
    for t in 0..threads {
        for i in 0..per_thread {
            assert_eq!(m.get(&format!("{}:{}", t, i)).unwrap(), Some((t, i)));
        }
    }
}

// Test: mixed readers and writers on overlapping keys.
// Verifies: readers only ever observe values some writer put.
#[test]
fn concurrent_readers_see_written_values() {
    let m = Arc::new(SqlMap::new().unwrap());
    m.put("shared", 0u64).unwrap();
    let writers: Vec<_> = (1..=4u64)
        .map(|w| {
            let m = Arc::clone(&m);
            thread::spawn(move || {
                for i in 0..200u64 {
                    m.put("shared", w * 1_000 + i).unwrap();
                }
            })
        })
        .collect();
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let m = Arc::clone(&m);
            thread::spawn(move || {
                for _ in 0..200 {
                    let v = m.get("shared").unwrap().expect("key stays live");
                    assert!(v == 0 || (v / 1_000 >= 1 && v / 1_000 <= 4 && v % 1_000 < 200));
                }
            })
        })
        .collect();
    for h in writers.into_iter().chain(readers) {
        h.join().unwrap();
    }
    assert_eq!(m.len().unwrap(), 1);
    assert_eq!(m.stats().unwrap().slots, 801);
}

// Test: tables on different threads sharing one interner.
// Assumes: the interner has its own lock.
// Verifies: no race inside the pool; each text pooled once.
#[test]
fn shared_interner_across_threads() {
    let interner = Interner::new();
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let interner = interner.clone();
            thread::spawn(move || {
                let m = SqlMap::with_interner(MapConfig::default(), interner).unwrap();
                for i in 0..300 {
                    m.put(&format!("col_{}", i), t).unwrap();
                }
                for i in 0..300 {
                    assert_eq!(m.get(&format!("col_{}", i)).unwrap(), Some(t));
                }
                m.destroy().unwrap().len()
            })
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), 300);
    }
    assert_eq!(interner.len(), 300);
}

// Test: teardown hands back caller-owned handles.
// Assumes: values are Arc handles the caller also holds.
// Verifies: destroy returns every stored handle (orphans included) and
// the caller's handles stay valid.
#[test]
fn destroy_returns_caller_handles() {
    let a = Arc::new(String::from("row a"));
    let b = Arc::new(String::from("row b"));
    let m = SqlMap::new().unwrap();
    m.put("a", Arc::clone(&a)).unwrap();
    m.put("b", Arc::clone(&b)).unwrap();
    m.put("a", Arc::clone(&b)).unwrap();

    let returned = m.destroy().unwrap();
    assert_eq!(returned.len(), 3);
    assert!(Arc::ptr_eq(&returned[0], &a));
    assert!(Arc::ptr_eq(&returned[2], &b));
    drop(returned);
    assert_eq!(Arc::strong_count(&a), 1);
    assert_eq!(*a, "row a");
}

// Test: use after destroy from another thread.
// Verifies: a clone of the Arc sees UseAfterFree once any holder destroys.
#[test]
fn destroy_is_visible_to_other_holders() {
    let m = Arc::new(SqlMap::new().unwrap());
    m.put("k", 1).unwrap();
    let other = Arc::clone(&m);
    m.destroy().unwrap();
    let res = thread::spawn(move || other.get("k")).join().unwrap();
    assert_eq!(res, Err(MapError::UseAfterFree));
}

// Test: the unsynchronized controller.
// Verifies: the same upsert/remove semantics without a lock.
#[test]
fn raw_map_matches_locked_semantics() {
    let mut raw = RawSqlMap::new().unwrap();
    raw.put("alice", 42).unwrap();
    raw.put("bob", 7).unwrap();
    assert_eq!(raw.get("alice").unwrap(), Some(&42));
    assert!(raw.remove("alice").unwrap());
    assert_eq!(raw.get("alice").unwrap(), None);
    assert_eq!(raw.get("bob").unwrap(), Some(&7));
    assert!(!raw.remove("alice").unwrap());
    assert_eq!(raw.destroy(), vec![42, 7]);
}

// Test: configuration errors surface at construction.
#[test]
fn bad_config_is_rejected() {
    let config = MapConfig {
        max_load_factor: 0.0,
        ..MapConfig::default()
    };
    assert!(matches!(
        SqlMap::<u8>::with_config(config),
        Err(MapError::Config(_))
    ));
}

// Test: a locked put that runs out of memory.
// Assumes: a growth factor of usize::MAX makes the next rehash unallocatable.
// Verifies: OutOfMemory comes back with the caller's handle and the table is
// unchanged; after destroy, UseAfterFree also returns the handle.
#[test]
fn rejected_put_returns_the_handle() {
    init_tracing();
    let config = MapConfig::builder()
        .initial_bucket_count(1)
        .growth_factor(usize::MAX)
        .build()
        .unwrap();
    let m = SqlMap::with_config(config).unwrap();
    m.put("a", Arc::new(String::from("row a"))).unwrap();

    let b = Arc::new(String::from("row b"));
    let PutError { error, value } = m.put("b", Arc::clone(&b)).unwrap_err();
    assert!(matches!(error, MapError::OutOfMemory { .. }));
    assert!(Arc::ptr_eq(&value, &b));
    assert_eq!(Arc::strong_count(&b), 2);

    let stats = m.stats().unwrap();
    assert_eq!((stats.entries, stats.slots, stats.buckets), (1, 1, 1));
    assert_eq!(m.get("b").unwrap(), None);
    assert_eq!(m.get("a").unwrap().as_deref().map(String::as_str), Some("row a"));

    // After destroy the rejection reason changes but the value still returns.
    m.destroy().unwrap();
    let err = m.put("b", value).unwrap_err();
    assert_eq!(err.error, MapError::UseAfterFree);
    drop(err);
    assert_eq!(Arc::strong_count(&b), 1);
}
