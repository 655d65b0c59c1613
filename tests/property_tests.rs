//! Property tests for the eviction invariants
//!
//! Random workloads of statement checkouts and returns are replayed against the
//! cache while tracking which delegates callers still hold.

use parking_lot::Mutex;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use stmtcache::{ListenerError, LruStatementCache, PreparedStatementKey, StatementHandle};

type Key = PreparedStatementKey<u32>;

fn shell(id: u8) -> Key {
    PreparedStatementKey::new(format!("SELECT * FROM t{}", id))
}

fn recording_cache(max_size: i32) -> (LruStatementCache<Key>, Arc<Mutex<Vec<u32>>>) {
    let disposed = Arc::new(Mutex::new(Vec::new()));
    let sink = disposed.clone();
    let mut cache: LruStatementCache<Key> = LruStatementCache::new(max_size);
    cache.add_eviction_listener(Arc::new(move |d: &u32| -> Result<(), ListenerError> {
        sink.lock().push(*d);
        Ok(())
    }));
    (cache, disposed)
}

/// Checks statement `id` out: reuse the cached one or register a fresh delegate.
fn check_out(cache: &mut LruStatementCache<Key>, id: u8, next_delegate: &mut u32) -> Key {
    match cache.lookup(shell(id)) {
        Some(handle) => handle,
        None => {
            *next_delegate += 1;
            cache
                .offer(shell(id).with_delegate(*next_delegate))
                .unwrap()
                .into_inner()
        }
    }
}

#[derive(Debug, Clone)]
enum Op {
    CheckOut(u8),
    /// Close the statement checked out longest ago
    Return,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![(0u8..8).prop_map(Op::CheckOut), Just(Op::Return)]
}

proptest! {
    #[test]
    fn prop_in_use_entries_survive_and_cache_converges(
        max_size in 1i32..5,
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let (mut cache, disposed) = recording_cache(max_size);
        let mut held: Vec<Key> = Vec::new();
        let mut next_delegate = 0u32;
        let mut seen: HashSet<u8> = HashSet::new();

        for op in ops {
            match op {
                Op::CheckOut(id) => {
                    seen.insert(id);
                    held.push(check_out(&mut cache, id, &mut next_delegate));
                }
                Op::Return => {
                    if !held.is_empty() {
                        let handle = held.remove(0);
                        cache.offer(handle).unwrap();
                    }
                }
            }

            // Nothing a caller still holds has been disposed
            let gone = disposed.lock();
            for handle in &held {
                let delegate = handle.delegate().unwrap();
                prop_assert!(!gone.contains(delegate));
                prop_assert!(cache.contains(handle));
            }
        }

        for handle in held.drain(..) {
            cache.offer(handle).unwrap();
        }

        prop_assert_eq!(cache.len(), (max_size as usize).min(seen.len()));

        // Every delegate was disposed at most once
        let gone = disposed.lock();
        let unique: HashSet<&u32> = gone.iter().collect();
        prop_assert_eq!(unique.len(), gone.len());
    }

    #[test]
    fn prop_lookup_then_offer_preserves_usage(
        checked_in in any::<bool>(),
        cycles in 1usize..10,
    ) {
        let (mut cache, _) = recording_cache(4);
        cache.offer(shell(1).with_delegate(1)).unwrap();
        if checked_in {
            cache.offer(shell(1).with_delegate(1)).unwrap();
        }
        let before = cache.usage_count(&shell(1));

        for _ in 0..cycles {
            let handle = cache.lookup(shell(1)).unwrap();
            cache.offer(handle).unwrap();
            prop_assert_eq!(cache.usage_count(&shell(1)), before);
        }
    }

    #[test]
    fn prop_disabled_cache_stays_empty(
        max_size in -5i32..=0,
        ids in prop::collection::vec(0u8..10, 0..50),
    ) {
        let (mut cache, disposed) = recording_cache(max_size);
        for id in ids {
            prop_assert!(cache.lookup(shell(id)).is_none());
            let offered = cache.offer(shell(id).with_delegate(id as u32)).unwrap();
            prop_assert!(!offered.is_cached());
            let inner = offered.into_inner();
            prop_assert_eq!(inner.delegate(), Some(&(id as u32)));
        }
        prop_assert!(cache.is_empty());
        prop_assert!(disposed.lock().is_empty());
    }

    #[test]
    fn prop_clear_is_exhaustive(
        ids in prop::collection::hash_set(0u8..50, 0..30),
        returned in prop::collection::vec(any::<bool>(), 30),
    ) {
        let (mut cache, disposed) = recording_cache(8);
        for (i, &id) in ids.iter().enumerate() {
            cache.offer(shell(id).with_delegate(id as u32)).unwrap();
            if returned[i] {
                cache.offer(shell(id).with_delegate(id as u32)).unwrap();
            }
        }
        let tracked_before = cache.len();
        let evicted_before = disposed.lock().len();

        cache.clear().unwrap();

        prop_assert!(cache.is_empty());
        let gone = disposed.lock();
        prop_assert_eq!(gone.len() - evicted_before, tracked_before);

        // Evictions plus the clear disposed every offered delegate exactly once
        let unique: HashSet<u32> = gone.iter().copied().collect();
        let offered: HashSet<u32> = ids.iter().map(|&id| id as u32).collect();
        prop_assert_eq!(unique.len(), gone.len());
        prop_assert_eq!(unique, offered);
    }
}
