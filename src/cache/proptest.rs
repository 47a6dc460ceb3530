//! Property-Based Tests for the LRU Store
//!
//! # Test Properties
//!
//! 1. **Byte Accounting**: `bytes()` equals the sum of live entry sizes
//! 2. **Budget**: after every put the store is within budget, or holds a
//!    single oversized entry
//! 3. **Index Consistency**: every live key is reachable through `get`

#![cfg(test)]

use proptest::prelude::*;

use super::lru::LruCache;

#[derive(Debug, Clone)]
enum Op {
    Put(String, String),
    Get(String),
    RemoveOldest,
}

/// Small key space so updates and hits actually happen.
fn op_strategy() -> impl Strategy<Value = Op> {
    let key = "[a-f]{1,3}";
    prop_oneof![
        4 => (key, "[a-z]{0,12}").prop_map(|(k, v)| Op::Put(k, v)),
        3 => key.prop_map(Op::Get),
        1 => Just(Op::RemoveOldest),
    ]
}

fn live_bytes(lru: &LruCache<String>) -> i64 {
    lru.iter().map(|(k, v)| (k.len() + v.len()) as i64).sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: the byte counter always matches the live entries.
    #[test]
    fn prop_byte_accounting(
        max_bytes in -4i64..64,
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let mut lru = LruCache::new(max_bytes, None);
        for op in ops {
            match op {
                Op::Put(k, v) => lru.put(&k, v),
                Op::Get(k) => { lru.get(&k); }
                Op::RemoveOldest => { lru.remove_oldest(); }
            }
            prop_assert_eq!(lru.bytes(), live_bytes(&lru));
            prop_assert_eq!(lru.iter().count(), lru.len());
        }
    }

    /// Property: a positive budget is respected after every put.
    #[test]
    fn prop_budget_respected(
        max_bytes in 1i64..48,
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let mut lru = LruCache::new(max_bytes, None);
        for op in ops {
            if let Op::Put(k, v) = op {
                lru.put(&k, v);
                prop_assert!(
                    lru.bytes() <= max_bytes || lru.len() == 1,
                    "bytes {} over budget {} with {} entries",
                    lru.bytes(), max_bytes, lru.len()
                );
            }
        }
    }

    /// Property: every key yielded by iteration can be fetched.
    #[test]
    fn prop_index_consistent(
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let mut lru = LruCache::new(32, None);
        for op in ops {
            match op {
                Op::Put(k, v) => lru.put(&k, v),
                Op::Get(k) => { lru.get(&k); }
                Op::RemoveOldest => { lru.remove_oldest(); }
            }
        }

        let live: Vec<(String, String)> = lru
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        for (k, v) in live {
            prop_assert_eq!(lru.get(&k), Some(&v));
        }
    }
}
