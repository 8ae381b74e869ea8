//! Caller-owned memoisation of estimates
//!
//! Estimators are pure, so a result can be reused for as long as the caller
//! keeps the same snapshot and request. The memo is keyed by both, compared
//! in full on lookup, and is never shared implicitly: each caller owns one
//! and decides when to invalidate it, typically after rebuilding the
//! `ExchangeInfo` on refetch.

use crate::exchange::ExchangeInfo;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::trace;

/// Default number of entries kept before the memo starts over
pub const DEFAULT_MEMO_CAPACITY: usize = 256;

/// Key identifying one estimate request against one pool snapshot
///
/// Holds its inputs rather than a digest of them, so entries whose hashes
/// collide still compare unequal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoKey<R> {
    exchange: ExchangeInfo,
    request: R,
}

impl<R: Hash + Eq> MemoKey<R> {
    pub fn new(exchange: &ExchangeInfo, request: R) -> Self {
        Self {
            exchange: exchange.clone(),
            request,
        }
    }

    pub fn request(&self) -> &R {
        &self.request
    }
}

/// Memo of computed estimates of one kind
#[derive(Debug, Clone)]
pub struct EstimateMemo<R, V> {
    entries: HashMap<MemoKey<R>, V>,
    capacity: usize,
}

impl<R: Hash + Eq, V: Clone> EstimateMemo<R, V> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMO_CAPACITY)
    }

    /// A full memo is cleared before the next insert
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.min(DEFAULT_MEMO_CAPACITY)),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &MemoKey<R>) -> Option<&V> {
        self.entries.get(key)
    }

    /// Cached value for `key`, computing and storing it on a miss
    ///
    /// Errors are returned to the caller and never cached.
    pub fn get_or_compute<E>(
        &mut self,
        key: MemoKey<R>,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.entries.get(&key) {
            trace!(entries = self.entries.len(), "estimate memo hit");
            return Ok(value.clone());
        }

        let value = compute()?;
        if self.entries.len() >= self.capacity {
            self.entries.clear();
        }
        self.entries.insert(key, value.clone());
        Ok(value)
    }

    /// Drop every cached estimate
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<R: Hash + Eq, V: Clone> Default for EstimateMemo<R, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deposit::{estimate_deposit, DepositEstimate};
    use crate::error::StableSwapError;
    use crate::exchange::{FeeSchedule, Reserve};
    use stableswap_types::{AccountAddress, Token, TokenAddress, TokenAmount};

    fn token(byte: u8) -> Token {
        Token::new(TokenAddress::new([byte; 32]), 6, format!("T{byte}"))
    }

    fn exchange(reserve: u64) -> ExchangeInfo {
        ExchangeInfo::new(
            100,
            FeeSchedule::zero(),
            TokenAmount::new(token(3), reserve * 2),
            [
                Reserve {
                    amount: TokenAmount::new(token(1), reserve),
                    admin_fee_account: AccountAddress::default(),
                },
                Reserve {
                    amount: TokenAmount::new(token(2), reserve),
                    admin_fee_account: AccountAddress::default(),
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_hit_skips_computation() {
        let info = exchange(1_000_000);
        let request = (TokenAmount::new(token(1), 10u8), TokenAmount::new(token(2), 10u8));
        let mut memo: EstimateMemo<(TokenAmount, TokenAmount), DepositEstimate> =
            EstimateMemo::new();
        let mut calls = 0;
        for _ in 0..3 {
            memo.get_or_compute(MemoKey::new(&info, request.clone()), || {
                calls += 1;
                estimate_deposit(&info, &request.0, &request.1)
            })
            .unwrap();
        }
        assert_eq!(calls, 1);
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn test_new_snapshot_changes_key() {
        let request = 42u64;
        assert_ne!(
            MemoKey::new(&exchange(1_000), request),
            MemoKey::new(&exchange(1_001), request)
        );
        assert_eq!(
            MemoKey::new(&exchange(1_000), request),
            MemoKey::new(&exchange(1_000), request)
        );
    }

    #[test]
    fn test_errors_not_cached_and_invalidate_clears() {
        let info = exchange(1_000);
        let key = MemoKey::new(&info, "withdraw");
        let mut memo: EstimateMemo<&str, u64> = EstimateMemo::with_capacity(2);

        let failed: Result<u64, StableSwapError> = memo.get_or_compute(key.clone(), || {
            Err(StableSwapError::Convergence { iterations: 255 })
        });
        assert!(failed.is_err());
        assert!(memo.is_empty());

        let value = memo.get_or_compute::<StableSwapError>(key.clone(), || Ok(7));
        assert_eq!(value.unwrap(), 7);
        assert_eq!(memo.get(&key), Some(&7));
        memo.invalidate();
        assert!(memo.is_empty());
    }

    #[test]
    fn test_capacity_bounds_entries() {
        let info = exchange(1_000);
        let mut memo: EstimateMemo<u64, u64> = EstimateMemo::with_capacity(2);
        for i in 0..5u64 {
            let key = MemoKey::new(&info, i);
            memo.get_or_compute::<StableSwapError>(key, || Ok(i)).unwrap();
            assert!(memo.len() <= 2);
        }
    }

    /// Request whose hash ignores its contents
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct SameHash(u64);

    impl Hash for SameHash {
        fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
            0u8.hash(state);
        }
    }

    #[test]
    fn test_colliding_hashes_keep_separate_entries() {
        let info = exchange(1_000);
        let mut memo: EstimateMemo<SameHash, u64> = EstimateMemo::new();
        for i in 1..=2u64 {
            let value = memo.get_or_compute::<StableSwapError>(
                MemoKey::new(&info, SameHash(i)),
                || Ok(i * 10),
            );
            assert_eq!(value.unwrap(), i * 10);
        }
        assert_eq!(memo.len(), 2);
        assert_eq!(memo.get(&MemoKey::new(&info, SameHash(1))), Some(&10));
        assert_eq!(memo.get(&MemoKey::new(&info, SameHash(2))), Some(&20));
    }
}
