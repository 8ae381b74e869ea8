//! Pool state and the exchange snapshot the estimators read
//!
//! `PoolState` mirrors the decoded on-chain swap account. `ExchangeInfo` is an
//! immutable snapshot built from it at a point in time: the amplification
//! factor is resolved, reserves and LP supply are attached as token amounts,
//! and token identities are checked once so estimators can trust them.

use crate::error::{EstimationStage, Result, StableSwapError};
use crate::invariant::{resolve_amp_factor, N_COINS};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use stableswap_types::{AccountAddress, Fraction, Percent, Token, TokenAddress, TokenAmount};
use tracing::debug;

/// One side of a pool as recorded on chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwapTokenInfo {
    pub mint: TokenAddress,
    pub reserve: AccountAddress,
    pub admin_fee_account: AccountAddress,
}

/// Fee rates charged by a pool
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Charged on swap output and, normalised, on deposit imbalance
    pub trade: Percent,
    /// Charged on withdrawn amounts
    pub withdraw: Percent,
    /// Share of the trade fee kept by the admin
    pub admin_trade: Percent,
    /// Share of the withdraw fee kept by the admin
    pub admin_withdraw: Percent,
}

impl FeeSchedule {
    pub fn zero() -> Self {
        Self {
            trade: Percent::zero(),
            withdraw: Percent::zero(),
            admin_trade: Percent::zero(),
            admin_withdraw: Percent::zero(),
        }
    }

    /// Trade fee applied to imbalance: `trade * n / (4 * (n - 1))`
    ///
    /// For a two-token pool this is half the trade fee.
    pub fn normalized_trade_fee(&self) -> Result<Fraction> {
        let n = BigUint::from(N_COINS);
        let denominator = BigUint::from(4u8) * (&n - BigUint::from(1u8));
        Ok(self.trade.of(&n).div_integer(&denominator)?)
    }
}

/// Program-level accounts of a pool; opaque to the math
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolConfig {
    pub swap_account: AccountAddress,
    pub authority: AccountAddress,
    pub swap_program_id: AccountAddress,
    pub token_program_id: AccountAddress,
}

/// Decoded swap account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolState {
    pub is_initialized: bool,
    pub is_paused: bool,
    pub initial_amp_factor: u64,
    pub target_amp_factor: u64,
    pub start_ramp_ts: i64,
    pub stop_ramp_ts: i64,
    pub pool_mint: TokenAddress,
    pub token_a: SwapTokenInfo,
    pub token_b: SwapTokenInfo,
    pub fees: FeeSchedule,
    pub config: PoolConfig,
}

impl PoolState {
    /// Amplification factor in effect at unix time `now`
    pub fn amp_factor_at(&self, now: i64) -> u64 {
        resolve_amp_factor(
            self.initial_amp_factor,
            self.target_amp_factor,
            self.start_ramp_ts,
            self.stop_ramp_ts,
            now,
        )
    }
}

/// Live balances fetched alongside the swap account
///
/// The tokens carry decimals and symbols that the swap account itself does
/// not record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBalances {
    pub reserve_a: TokenAmount,
    pub reserve_b: TokenAmount,
    pub lp_total_supply: TokenAmount,
}

/// A reserve balance and the account collecting its admin fees
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reserve {
    pub amount: TokenAmount,
    pub admin_fee_account: AccountAddress,
}

impl Reserve {
    pub fn token(&self) -> &Token {
        self.amount.token()
    }
}

/// Immutable snapshot of a pool at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExchangeInfo {
    amp_factor: u64,
    fees: FeeSchedule,
    lp_total_supply: TokenAmount,
    reserves: [Reserve; 2],
    is_paused: bool,
}

impl ExchangeInfo {
    /// Build a snapshot directly
    ///
    /// # Errors
    /// `Estimation` if the amplification factor is zero, both reserves hold
    /// the same token, the LP token equals a reserve token, or the decimals
    /// of the three tokens differ.
    pub fn new(
        amp_factor: u64,
        fees: FeeSchedule,
        lp_total_supply: TokenAmount,
        reserves: [Reserve; 2],
    ) -> Result<Self> {
        if amp_factor == 0 {
            return Err(StableSwapError::estimation(
                EstimationStage::AmpFactor,
                "amplification factor must be positive",
            ));
        }
        if reserves[0].token() == reserves[1].token() {
            return Err(StableSwapError::estimation(
                EstimationStage::Input,
                format!("both reserves hold {}", reserves[0].token()),
            ));
        }
        if reserves.iter().any(|r| r.token() == lp_total_supply.token()) {
            return Err(StableSwapError::estimation(
                EstimationStage::Input,
                "LP token cannot also be a reserve token",
            ));
        }
        // Mints are D in raw units: the LP token and both reserves share decimals
        let decimals = lp_total_supply.token().decimals();
        if let Some(reserve) = reserves.iter().find(|r| r.token().decimals() != decimals) {
            return Err(StableSwapError::estimation(
                EstimationStage::Input,
                format!(
                    "{} has {} decimals but the LP token has {decimals}",
                    reserve.token(),
                    reserve.token().decimals()
                ),
            ));
        }

        Ok(Self {
            amp_factor,
            fees,
            lp_total_supply,
            reserves,
            is_paused: false,
        })
    }

    /// Build the snapshot the estimators read from decoded chain state
    ///
    /// # Errors
    /// `PoolUnavailable` for an uninitialised pool, `TokenMismatch` when a
    /// balance's mint differs from the one the swap account records.
    pub fn from_pool_state(state: &PoolState, balances: &PoolBalances, now: i64) -> Result<Self> {
        if !state.is_initialized {
            return Err(StableSwapError::PoolUnavailable {
                reason: "swap account is not initialized".to_string(),
            });
        }

        ensure_mint(&state.token_a.mint, &balances.reserve_a)?;
        ensure_mint(&state.token_b.mint, &balances.reserve_b)?;
        ensure_mint(&state.pool_mint, &balances.lp_total_supply)?;

        let amp_factor = state.amp_factor_at(now);
        debug!(
            amp_factor,
            now,
            reserve_a = %balances.reserve_a,
            reserve_b = %balances.reserve_b,
            lp_supply = %balances.lp_total_supply,
            "built exchange snapshot"
        );

        let mut info = Self::new(
            amp_factor,
            state.fees.clone(),
            balances.lp_total_supply.clone(),
            [
                Reserve {
                    amount: balances.reserve_a.clone(),
                    admin_fee_account: state.token_a.admin_fee_account,
                },
                Reserve {
                    amount: balances.reserve_b.clone(),
                    admin_fee_account: state.token_b.admin_fee_account,
                },
            ],
        )?;
        info.is_paused = state.is_paused;
        Ok(info)
    }

    pub fn amp_factor(&self) -> u64 {
        self.amp_factor
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    pub fn lp_total_supply(&self) -> &TokenAmount {
        &self.lp_total_supply
    }

    pub fn lp_token(&self) -> &Token {
        self.lp_total_supply.token()
    }

    pub fn reserves(&self) -> &[Reserve; 2] {
        &self.reserves
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Raw reserve balances in pool order
    pub fn reserve_raws(&self) -> [&BigUint; 2] {
        [self.reserves[0].amount.raw(), self.reserves[1].amount.raw()]
    }

    /// Position of `token` in the pool
    ///
    /// # Errors
    /// `TokenMismatch` if the pool does not hold `token`.
    pub fn reserve_index(&self, token: &Token) -> Result<usize> {
        self.reserves
            .iter()
            .position(|r| r.token() == token)
            .ok_or_else(|| StableSwapError::TokenMismatch {
                expected: format!("{} or {}", self.reserves[0].token(), self.reserves[1].token()),
                found: token.to_string(),
            })
    }

    /// Fail with `TokenMismatch` unless `amount` is of the reserve at `index`
    pub(crate) fn ensure_reserve_token(&self, index: usize, amount: &TokenAmount) -> Result<()> {
        let expected = self.reserves[index].token();
        if amount.token() != expected {
            return Err(StableSwapError::TokenMismatch {
                expected: expected.to_string(),
                found: amount.token().to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn ensure_lp_token(&self, amount: &TokenAmount) -> Result<()> {
        if amount.token() != self.lp_token() {
            return Err(StableSwapError::TokenMismatch {
                expected: self.lp_token().to_string(),
                found: amount.token().to_string(),
            });
        }
        Ok(())
    }

    /// Paused pools still allow balanced withdrawals only
    pub(crate) fn ensure_not_paused(&self, operation: &str) -> Result<()> {
        if self.is_paused {
            return Err(StableSwapError::PoolUnavailable {
                reason: format!("pool is paused; {operation} is disabled"),
            });
        }
        Ok(())
    }

    /// Same snapshot with a pause flag; for callers building snapshots by hand
    pub fn with_paused(mut self, is_paused: bool) -> Self {
        self.is_paused = is_paused;
        self
    }
}

fn ensure_mint(expected: &TokenAddress, amount: &TokenAmount) -> Result<()> {
    if amount.token().mint() != expected {
        return Err(StableSwapError::TokenMismatch {
            expected: expected.to_string(),
            found: amount.token().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(byte: u8, symbol: &str) -> Token {
        Token::new(TokenAddress::new([byte; 32]), 6, symbol)
    }

    fn account(byte: u8) -> AccountAddress {
        AccountAddress::new([byte; 32])
    }

    fn state() -> PoolState {
        PoolState {
            is_initialized: true,
            is_paused: false,
            initial_amp_factor: 100,
            target_amp_factor: 200,
            start_ramp_ts: 1_000,
            stop_ramp_ts: 2_000,
            pool_mint: TokenAddress::new([3u8; 32]),
            token_a: SwapTokenInfo {
                mint: TokenAddress::new([1u8; 32]),
                reserve: account(11),
                admin_fee_account: account(21),
            },
            token_b: SwapTokenInfo {
                mint: TokenAddress::new([2u8; 32]),
                reserve: account(12),
                admin_fee_account: account(22),
            },
            fees: FeeSchedule {
                trade: Percent::from_bps(4),
                withdraw: Percent::from_bps(50),
                admin_trade: Percent::from_bps(5000),
                admin_withdraw: Percent::from_bps(5000),
            },
            config: PoolConfig {
                swap_account: account(30),
                authority: account(31),
                swap_program_id: account(32),
                token_program_id: account(33),
            },
        }
    }

    fn balances() -> PoolBalances {
        PoolBalances {
            reserve_a: TokenAmount::new(token(1, "USDC"), 1_000_000u64),
            reserve_b: TokenAmount::new(token(2, "USDT"), 1_000_000u64),
            lp_total_supply: TokenAmount::new(token(3, "LP"), 2_000_000u64),
        }
    }

    #[test]
    fn test_snapshot_resolves_ramp() {
        let info = ExchangeInfo::from_pool_state(&state(), &balances(), 1_500).unwrap();
        assert_eq!(info.amp_factor(), 150);
        assert_eq!(info.reserves()[1].admin_fee_account, account(22));
        assert!(!info.is_paused());
    }

    #[test]
    fn test_uninitialized_pool_unavailable() {
        let mut s = state();
        s.is_initialized = false;
        let err = ExchangeInfo::from_pool_state(&s, &balances(), 0).unwrap_err();
        assert!(matches!(err, StableSwapError::PoolUnavailable { .. }));
    }

    #[test]
    fn test_mint_mismatch_rejected() {
        let mut b = balances();
        b.reserve_b = TokenAmount::new(token(9, "DAI"), 1u8);
        let err = ExchangeInfo::from_pool_state(&state(), &b, 0).unwrap_err();
        assert!(matches!(err, StableSwapError::TokenMismatch { .. }));
    }

    #[test]
    fn test_mismatched_decimals_rejected() {
        let mut b = balances();
        b.lp_total_supply =
            TokenAmount::new(Token::new(TokenAddress::new([3u8; 32]), 9, "LP9"), 2_000_000u64);
        let err = ExchangeInfo::from_pool_state(&state(), &b, 0).unwrap_err();
        assert_eq!(err.stage(), Some(EstimationStage::Input));

        let mut b = balances();
        b.reserve_b =
            TokenAmount::new(Token::new(TokenAddress::new([2u8; 32]), 9, "USDT"), 1_000_000u64);
        let err = ExchangeInfo::from_pool_state(&state(), &b, 0).unwrap_err();
        assert_eq!(err.stage(), Some(EstimationStage::Input));
    }

    #[test]
    fn test_reserve_index() {
        let info = ExchangeInfo::from_pool_state(&state(), &balances(), 0).unwrap();
        assert_eq!(info.reserve_index(&token(2, "USDT")).unwrap(), 1);
        assert!(info.reserve_index(&token(7, "X")).is_err());
    }

    #[test]
    fn test_normalized_trade_fee_is_half() {
        let fees = state().fees;
        assert_eq!(fees.normalized_trade_fee().unwrap(), Fraction::new(2, 10_000).unwrap());
    }
}
