//! # StableSwap Math - Pool Exchange Estimation Engine
//!
//! ## Purpose
//!
//! Exact math for two-token StableSwap pools: the invariant solvers, and the
//! deposit, withdrawal and swap estimators a client needs before submitting
//! a transaction. The solvers use the program's leverage and truncate where
//! it truncates, and payouts hold back the same rounding unit, so minimum
//! outputs derived here are not above what the program pays.
//!
//! ## Integration Points
//!
//! - **Input Sources**: decoded swap account (`PoolState`) plus live reserve
//!   and LP supply balances, fetched by the caller
//! - **Output Destinations**: UIs and transaction builders consuming
//!   estimates and minimum amounts
//! - **Precision**: raw integer amounts in each token's smallest unit,
//!   ratios as exact fractions
//!
//! ## Architecture Role
//!
//! ```text
//! PoolState + PoolBalances ──► ExchangeInfo ──► estimate_deposit
//!                                    │      ──► estimate_withdraw_all / _one
//!                                    │      ──► estimate_swap
//!                                    └─────────► virtual_price / tvl
//! ```
//!
//! All estimators are pure functions of their inputs. There is no shared
//! state, so concurrent calls need no coordination; `EstimateMemo` is the
//! caller-owned cache when recomputation should be avoided.

pub mod deposit;
pub mod error;
pub mod exchange;
pub mod invariant;
pub mod memo;
pub mod pool_metrics;
pub mod pool_traits;
pub mod swap;
pub mod withdraw;

pub use deposit::{estimate_deposit, DepositEstimate};
pub use error::{EstimationStage, Result, StableSwapError};
pub use exchange::{
    ExchangeInfo, FeeSchedule, PoolBalances, PoolConfig, PoolState, Reserve, SwapTokenInfo,
};
pub use invariant::{
    compute_d, compute_y, invariant_residual, resolve_amp_factor, MAX_ITERATIONS, N_COINS,
};
pub use memo::{EstimateMemo, MemoKey};
pub use pool_metrics::{tvl, virtual_price};
pub use pool_traits::{LiquidityPool, PoolType};
pub use swap::{estimate_swap, SwapEstimate};
pub use withdraw::{
    estimate_withdraw, estimate_withdraw_all, estimate_withdraw_one, ReserveWithdrawal,
    WithdrawEstimate, WithdrawMode,
};

/// Common types for pool calculations
pub use stableswap_types::{Fraction, Percent, Token, TokenAmount};

use num_bigint::{BigInt, BigUint};
use stableswap_types::AmountError;

/// Exact `numerator / denominator`
pub(crate) fn ratio(
    numerator: &BigUint,
    denominator: &BigUint,
) -> std::result::Result<Fraction, AmountError> {
    Fraction::new(
        BigInt::from(numerator.clone()),
        BigInt::from(denominator.clone()),
    )
}

/// Slippage tolerances must lie in `[0, 100%]`
pub(crate) fn ensure_slippage_bound(max_slippage: &Percent) -> Result<()> {
    let value = max_slippage.as_fraction();
    if value.is_negative() || value > &Fraction::one() {
        return Err(StableSwapError::estimation(
            EstimationStage::Slippage,
            format!("maximum slippage {max_slippage} is outside 0%..=100%"),
        ));
    }
    Ok(())
}
