//! Swap output quoting via the paired-balance solver

use crate::ensure_slippage_bound;
use crate::error::{EstimationStage, Result, StableSwapError};
use crate::exchange::ExchangeInfo;
use crate::invariant::{compute_d, compute_y};
use num_bigint::BigUint;
use num_traits::{CheckedSub, One, Zero};
use serde::Serialize;
use stableswap_types::{Percent, TokenAmount};
use tracing::debug;

/// Result of [`estimate_swap`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapEstimate {
    pub input: TokenAmount,
    /// Output before the trade fee
    pub output_before_fees: TokenAmount,
    /// Output received
    pub output: TokenAmount,
    /// Trade fee, in the output token
    pub fee: TokenAmount,
    /// Part of `fee` kept by the admin
    pub admin_fee: TokenAmount,
}

impl SwapEstimate {
    /// Part of the fee that stays in the pool
    pub fn lp_fee(&self) -> Result<TokenAmount> {
        Ok(self.fee.checked_sub(&self.admin_fee)?)
    }

    /// `floor(output * (1 - max_slippage))`
    pub fn minimum_output(&self, max_slippage: &Percent) -> Result<TokenAmount> {
        ensure_slippage_bound(max_slippage)?;
        Ok(self.output.mul_fraction_floor(&max_slippage.complement())?)
    }
}

/// Quote swapping `input` into the pool's other reserve token
pub fn estimate_swap(exchange: &ExchangeInfo, input: &TokenAmount) -> Result<SwapEstimate> {
    exchange.ensure_not_paused("swap")?;
    let from_index = exchange.reserve_index(input.token())?;
    let to_index = 1 - from_index;
    let reserves = exchange.reserves();
    let from_reserve = reserves[from_index].amount.raw();
    let to_reserve = &reserves[to_index].amount;
    let zero = to_reserve.with_raw(0u8);

    if input.is_zero() {
        return Ok(SwapEstimate {
            input: input.clone(),
            output_before_fees: zero.clone(),
            output: zero.clone(),
            fee: zero.clone(),
            admin_fee: zero,
        });
    }

    let amp_factor = exchange.amp_factor();
    let d = compute_d(amp_factor, from_reserve, to_reserve.raw())
        .map_err(StableSwapError::at(EstimationStage::ComputeD0))?;
    if d.is_zero() {
        return Err(StableSwapError::estimation(
            EstimationStage::EmptyReserve,
            "cannot swap against an empty reserve",
        ));
    }

    let new_from = from_reserve + input.raw();
    let new_to = compute_y(amp_factor, &new_from, &d)
        .map_err(StableSwapError::at(EstimationStage::ComputeY))?;
    let output_before_fees = to_reserve.raw().checked_sub(&new_to).ok_or_else(|| {
        StableSwapError::at(EstimationStage::SwapOutput)(StableSwapError::underflow(format!(
            "paired balance {new_to} exceeds reserve {}",
            to_reserve.raw()
        )))
    })?;
    // The program pays one unit less than the solved difference
    let output_before_fees = output_before_fees
        .checked_sub(&BigUint::one())
        .unwrap_or_else(BigUint::zero);

    let fees = exchange.fees();
    let fee = fees
        .trade
        .of(&output_before_fees)
        .floor_to_biguint()
        .map_err(StableSwapError::at(EstimationStage::SwapOutput))?;
    let admin_fee = fees
        .admin_trade
        .of(&fee)
        .floor_to_biguint()
        .map_err(StableSwapError::at(EstimationStage::SwapOutput))?;
    let output = output_before_fees.checked_sub(&fee).ok_or_else(|| {
        StableSwapError::at(EstimationStage::SwapOutput)(StableSwapError::underflow(format!(
            "trade fee {fee} exceeds output {output_before_fees}"
        )))
    })?;

    debug!(
        d = %d,
        input = %input,
        output = %output,
        fee = %fee,
        "swap estimate"
    );

    Ok(SwapEstimate {
        input: input.clone(),
        output_before_fees: to_reserve.with_raw(output_before_fees),
        output: to_reserve.with_raw(output),
        fee: to_reserve.with_raw(fee),
        admin_fee: to_reserve.with_raw(admin_fee),
    })
}
