//! Deposit estimation: LP tokens minted for a pair of input amounts
//!
//! Deposits that move the pool away from balance pay the normalised trade
//! fee on their distance from the ideal proportional deposit. The estimate
//! reproduces the on-chain mint amount, including where it truncates.

use crate::error::{EstimationStage, Result, StableSwapError};
use crate::exchange::ExchangeInfo;
use crate::invariant::{abs_diff, compute_d};
use crate::{ensure_slippage_bound, ratio};
use num_bigint::{BigInt, BigUint};
use num_traits::{CheckedSub, Zero};
use serde::Serialize;
use stableswap_types::{Fraction, Percent, TokenAmount};
use tracing::debug;

/// Result of [`estimate_deposit`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositEstimate {
    /// LP tokens minted
    pub mint_amount: TokenAmount,
    /// LP tokens a fee-free deposit would mint
    pub mint_amount_before_fees: TokenAmount,
    /// Difference between the two, in LP units
    pub fee: TokenAmount,
    /// Imbalance fee charged on each reserve token, in pool order
    pub imbalance_fees: [TokenAmount; 2],
    /// `1 - minted / expected at virtual price`; negative when the deposit
    /// rebalances the pool
    pub price_impact: Percent,
    /// First deposit into an empty pool
    pub is_bootstrap: bool,
}

impl DepositEstimate {
    /// Lower bound to submit with the deposit: `floor(mint * (1 - max_slippage))`
    pub fn minimum_mint_amount(&self, max_slippage: &Percent) -> Result<TokenAmount> {
        ensure_slippage_bound(max_slippage)?;
        Ok(self
            .mint_amount
            .mul_fraction_floor(&max_slippage.complement())?)
    }
}

/// Estimate the LP tokens minted for depositing `amount_a` and `amount_b`
///
/// One side may be zero, not both. Every failure names the stage it came
/// from.
pub fn estimate_deposit(
    exchange: &ExchangeInfo,
    amount_a: &TokenAmount,
    amount_b: &TokenAmount,
) -> Result<DepositEstimate> {
    exchange.ensure_not_paused("deposit")?;
    exchange.ensure_reserve_token(0, amount_a)?;
    exchange.ensure_reserve_token(1, amount_b)?;

    if amount_a.is_zero() && amount_b.is_zero() {
        return Err(StableSwapError::estimation(
            EstimationStage::Input,
            "deposit amounts are both zero",
        ));
    }

    let amp_factor = exchange.amp_factor();
    let lp_supply = exchange.lp_total_supply();
    let old = exchange.reserve_raws();
    let new = [old[0] + amount_a.raw(), old[1] + amount_b.raw()];
    let no_fees = [
        TokenAmount::zero(amount_a.token().clone()),
        TokenAmount::zero(amount_b.token().clone()),
    ];

    if lp_supply.is_zero() {
        if new[0].is_zero() || new[1].is_zero() {
            return Err(StableSwapError::estimation(
                EstimationStage::Input,
                "initial deposit must include both tokens",
            ));
        }
        let d1 = compute_d(amp_factor, &new[0], &new[1])
            .map_err(StableSwapError::at(EstimationStage::ComputeD1))?;
        debug!(d1 = %d1, "bootstrap deposit mints D1");

        let minted = lp_supply.with_raw(d1);
        return Ok(DepositEstimate {
            mint_amount: minted.clone(),
            mint_amount_before_fees: minted,
            fee: lp_supply.with_raw(0u8),
            imbalance_fees: no_fees,
            price_impact: Percent::zero(),
            is_bootstrap: true,
        });
    }

    if old[0].is_zero() || old[1].is_zero() {
        return Err(StableSwapError::estimation(
            EstimationStage::EmptyReserve,
            "pool has LP supply but an empty reserve",
        ));
    }

    let d0 = compute_d(amp_factor, old[0], old[1])
        .map_err(StableSwapError::at(EstimationStage::ComputeD0))?;
    let d1 = compute_d(amp_factor, &new[0], &new[1])
        .map_err(StableSwapError::at(EstimationStage::ComputeD1))?;
    if d1 <= d0 {
        return Err(StableSwapError::estimation(
            EstimationStage::InvariantDecreased,
            format!("D1 {d1} does not exceed D0 {d0}"),
        ));
    }

    let normalized_fee = exchange
        .fees()
        .normalized_trade_fee()
        .map_err(StableSwapError::at(EstimationStage::ImbalanceFee))?;

    let mut adjusted = [BigUint::zero(), BigUint::zero()];
    let mut imbalance_fees = no_fees;
    for i in 0..2 {
        let ideal = &d1 * old[i] / &d0;
        let difference = abs_diff(&ideal, &new[i]);
        let fee = normalized_fee
            .mul_integer(&difference)
            .floor_to_biguint()
            .map_err(StableSwapError::at(EstimationStage::ImbalanceFee))?;
        adjusted[i] = new[i].checked_sub(&fee).ok_or_else(|| {
            StableSwapError::at(EstimationStage::ImbalanceFee)(StableSwapError::underflow(
                format!("imbalance fee {fee} exceeds balance {}", new[i]),
            ))
        })?;
        imbalance_fees[i] = imbalance_fees[i].with_raw(fee);
    }

    let d2 = compute_d(amp_factor, &adjusted[0], &adjusted[1])
        .map_err(StableSwapError::at(EstimationStage::ComputeD2))?;

    let lp = lp_supply.raw();
    let growth = d2.checked_sub(&d0).ok_or_else(|| {
        StableSwapError::at(EstimationStage::MintAmount)(StableSwapError::underflow(format!(
            "D2 {d2} is below D0 {d0}"
        )))
    })?;
    let mint_raw = lp * growth / &d0;
    let before_fees_raw = lp * (&d1 - &d0) / &d0;
    // D2 <= D1 in exact arithmetic; solver rounding may leave them one unit apart
    let fee_raw = before_fees_raw
        .checked_sub(&mint_raw)
        .unwrap_or_else(BigUint::zero);

    let price_impact = deposit_price_impact(lp, &d0, amount_a, amount_b, &mint_raw)
        .map_err(StableSwapError::at(EstimationStage::PriceImpact))?;

    debug!(
        d0 = %d0,
        d1 = %d1,
        d2 = %d2,
        mint = %mint_raw,
        price_impact = %price_impact,
        "deposit estimate"
    );

    Ok(DepositEstimate {
        mint_amount: lp_supply.with_raw(mint_raw),
        mint_amount_before_fees: lp_supply.with_raw(before_fees_raw),
        fee: lp_supply.with_raw(fee_raw),
        imbalance_fees,
        price_impact,
        is_bootstrap: false,
    })
}

/// `1 - minted / expected`, with `expected = (a + b) * LP / D0`
fn deposit_price_impact(
    lp: &BigUint,
    d0: &BigUint,
    amount_a: &TokenAmount,
    amount_b: &TokenAmount,
    mint_raw: &BigUint,
) -> Result<Percent> {
    let deposit_value = amount_a.raw() + amount_b.raw();
    let expected = ratio(&(deposit_value * lp), d0)?;
    if expected.is_zero() {
        return Ok(Percent::zero());
    }
    let minted = Fraction::from_integer(BigInt::from(mint_raw.clone()));
    Ok(Percent::from_fraction(minted.checked_div(&expected)?.one_minus()))
}
