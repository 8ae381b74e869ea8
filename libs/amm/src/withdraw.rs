//! Withdrawal estimation: tokens received for burning LP tokens
//!
//! Balanced withdrawals take a proportional share of each reserve and pay
//! only the withdraw fee. Single-sided withdrawals solve the invariant for
//! the remaining balance and additionally pay the imbalance fee. Realised
//! slippage is reported as computed; comparing it against the caller's
//! maximum is the caller's decision.

use crate::error::{EstimationStage, Result, StableSwapError};
use crate::exchange::ExchangeInfo;
use crate::invariant::{compute_d, compute_y};
use crate::{ensure_slippage_bound, ratio};
use num_bigint::{BigInt, BigUint};
use num_traits::{CheckedSub, One, Zero};
use serde::Serialize;
use stableswap_types::{Fraction, Percent, Token, TokenAmount};
use tracing::debug;

/// Which reserves a withdrawal pays out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "token", rename_all = "snake_case")]
pub enum WithdrawMode {
    Balanced,
    SingleSided(Token),
}

impl WithdrawMode {
    /// No target token means a balanced withdrawal
    pub fn from_target(target: Option<&Token>) -> Self {
        match target {
            Some(token) => WithdrawMode::SingleSided(token.clone()),
            None => WithdrawMode::Balanced,
        }
    }
}

/// Estimate for one reserve token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReserveWithdrawal {
    /// Amount received after all fees
    pub estimate: TokenAmount,
    /// Amount a fee-free withdrawal would receive
    pub estimate_before_fees: TokenAmount,
    /// `floor(estimate * (1 - max_slippage))`, the bound to submit
    pub minimum: TokenAmount,
    /// Total fee (imbalance plus withdraw fee)
    pub fee: TokenAmount,
    /// Part of `fee` kept by the admin
    pub admin_fee: TokenAmount,
    /// `fee / estimate_before_fees`
    pub fee_percent: Percent,
    /// Realised slippage against the virtual-price value of the burn
    pub slippage: Percent,
}

impl ReserveWithdrawal {
    fn zero(token: &Token) -> Self {
        let zero = TokenAmount::zero(token.clone());
        Self {
            estimate: zero.clone(),
            estimate_before_fees: zero.clone(),
            minimum: zero.clone(),
            fee: zero.clone(),
            admin_fee: zero,
            fee_percent: Percent::zero(),
            slippage: Percent::zero(),
        }
    }

    fn build(
        reserve: &TokenAmount,
        before_fees: BigUint,
        estimate: BigUint,
        fee: BigUint,
        admin_fee: BigUint,
        slippage: Percent,
        max_slippage: &Percent,
    ) -> Result<Self> {
        let fee_percent = if before_fees.is_zero() {
            Percent::zero()
        } else {
            Percent::from_fraction(ratio(&fee, &before_fees)?)
        };
        let estimate = reserve.with_raw(estimate);
        let minimum = estimate.mul_fraction_floor(&max_slippage.complement())?;

        Ok(Self {
            minimum,
            estimate,
            estimate_before_fees: reserve.with_raw(before_fees),
            fee: reserve.with_raw(fee),
            admin_fee: reserve.with_raw(admin_fee),
            fee_percent,
            slippage,
        })
    }

    /// Part of the fee that stays with liquidity providers
    pub fn lp_fee(&self) -> Result<TokenAmount> {
        Ok(self.fee.checked_sub(&self.admin_fee)?)
    }

    pub fn is_zero(&self) -> bool {
        self.estimate.is_zero() && self.fee.is_zero()
    }
}

/// Result of a withdrawal estimate, in pool reserve order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawEstimate {
    pub mode: WithdrawMode,
    pub lp_amount: TokenAmount,
    pub max_slippage: Percent,
    pub reserves: [ReserveWithdrawal; 2],
}

impl WithdrawEstimate {
    pub fn estimates(&self) -> [&TokenAmount; 2] {
        [&self.reserves[0].estimate, &self.reserves[1].estimate]
    }

    pub fn minimums(&self) -> [&TokenAmount; 2] {
        [&self.reserves[0].minimum, &self.reserves[1].minimum]
    }

    pub fn fees(&self) -> [&TokenAmount; 2] {
        [&self.reserves[0].fee, &self.reserves[1].fee]
    }

    pub fn fee_percents(&self) -> [&Percent; 2] {
        [&self.reserves[0].fee_percent, &self.reserves[1].fee_percent]
    }

    pub fn slippages(&self) -> [&Percent; 2] {
        [&self.reserves[0].slippage, &self.reserves[1].slippage]
    }

    /// True when any reserve's realised slippage is above the maximum;
    /// callers should not submit such a withdrawal
    pub fn exceeds_max_slippage(&self) -> bool {
        self.reserves
            .iter()
            .any(|reserve| reserve.slippage > self.max_slippage)
    }
}

/// Estimate a withdrawal, balanced unless `target` names a reserve token
pub fn estimate_withdraw(
    exchange: &ExchangeInfo,
    lp_amount: &TokenAmount,
    target: Option<&Token>,
    max_slippage: &Percent,
) -> Result<WithdrawEstimate> {
    match WithdrawMode::from_target(target) {
        WithdrawMode::Balanced => estimate_withdraw_all(exchange, lp_amount, max_slippage),
        WithdrawMode::SingleSided(token) => {
            estimate_withdraw_one(exchange, lp_amount, &token, max_slippage)
        }
    }
}

fn validate_burn(
    exchange: &ExchangeInfo,
    lp_amount: &TokenAmount,
    max_slippage: &Percent,
) -> Result<()> {
    exchange.ensure_lp_token(lp_amount)?;
    ensure_slippage_bound(max_slippage)?;

    let supply = exchange.lp_total_supply();
    if lp_amount.raw() > supply.raw() {
        return Err(StableSwapError::estimation(
            EstimationStage::BurnExceedsSupply,
            format!("burning {lp_amount} exceeds LP supply {supply}"),
        ));
    }
    Ok(())
}

/// Proportional withdrawal of both reserves
///
/// Allowed on paused pools. No invariant solving is involved, so realised
/// slippage is zero.
pub fn estimate_withdraw_all(
    exchange: &ExchangeInfo,
    lp_amount: &TokenAmount,
    max_slippage: &Percent,
) -> Result<WithdrawEstimate> {
    validate_burn(exchange, lp_amount, max_slippage)?;

    let lp = exchange.lp_total_supply().raw();
    let fees = exchange.fees();
    let burn = lp_amount.raw();

    let side = |index: usize| -> Result<ReserveWithdrawal> {
        let reserve = &exchange.reserves()[index].amount;
        let before_fees = if lp.is_zero() {
            BigUint::zero()
        } else {
            reserve.raw() * burn / lp
        };
        let fee = fees
            .withdraw
            .of(&before_fees)
            .floor_to_biguint()
            .map_err(StableSwapError::at(EstimationStage::WithdrawFee))?;
        let admin_fee = fees
            .admin_withdraw
            .of(&fee)
            .floor_to_biguint()
            .map_err(StableSwapError::at(EstimationStage::WithdrawFee))?;
        let estimate = checked_sub(&before_fees, &fee, EstimationStage::WithdrawFee)?;

        ReserveWithdrawal::build(
            reserve,
            before_fees,
            estimate,
            fee,
            admin_fee,
            Percent::zero(),
            max_slippage,
        )
    };
    let reserves = [side(0)?, side(1)?];

    debug!(
        burn = %burn,
        estimate_a = %reserves[0].estimate,
        estimate_b = %reserves[1].estimate,
        "balanced withdrawal estimate"
    );

    Ok(WithdrawEstimate {
        mode: WithdrawMode::Balanced,
        lp_amount: lp_amount.clone(),
        max_slippage: max_slippage.clone(),
        reserves,
    })
}

/// Withdrawal of a single reserve token
///
/// The other reserve reports zeros. Slippage above `max_slippage` is
/// reported, not an error; see [`WithdrawEstimate::exceeds_max_slippage`].
pub fn estimate_withdraw_one(
    exchange: &ExchangeInfo,
    lp_amount: &TokenAmount,
    withdraw_token: &Token,
    max_slippage: &Percent,
) -> Result<WithdrawEstimate> {
    exchange.ensure_not_paused("single-sided withdrawal")?;
    validate_burn(exchange, lp_amount, max_slippage)?;

    let base_index = exchange.reserve_index(withdraw_token)?;
    let quote_index = 1 - base_index;
    let reserves = exchange.reserves();
    let base_reserve = &reserves[base_index].amount;
    let quote_reserve = &reserves[quote_index].amount;

    let burn = lp_amount.raw();
    let active = if burn.is_zero() {
        ReserveWithdrawal::zero(base_reserve.token())
    } else {
        withdraw_one_side(exchange, burn, base_reserve, quote_reserve, max_slippage)?
    };

    let mut paid = [
        ReserveWithdrawal::zero(reserves[0].token()),
        ReserveWithdrawal::zero(reserves[1].token()),
    ];
    paid[base_index] = active;

    Ok(WithdrawEstimate {
        mode: WithdrawMode::SingleSided(withdraw_token.clone()),
        lp_amount: lp_amount.clone(),
        max_slippage: max_slippage.clone(),
        reserves: paid,
    })
}

fn withdraw_one_side(
    exchange: &ExchangeInfo,
    burn: &BigUint,
    base_reserve: &TokenAmount,
    quote_reserve: &TokenAmount,
    max_slippage: &Percent,
) -> Result<ReserveWithdrawal> {
    let amp_factor = exchange.amp_factor();
    let fees = exchange.fees();
    let lp = exchange.lp_total_supply().raw();
    let base = base_reserve.raw();
    let quote = quote_reserve.raw();

    let d0 = compute_d(amp_factor, base, quote)
        .map_err(StableSwapError::at(EstimationStage::ComputeD0))?;
    if d0.is_zero() {
        return Err(StableSwapError::estimation(
            EstimationStage::EmptyReserve,
            "pool invariant is zero",
        ));
    }
    let d1 = checked_sub(&d0, &(burn * &d0 / lp), EstimationStage::ComputeD1)?;

    let new_y = compute_y(amp_factor, quote, &d1)
        .map_err(StableSwapError::at(EstimationStage::ComputeY))?;
    // Burns worth less than a unit can solve to a balance one unit above the
    // reserve; they pay out nothing
    let dy_0 = base.checked_sub(&new_y).unwrap_or_else(BigUint::zero);

    // Imbalance against the proportional share, charged on both sides
    let normalized_fee = fees
        .normalized_trade_fee()
        .map_err(StableSwapError::at(EstimationStage::ImbalanceFee))?;
    let expected_base = (base * &d1 / &d0)
        .checked_sub(&new_y)
        .unwrap_or_else(BigUint::zero);
    let expected_quote = checked_sub(quote, &(quote * &d1 / &d0), EstimationStage::ImbalanceFee)?;
    let base_fee = normalized_fee
        .mul_integer(&expected_base)
        .floor_to_biguint()
        .map_err(StableSwapError::at(EstimationStage::ImbalanceFee))?;
    let quote_fee = normalized_fee
        .mul_integer(&expected_quote)
        .floor_to_biguint()
        .map_err(StableSwapError::at(EstimationStage::ImbalanceFee))?;
    let base_after_fee = checked_sub(base, &base_fee, EstimationStage::ImbalanceFee)?;
    let quote_after_fee = checked_sub(quote, &quote_fee, EstimationStage::ImbalanceFee)?;

    let y_after_fee = compute_y(amp_factor, &quote_after_fee, &d1)
        .map_err(StableSwapError::at(EstimationStage::ComputeY))?;
    // One unit is held back for rounding, as the program does
    let dy = base_after_fee
        .checked_sub(&y_after_fee)
        .and_then(|dy| dy.checked_sub(&BigUint::one()))
        .unwrap_or_else(BigUint::zero);
    let swap_fee = dy_0.checked_sub(&dy).unwrap_or_else(BigUint::zero);

    let withdraw_fee = fees
        .withdraw
        .of(&dy)
        .floor_to_biguint()
        .map_err(StableSwapError::at(EstimationStage::WithdrawFee))?;
    let estimate = checked_sub(&dy, &withdraw_fee, EstimationStage::WithdrawFee)?;

    let admin_trade_fee = fees
        .admin_trade
        .of(&swap_fee)
        .floor_to_biguint()
        .map_err(StableSwapError::at(EstimationStage::WithdrawFee))?;
    let admin_withdraw_fee = fees
        .admin_withdraw
        .of(&withdraw_fee)
        .floor_to_biguint()
        .map_err(StableSwapError::at(EstimationStage::WithdrawFee))?;

    let slippage = single_sided_slippage(burn, &d0, lp, &dy_0)
        .map_err(StableSwapError::at(EstimationStage::Slippage))?;
    if &slippage > max_slippage {
        debug!(
            slippage = %slippage,
            max_slippage = %max_slippage,
            "single-sided withdrawal exceeds maximum slippage"
        );
    }

    debug!(
        d0 = %d0,
        d1 = %d1,
        dy_0 = %dy_0,
        dy = %dy,
        estimate = %estimate,
        "single-sided withdrawal estimate"
    );

    ReserveWithdrawal::build(
        base_reserve,
        dy_0,
        estimate,
        &swap_fee + &withdraw_fee,
        admin_trade_fee + admin_withdraw_fee,
        slippage,
        max_slippage,
    )
}

/// `1 - dy_0 / (burn * D0 / LP)`: shortfall of the fee-free output against
/// the burn's value at the virtual price
fn single_sided_slippage(
    burn: &BigUint,
    d0: &BigUint,
    lp: &BigUint,
    dy_0: &BigUint,
) -> Result<Percent> {
    let ideal = ratio(&(burn * d0), lp)?;
    if ideal.is_zero() {
        return Ok(Percent::zero());
    }
    let received = Fraction::from_integer(BigInt::from(dy_0.clone()));
    Ok(Percent::from_fraction(received.checked_div(&ideal)?.one_minus()))
}

fn checked_sub(lhs: &BigUint, rhs: &BigUint, stage: EstimationStage) -> Result<BigUint> {
    lhs.checked_sub(rhs).ok_or_else(|| {
        StableSwapError::at(stage)(StableSwapError::underflow(format!("{lhs} minus {rhs}")))
    })
}
