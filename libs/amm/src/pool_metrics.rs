//! Pool-level metrics for display: virtual price and total value locked

use crate::error::{EstimationStage, Result, StableSwapError};
use crate::exchange::ExchangeInfo;
use crate::invariant::compute_d;
use crate::ratio;
use rust_decimal::Decimal;
use stableswap_types::Fraction;

/// Invariant value per LP token, `D / LP supply`, in raw units
///
/// `None` while the pool has no LP supply.
pub fn virtual_price(exchange: &ExchangeInfo) -> Result<Option<Fraction>> {
    let supply = exchange.lp_total_supply();
    if supply.is_zero() {
        return Ok(None);
    }
    let [a, b] = exchange.reserve_raws();
    let d = compute_d(exchange.amp_factor(), a, b)
        .map_err(StableSwapError::at(EstimationStage::ComputeD0))?;
    Ok(Some(ratio(&d, supply.raw())?))
}

/// Total value locked in USD given external per-token prices
///
/// Reserves are valued in whole tokens.
pub fn tvl(exchange: &ExchangeInfo, usd_prices: [Decimal; 2]) -> Fraction {
    exchange
        .reserves()
        .iter()
        .zip(usd_prices)
        .map(|(reserve, price)| reserve.amount.as_fraction() * Fraction::from_decimal(price))
        .fold(Fraction::zero(), |total, value| total + value)
}
