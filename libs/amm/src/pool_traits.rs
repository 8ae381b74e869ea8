//! Unified estimator interface over a pool snapshot

use crate::deposit::{estimate_deposit, DepositEstimate};
use crate::error::Result;
use crate::exchange::ExchangeInfo;
use crate::pool_metrics::virtual_price;
use crate::swap::{estimate_swap, SwapEstimate};
use crate::withdraw::{estimate_withdraw, WithdrawEstimate};
use stableswap_types::{Fraction, Percent, Token, TokenAmount};

/// Pool type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolType {
    /// Two-token StableSwap curve
    StableSwap,
}

/// Liquidity and swap estimates for a pool snapshot
pub trait LiquidityPool {
    fn pool_type(&self) -> PoolType;

    /// LP tokens minted for a deposit of both reserve tokens
    fn quote_deposit(&self, amount_a: &TokenAmount, amount_b: &TokenAmount)
        -> Result<DepositEstimate>;

    /// Tokens received for burning `lp_amount`; balanced when `target` is `None`
    fn quote_withdraw(
        &self,
        lp_amount: &TokenAmount,
        target: Option<&Token>,
        max_slippage: &Percent,
    ) -> Result<WithdrawEstimate>;

    /// Output for swapping `input` into the other reserve token
    fn quote_swap(&self, input: &TokenAmount) -> Result<SwapEstimate>;

    /// Invariant value per LP token
    fn virtual_price(&self) -> Result<Option<Fraction>>;
}

impl LiquidityPool for ExchangeInfo {
    fn pool_type(&self) -> PoolType {
        PoolType::StableSwap
    }

    fn quote_deposit(
        &self,
        amount_a: &TokenAmount,
        amount_b: &TokenAmount,
    ) -> Result<DepositEstimate> {
        estimate_deposit(self, amount_a, amount_b)
    }

    fn quote_withdraw(
        &self,
        lp_amount: &TokenAmount,
        target: Option<&Token>,
        max_slippage: &Percent,
    ) -> Result<WithdrawEstimate> {
        estimate_withdraw(self, lp_amount, target, max_slippage)
    }

    fn quote_swap(&self, input: &TokenAmount) -> Result<SwapEstimate> {
        estimate_swap(self, input)
    }

    fn virtual_price(&self) -> Result<Option<Fraction>> {
        virtual_price(self)
    }
}
