//! Pool fixtures shared by the integration tests

#![allow(dead_code)]

use stableswap_math::{
    ExchangeInfo, FeeSchedule, PoolBalances, PoolConfig, PoolState, Reserve, SwapTokenInfo,
};
use stableswap_types::{AccountAddress, Percent, Token, TokenAddress, TokenAmount};

/// Route estimator logs to the test harness; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn usdc() -> Token {
    Token::new(TokenAddress::new([1u8; 32]), 6, "USDC")
}

pub fn usdt() -> Token {
    Token::new(TokenAddress::new([2u8; 32]), 6, "USDT")
}

pub fn lp_token() -> Token {
    Token::new(TokenAddress::new([3u8; 32]), 6, "USDC-USDT")
}

pub fn account(byte: u8) -> AccountAddress {
    AccountAddress::new([byte; 32])
}

/// Fee schedule of a typical stable pool: 4 bps trade, 50 bps withdraw,
/// half of both to the admin
pub fn stable_fees() -> FeeSchedule {
    FeeSchedule {
        trade: Percent::from_bps(4),
        withdraw: Percent::from_bps(50),
        admin_trade: Percent::from_bps(5_000),
        admin_withdraw: Percent::from_bps(5_000),
    }
}

pub fn pool(
    amp: u64,
    reserve_a: u128,
    reserve_b: u128,
    supply: u128,
    fees: FeeSchedule,
) -> ExchangeInfo {
    ExchangeInfo::new(
        amp,
        fees,
        TokenAmount::new(lp_token(), supply),
        [
            Reserve {
                amount: TokenAmount::new(usdc(), reserve_a),
                admin_fee_account: account(21),
            },
            Reserve {
                amount: TokenAmount::new(usdt(), reserve_b),
                admin_fee_account: account(22),
            },
        ],
    )
    .expect("fixture pool is valid")
}

pub fn pool_state(initial_amp: u64, target_amp: u64, start: i64, stop: i64) -> PoolState {
    PoolState {
        is_initialized: true,
        is_paused: false,
        initial_amp_factor: initial_amp,
        target_amp_factor: target_amp,
        start_ramp_ts: start,
        stop_ramp_ts: stop,
        pool_mint: *lp_token().mint(),
        token_a: SwapTokenInfo {
            mint: *usdc().mint(),
            reserve: account(11),
            admin_fee_account: account(21),
        },
        token_b: SwapTokenInfo {
            mint: *usdt().mint(),
            reserve: account(12),
            admin_fee_account: account(22),
        },
        fees: stable_fees(),
        config: PoolConfig {
            swap_account: account(30),
            authority: account(31),
            swap_program_id: account(32),
            token_program_id: account(33),
        },
    }
}

pub fn balances(reserve_a: u128, reserve_b: u128, supply: u128) -> PoolBalances {
    PoolBalances {
        reserve_a: TokenAmount::new(usdc(), reserve_a),
        reserve_b: TokenAmount::new(usdt(), reserve_b),
        lp_total_supply: TokenAmount::new(lp_token(), supply),
    }
}
