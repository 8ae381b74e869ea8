//! End-to-end estimator scenarios against fixed pools

mod common;

use common::*;
use num_bigint::BigUint;
use stableswap_math::{
    compute_d, estimate_deposit, estimate_swap, estimate_withdraw, estimate_withdraw_all,
    estimate_withdraw_one, virtual_price, EstimationStage, ExchangeInfo, FeeSchedule,
    LiquidityPool, StableSwapError,
};
use stableswap_types::{Fraction, Percent, Token, TokenAmount};

#[test]
fn amp_ramp_halfway_resolves_to_midpoint() {
    let start = 1_700_000_000;
    let state = pool_state(100, 200, start, start + 86_400);
    assert_eq!(state.amp_factor_at(start + 43_200), 150);

    let info = ExchangeInfo::from_pool_state(
        &state,
        &balances(1_000_000, 1_000_000, 2_000_000),
        start + 43_200,
    )
    .unwrap();
    assert_eq!(info.amp_factor(), 150);
}

#[test]
fn balanced_million_pool_invariant_is_two_million() {
    let d = compute_d(100, &BigUint::from(1_000_000u32), &BigUint::from(1_000_000u32)).unwrap();
    let expected = BigUint::from(2_000_000u32);
    let diff = if d > expected { &d - &expected } else { &expected - &d };
    assert!(diff <= BigUint::from(1u8), "D = {d}");
}

#[test]
fn bootstrap_deposit_mints_invariant() {
    init_tracing();
    let info = pool(100, 0, 0, 0, stable_fees());
    let a = TokenAmount::new(usdc(), 3_000_000u64);
    let b = TokenAmount::new(usdt(), 1_000_000u64);

    let estimate = estimate_deposit(&info, &a, &b).unwrap();
    let d1 = compute_d(100, a.raw(), b.raw()).unwrap();
    assert_eq!(estimate.mint_amount.raw(), &d1);
    assert!(estimate.is_bootstrap);
    assert!(estimate.fee.is_zero());
}

#[test]
fn deposit_then_withdraw_returns_no_more_than_deposited() {
    let (reserve, supply) = (5_000_000_000u128, 10_000_000_000u128);
    let before = pool(100, reserve, reserve, supply, stable_fees());
    let a = TokenAmount::new(usdc(), 700_000_000u64);
    let b = TokenAmount::new(usdt(), 100_000_000u64);

    let deposit = estimate_deposit(&before, &a, &b).unwrap();
    let after = pool(
        100,
        reserve + 700_000_000,
        reserve + 100_000_000,
        supply + u128::try_from(deposit.mint_amount.raw()).unwrap(),
        stable_fees(),
    );
    let withdrawal =
        estimate_withdraw_all(&after, &deposit.mint_amount, &Percent::zero()).unwrap();

    let received: BigUint = withdrawal.estimates().iter().map(|e| e.raw()).sum();
    let deposited = a.raw() + b.raw();
    assert!(received < deposited, "received {received} of {deposited}");
}

#[test]
fn full_withdrawal_drains_pool_without_underflow() {
    let info = pool(100, 1_000_000, 1_000_000, 2_000_000, FeeSchedule::zero());
    let all = TokenAmount::new(lp_token(), 2_000_000u64);

    let balanced = estimate_withdraw_all(&info, &all, &Percent::zero()).unwrap();
    assert_eq!(balanced.estimates()[0].raw(), &BigUint::from(1_000_000u32));
    assert_eq!(balanced.estimates()[1].raw(), &BigUint::from(1_000_000u32));

    let drained = pool(100, 0, 0, 0, FeeSchedule::zero());
    assert_eq!(virtual_price(&drained).unwrap(), None);
    let [a, b] = drained.reserve_raws();
    assert_eq!(compute_d(100, a, b).unwrap(), BigUint::from(0u8));

    let single = estimate_withdraw_one(&info, &all, &usdt(), &Percent::zero()).unwrap();
    assert_eq!(single.estimates()[1].raw(), &BigUint::from(1_000_000u32));
}

#[test]
fn large_single_sided_withdrawal_reports_slippage_above_maximum() {
    init_tracing();
    let info = pool(100, 1_000_000_000, 1_000_000_000, 2_000_000_000, stable_fees());
    let max = Percent::default_max_slippage();
    let burn = TokenAmount::new(lp_token(), 1_000_000_000u64);

    let estimate = estimate_withdraw_one(&info, &burn, &usdc(), &max).unwrap();
    let slippage = estimate.slippages()[0];
    assert!(slippage > &max, "slippage {slippage} should exceed {max}");
    assert!(estimate.exceeds_max_slippage());
    assert!(!estimate.estimates()[0].is_zero());
    assert!(estimate.estimates()[1].is_zero());
}

#[test]
fn small_single_sided_withdrawal_stays_within_default_slippage() {
    let info = pool(100, 1_000_000_000, 1_000_000_000, 2_000_000_000, stable_fees());
    let max = Percent::default_max_slippage();
    let burn = TokenAmount::new(lp_token(), 1_000_000u64);

    let estimate = estimate_withdraw_one(&info, &burn, &usdc(), &max).unwrap();
    assert!(!estimate.exceeds_max_slippage());
}

fn raw(value: u64) -> BigUint {
    BigUint::from(value)
}

#[test]
fn swap_output_matches_program_payout() {
    let parity = pool(100, 1_000_000_000, 1_000_000_000, 2_000_000_000, FeeSchedule::zero());
    let quote = estimate_swap(&parity, &TokenAmount::new(usdt(), 10_000_000u64)).unwrap();
    assert_eq!(quote.output.raw(), &raw(9_999_009));
    assert_eq!(quote.minimum_output(&Percent::zero()).unwrap(), quote.output);

    let info = pool(85, 4_200_000_000, 1_700_000_000, 5_800_000_000, stable_fees());
    let quote = estimate_swap(&info, &TokenAmount::new(usdc(), 12_345_678u64)).unwrap();
    assert_eq!(quote.output_before_fees.raw(), &raw(12_166_317));
    assert_eq!(quote.fee.raw(), &raw(4_866));
    assert_eq!(quote.admin_fee.raw(), &raw(2_433));
    assert_eq!(quote.output.raw(), &raw(12_161_451));
}

#[test]
fn single_sided_withdrawal_matches_program_payout() {
    let parity = pool(100, 1_000_000_000, 1_000_000_000, 2_000_000_000, FeeSchedule::zero());
    let burn = TokenAmount::new(lp_token(), 100_000_000u64);
    let estimate = estimate_withdraw_one(&parity, &burn, &usdc(), &Percent::zero()).unwrap();
    assert_eq!(estimate.estimates()[0].raw(), &raw(99_973_887));
    assert_eq!(estimate.minimums()[0], estimate.estimates()[0]);

    let info = pool(85, 4_200_000_000, 1_700_000_000, 5_800_000_000, stable_fees());
    let burn = TokenAmount::new(lp_token(), 98_765_432u64);
    let estimate = estimate_withdraw_one(&info, &burn, &usdt(), &Percent::zero()).unwrap();
    let paid = &estimate.reserves[1];
    assert_eq!(paid.estimate_before_fees.raw(), &raw(99_381_932));
    assert_eq!(paid.estimate.raw(), &raw(98_857_003));
    // 28_161 swap fee plus 496_768 withdraw fee
    assert_eq!(paid.fee.raw(), &raw(524_929));
    assert_eq!(paid.admin_fee.raw(), &raw(262_464));
}

#[test]
fn imbalanced_deposit_matches_program_mint() {
    let info = pool(85, 4_200_000_000, 1_700_000_000, 5_800_000_000, stable_fees());
    let a = TokenAmount::new(usdc(), 12_345_678u64);
    let b = TokenAmount::zero(usdt());

    let estimate = estimate_deposit(&info, &a, &b).unwrap();
    assert_eq!(estimate.mint_amount.raw(), &raw(12_084_018));
    assert_eq!(estimate.mint_amount_before_fees.raw(), &raw(12_085_424));
    assert_eq!(estimate.fee.raw(), &raw(1_406));
    assert_eq!(estimate.imbalance_fees[0].raw(), &raw(718));
    assert_eq!(estimate.imbalance_fees[1].raw(), &raw(708));
}

#[test]
fn lp_token_with_other_decimals_rejected() {
    let lp9 = Token::new(*lp_token().mint(), 9, "USDC-USDT");
    let result = ExchangeInfo::new(
        100,
        stable_fees(),
        TokenAmount::new(lp9, 0u8),
        pool(100, 0, 0, 0, stable_fees()).reserves().clone(),
    );
    let err = result.unwrap_err();
    assert_eq!(err.stage(), Some(EstimationStage::Input));
}

#[test]
fn estimators_are_idempotent() {
    let info = pool(85, 4_200_000_000, 1_700_000_000, 5_800_000_000, stable_fees());
    let a = TokenAmount::new(usdc(), 12_345_678u64);
    let b = TokenAmount::new(usdt(), 0u64);
    let burn = TokenAmount::new(lp_token(), 98_765_432u64);
    let max = Percent::from_bps(50);

    let first = serde_json::to_vec(&estimate_deposit(&info, &a, &b).unwrap()).unwrap();
    let second = serde_json::to_vec(&estimate_deposit(&info, &a, &b).unwrap()).unwrap();
    assert_eq!(first, second);

    let first = estimate_withdraw(&info, &burn, Some(&usdt()), &max).unwrap();
    let second = estimate_withdraw(&info, &burn, Some(&usdt()), &max).unwrap();
    assert_eq!(serde_json::to_vec(&first).unwrap(), serde_json::to_vec(&second).unwrap());

    assert_eq!(estimate_swap(&info, &a).unwrap(), estimate_swap(&info, &a).unwrap());
}

#[test]
fn concurrent_estimates_match_sequential() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ExchangeInfo>();
    assert_send_sync::<StableSwapError>();

    let info = pool(100, 3_000_000_000, 2_000_000_000, 5_000_000_000, stable_fees());
    let max = Percent::default_max_slippage();
    let burns: Vec<TokenAmount> = (1..=8u64)
        .map(|i| TokenAmount::new(lp_token(), i * 50_000_000))
        .collect();
    let sequential: Vec<_> = burns
        .iter()
        .map(|burn| estimate_withdraw_one(&info, burn, &usdc(), &max).unwrap())
        .collect();

    let concurrent: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = burns
            .iter()
            .map(|burn| {
                let (info, max) = (&info, &max);
                scope.spawn(move || estimate_withdraw_one(info, burn, &usdc(), max).unwrap())
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("estimator thread panicked"))
            .collect()
    });

    assert_eq!(sequential, concurrent);
}

#[test]
fn trait_interface_matches_free_functions() {
    let info = pool(100, 1_000_000_000, 1_000_000_000, 2_000_000_000, stable_fees());
    let input = TokenAmount::new(usdt(), 10_000_000u64);
    assert_eq!(info.quote_swap(&input).unwrap(), estimate_swap(&info, &input).unwrap());
    assert_eq!(info.virtual_price().unwrap(), Some(Fraction::one()));
}

#[test]
fn paused_pool_only_allows_balanced_withdrawal() {
    init_tracing();
    let mut state = pool_state(100, 100, 0, 0);
    state.is_paused = true;
    let info =
        ExchangeInfo::from_pool_state(&state, &balances(1_000_000, 1_000_000, 2_000_000), 0)
            .unwrap();
    let burn = TokenAmount::new(lp_token(), 1_000u64);
    let deposit = TokenAmount::new(usdc(), 1_000u64);

    assert!(estimate_withdraw_all(&info, &burn, &Percent::zero()).is_ok());
    for err in [
        estimate_withdraw_one(&info, &burn, &usdc(), &Percent::zero()).unwrap_err(),
        estimate_deposit(&info, &deposit, &TokenAmount::zero(usdt())).unwrap_err(),
        estimate_swap(&info, &deposit).unwrap_err(),
    ] {
        assert!(matches!(err, StableSwapError::PoolUnavailable { .. }), "{err}");
    }
}
