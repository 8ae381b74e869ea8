//! Two-token StableSwap invariant
//!
//! The invariant `D` of a pool with reserves `x, y` satisfies
//!
//! ```text
//! Ann * (x + y) + D = Ann * D + D^(n+1) / (n^n * x * y)
//! ```
//!
//! with leverage `Ann = A * n`. The curve paper writes `A * n^n`; deployed
//! swap programs store the amplification factor against `A * n`, and that is
//! the factor a decoded swap account carries.
//!
//! Both solvers run Newton iteration in unbounded integers, stop once the
//! step is at most one unit, and give up after [`MAX_ITERATIONS`] steps.
//! Integer division truncates at the same points as the on-chain program.

use crate::error::{EstimationStage, Result, StableSwapError};
use num_bigint::{BigInt, BigUint};
use num_traits::{CheckedSub, One, Zero};
use stableswap_types::Fraction;
use tracing::trace;

/// Number of tokens in a pool
pub const N_COINS: u32 = 2;

/// Newton iteration cap shared by `compute_d` and `compute_y`
pub const MAX_ITERATIONS: u32 = 255;

/// Amplification factor at `now` under a linear ramp
///
/// Before the ramp starts the initial factor applies; from the stop time on,
/// the target. In between, the factor moves linearly and the elapsed share is
/// floored toward the initial factor.
pub fn resolve_amp_factor(
    initial_amp_factor: u64,
    target_amp_factor: u64,
    start_ramp_ts: i64,
    stop_ramp_ts: i64,
    now: i64,
) -> u64 {
    if now <= start_ramp_ts {
        return initial_amp_factor;
    }
    if now >= stop_ramp_ts {
        return target_amp_factor;
    }

    // start < now < stop here, so both spans are positive
    let time_range = (stop_ramp_ts as i128 - start_ramp_ts as i128) as u128;
    let time_delta = (now as i128 - start_ramp_ts as i128) as u128;

    if target_amp_factor >= initial_amp_factor {
        let span = u128::from(target_amp_factor - initial_amp_factor);
        // span * delta / range <= span, which fits in u64
        initial_amp_factor + (span * time_delta / time_range) as u64
    } else {
        let span = u128::from(initial_amp_factor - target_amp_factor);
        initial_amp_factor - (span * time_delta / time_range) as u64
    }
}

/// `Ann = A * n`
fn leverage(amp_factor: u64) -> Result<BigUint> {
    if amp_factor == 0 {
        return Err(StableSwapError::estimation(
            EstimationStage::AmpFactor,
            "amplification factor must be positive",
        ));
    }
    Ok(BigUint::from(amp_factor) * BigUint::from(N_COINS))
}

pub(crate) fn abs_diff(a: &BigUint, b: &BigUint) -> BigUint {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

/// Solve for the invariant `D` of reserves `amount_a`, `amount_b`
///
/// An empty pool, or a pool with either reserve at zero, has `D = 0`.
///
/// # Errors
/// `Convergence` if Newton iteration does not settle within
/// [`MAX_ITERATIONS`] steps.
pub fn compute_d(amp_factor: u64, amount_a: &BigUint, amount_b: &BigUint) -> Result<BigUint> {
    if amount_a.is_zero() || amount_b.is_zero() {
        return Ok(BigUint::zero());
    }

    let ann = leverage(amp_factor)?;
    let n = BigUint::from(N_COINS);
    let n_plus_one = &n + BigUint::one();
    let ann_minus_one = &ann - BigUint::one();
    let sum = amount_a + amount_b;
    let scaled_a = amount_a * &n;
    let scaled_b = amount_b * &n;

    let mut d = sum.clone();
    for iteration in 1..=MAX_ITERATIONS {
        // D_P = D^(n+1) / (n^n * x * y), truncated per factor
        let d_p = &d * &d / &scaled_a;
        let d_p = d_p * &d / &scaled_b;

        let previous = d;
        let numerator = (&ann * &sum + &d_p * &n) * &previous;
        let denominator = &ann_minus_one * &previous + &d_p * &n_plus_one;
        d = numerator / denominator;

        if abs_diff(&d, &previous) <= BigUint::one() {
            trace!(iteration, d = %d, "compute_d converged");
            return Ok(d);
        }
    }

    Err(StableSwapError::Convergence {
        iterations: MAX_ITERATIONS,
    })
}

/// Solve for the balance of the other token given one balance `x` and `d`
///
/// `d = 0` gives `0`. A zero `x` with a positive `d` has no solution.
///
/// # Errors
/// `Estimation` at the get_y stage when `x` is zero, `Underflow` if an
/// iterate leaves the valid region, `Convergence` past the iteration cap.
pub fn compute_y(amp_factor: u64, x: &BigUint, d: &BigUint) -> Result<BigUint> {
    if d.is_zero() {
        return Ok(BigUint::zero());
    }
    if x.is_zero() {
        return Err(StableSwapError::estimation(
            EstimationStage::ComputeY,
            "paired balance is zero while the invariant is positive",
        ));
    }

    let ann = leverage(amp_factor)?;
    let n = BigUint::from(N_COINS);
    let two = BigUint::from(2u8);

    // c = D^(n+1) / (n^n * x * Ann), b = x + D / Ann
    let c = d * d / (x * &n);
    let c = c * d / (&ann * &n);
    let b = x + d / &ann;

    let mut y = d.clone();
    for iteration in 1..=MAX_ITERATIONS {
        let previous = y;
        let numerator = &previous * &previous + &c;
        let denominator = (&previous * &two + &b)
            .checked_sub(d)
            .filter(|value| !value.is_zero())
            .ok_or_else(|| StableSwapError::underflow("2y + b - D is not positive"))?;
        y = numerator / denominator;

        if abs_diff(&y, &previous) <= BigUint::one() {
            trace!(iteration, y = %y, "compute_y converged");
            return Ok(y);
        }
    }

    Err(StableSwapError::Convergence {
        iterations: MAX_ITERATIONS,
    })
}

/// Exact residual of the invariant equation at a candidate `d`
///
/// `Ann*D + D^3 / (4xy) - Ann*(x + y) - D`. The residual grows with `d`, so
/// its sign tells which side of the true root a candidate lies on.
pub fn invariant_residual(
    amp_factor: u64,
    amount_a: &BigUint,
    amount_b: &BigUint,
    d: &BigUint,
) -> Result<Fraction> {
    let ann = leverage(amp_factor)?;
    let n = BigUint::from(N_COINS);
    let product = n.pow(N_COINS) * amount_a * amount_b;
    if product.is_zero() {
        return Err(StableSwapError::estimation(
            EstimationStage::EmptyReserve,
            "residual is undefined for an empty reserve",
        ));
    }

    let d_cubed = Fraction::new(BigInt::from(d.pow(N_COINS + 1)), BigInt::from(product))?;
    let linear = BigInt::from(&ann * d)
        - BigInt::from(&ann * (amount_a + amount_b))
        - BigInt::from(d.clone());
    Ok(d_cubed + Fraction::from_integer(linear))
}
