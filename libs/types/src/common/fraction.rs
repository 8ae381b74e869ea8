//! Exact rational arithmetic for fees, slippage and price ratios
//!
//! This module replaces floating-point ratios with exact fractions over
//! arbitrary-precision integers. Nothing here rounds implicitly: results stay
//! rational until a caller asks for `floor()` or a display conversion.
//!
//! ## Design Principles
//!
//! - **No Precision Loss**: numerator and denominator are unbounded integers
//! - **No Silent Reduction**: fractions keep the terms they were built from;
//!   `reduced()` exists for display
//! - **Explicit Rounding**: `floor()` is the only way back to an integer
//! - **Clear Boundaries**: `to_decimal()` and `to_f64()` are display-only exits

use crate::common::errors::AmountError;
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

/// Denominator of a basis point
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Default maximum slippage: 10 bps = 0.1%
pub const DEFAULT_MAX_SLIPPAGE_BPS: u64 = 10;

/// Largest decimal scale tried when converting to `rust_decimal::Decimal`
const MAX_DISPLAY_SCALE: u32 = 18;

/// Exact rational number `numerator / denominator`
///
/// The denominator is always positive; the sign lives in the numerator.
/// Equality and ordering compare values, so `1/2 == 2/4`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "FractionRepr", into = "FractionRepr")]
pub struct Fraction {
    numerator: BigInt,
    denominator: BigInt,
}

#[derive(Serialize, Deserialize)]
struct FractionRepr {
    #[serde(with = "crate::common::serde_str")]
    numerator: BigInt,
    #[serde(with = "crate::common::serde_str")]
    denominator: BigInt,
}

impl TryFrom<FractionRepr> for Fraction {
    type Error = AmountError;

    fn try_from(repr: FractionRepr) -> Result<Self, Self::Error> {
        Fraction::new(repr.numerator, repr.denominator)
    }
}

impl From<Fraction> for FractionRepr {
    fn from(fraction: Fraction) -> Self {
        Self {
            numerator: fraction.numerator,
            denominator: fraction.denominator,
        }
    }
}

impl Fraction {
    /// Create a fraction, normalising the sign into the numerator
    pub fn new(
        numerator: impl Into<BigInt>,
        denominator: impl Into<BigInt>,
    ) -> Result<Self, AmountError> {
        let numerator = numerator.into();
        let denominator = denominator.into();

        if denominator.is_zero() {
            return Err(AmountError::DivisionByZero);
        }

        if denominator.is_negative() {
            Ok(Self {
                numerator: -numerator,
                denominator: -denominator,
            })
        } else {
            Ok(Self {
                numerator,
                denominator,
            })
        }
    }

    /// Whole number `value / 1`
    pub fn from_integer(value: impl Into<BigInt>) -> Self {
        Self {
            numerator: value.into(),
            denominator: BigInt::one(),
        }
    }

    /// Constructor for a denominator already known to be positive
    pub(crate) fn from_positive_parts(numerator: BigInt, denominator: BigInt) -> Self {
        debug_assert!(denominator.is_positive());
        Self {
            numerator,
            denominator,
        }
    }

    pub fn zero() -> Self {
        Self::from_integer(0u8)
    }

    pub fn one() -> Self {
        Self::from_integer(1u8)
    }

    /// Exact conversion of a decimal (mantissa / 10^scale)
    pub fn from_decimal(value: Decimal) -> Self {
        Self {
            numerator: BigInt::from(value.mantissa()),
            denominator: BigInt::from(10u8).pow(value.scale()),
        }
    }

    pub fn numerator(&self) -> &BigInt {
        &self.numerator
    }

    pub fn denominator(&self) -> &BigInt {
        &self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.numerator.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.numerator.is_positive()
    }

    /// `1 - self`
    pub fn one_minus(&self) -> Fraction {
        &Fraction::one() - self
    }

    /// Multiply by an unsigned integer
    pub fn mul_integer(&self, value: &BigUint) -> Fraction {
        Fraction {
            numerator: &self.numerator * BigInt::from(value.clone()),
            denominator: self.denominator.clone(),
        }
    }

    /// Divide by an unsigned integer, failing on zero
    pub fn div_integer(&self, value: &BigUint) -> Result<Fraction, AmountError> {
        if value.is_zero() {
            return Err(AmountError::DivisionByZero);
        }
        Ok(Fraction {
            numerator: self.numerator.clone(),
            denominator: &self.denominator * BigInt::from(value.clone()),
        })
    }

    /// Exact division, failing when `rhs` is zero
    pub fn checked_div(&self, rhs: &Fraction) -> Result<Fraction, AmountError> {
        if rhs.numerator.is_zero() {
            return Err(AmountError::DivisionByZero);
        }
        Fraction::new(
            &self.numerator * &rhs.denominator,
            &self.denominator * &rhs.numerator,
        )
    }

    /// Largest integer not greater than the value
    pub fn floor(&self) -> BigInt {
        self.numerator.div_floor(&self.denominator)
    }

    /// `floor()` as an unsigned amount; negative values are an underflow
    pub fn floor_to_biguint(&self) -> Result<BigUint, AmountError> {
        self.floor()
            .to_biguint()
            .ok_or_else(|| AmountError::underflow(format!("fraction {} is negative", self)))
    }

    /// Same value in lowest terms (display only; arithmetic never needs it)
    pub fn reduced(&self) -> Fraction {
        let gcd = self.numerator.gcd(&self.denominator);
        if gcd.is_zero() || gcd.is_one() {
            return self.clone();
        }
        Fraction {
            numerator: &self.numerator / &gcd,
            denominator: &self.denominator / &gcd,
        }
    }

    /// Decimal string truncated toward zero to `digits` fractional digits
    pub fn to_fixed(&self, digits: u32) -> String {
        let scale = BigInt::from(10u8).pow(digits);
        let scaled = (self.numerator.abs() * &scale) / &self.denominator;
        let negative = self.is_negative() && !scaled.is_zero();

        let mut text = scaled.to_string();
        if digits > 0 {
            let width = digits as usize + 1;
            if text.len() < width {
                text = format!("{}{}", "0".repeat(width - text.len()), text);
            }
            text.insert(text.len() - digits as usize, '.');
        }
        if negative {
            text.insert(0, '-');
        }
        text
    }

    /// Display conversion with up to 18 fractional digits (truncated)
    ///
    /// Returns `None` when the value does not fit a 96-bit decimal mantissa.
    pub fn to_decimal(&self) -> Option<Decimal> {
        (0..=MAX_DISPLAY_SCALE).rev().find_map(|scale| {
            let scaled = (&self.numerator * BigInt::from(10u8).pow(scale)) / &self.denominator;
            let mantissa = scaled.to_i128()?;
            Decimal::try_from_i128_with_scale(mantissa, scale)
                .ok()
                .map(|d| d.normalize())
        })
    }

    /// Convert to f64 for display purposes only
    pub fn to_f64(&self) -> f64 {
        match (self.numerator.to_f64(), self.denominator.to_f64()) {
            (Some(n), Some(d)) => n / d,
            _ => f64::NAN,
        }
    }
}

impl PartialEq for Fraction {
    fn eq(&self, other: &Self) -> bool {
        &self.numerator * &other.denominator == &other.numerator * &self.denominator
    }
}

impl Eq for Fraction {}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        // Denominators are positive, so cross multiplication preserves order
        (&self.numerator * &other.denominator).cmp(&(&other.numerator * &self.denominator))
    }
}

impl Hash for Fraction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let reduced = self.reduced();
        reduced.numerator.hash(state);
        reduced.denominator.hash(state);
    }
}

impl fmt::Debug for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fraction({}/{})", self.numerator, self.denominator)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl Add<&Fraction> for &Fraction {
    type Output = Fraction;

    fn add(self, rhs: &Fraction) -> Fraction {
        if self.denominator == rhs.denominator {
            return Fraction {
                numerator: &self.numerator + &rhs.numerator,
                denominator: self.denominator.clone(),
            };
        }
        Fraction {
            numerator: &self.numerator * &rhs.denominator + &rhs.numerator * &self.denominator,
            denominator: &self.denominator * &rhs.denominator,
        }
    }
}

impl Sub<&Fraction> for &Fraction {
    type Output = Fraction;

    fn sub(self, rhs: &Fraction) -> Fraction {
        self + &(-rhs)
    }
}

impl Mul<&Fraction> for &Fraction {
    type Output = Fraction;

    fn mul(self, rhs: &Fraction) -> Fraction {
        Fraction {
            numerator: &self.numerator * &rhs.numerator,
            denominator: &self.denominator * &rhs.denominator,
        }
    }
}

impl Neg for &Fraction {
    type Output = Fraction;

    fn neg(self) -> Fraction {
        Fraction {
            numerator: -&self.numerator,
            denominator: self.denominator.clone(),
        }
    }
}

/// Owned operands forward to the reference implementations
macro_rules! forward_owned_binop {
    ($trait:ident, $method:ident) => {
        impl $trait<Fraction> for Fraction {
            type Output = Fraction;

            fn $method(self, rhs: Fraction) -> Fraction {
                (&self).$method(&rhs)
            }
        }

        impl $trait<&Fraction> for Fraction {
            type Output = Fraction;

            fn $method(self, rhs: &Fraction) -> Fraction {
                (&self).$method(rhs)
            }
        }
    };
}

forward_owned_binop!(Add, add);
forward_owned_binop!(Sub, sub);
forward_owned_binop!(Mul, mul);

impl Neg for Fraction {
    type Output = Fraction;

    fn neg(self) -> Fraction {
        -&self
    }
}

/// Exact percentage: fees, slippage tolerance, price impact
///
/// Stores the ratio itself (0.001 for 0.1%); display multiplies by 100.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(Fraction);

impl Percent {
    /// Create from a ratio `numerator / denominator` (not hundredths)
    pub fn new(
        numerator: impl Into<BigInt>,
        denominator: impl Into<BigInt>,
    ) -> Result<Self, AmountError> {
        Fraction::new(numerator, denominator).map(Self)
    }

    pub fn from_fraction(fraction: Fraction) -> Self {
        Self(fraction)
    }

    /// Basis points: 10 bps = 0.1%
    pub fn from_bps(bps: u64) -> Self {
        Self(Fraction {
            numerator: BigInt::from(bps),
            denominator: BigInt::from(BPS_DENOMINATOR),
        })
    }

    pub fn zero() -> Self {
        Self(Fraction::zero())
    }

    /// The documented default maximum slippage (0.1%)
    pub fn default_max_slippage() -> Self {
        Self::from_bps(DEFAULT_MAX_SLIPPAGE_BPS)
    }

    /// Parse a percentage as typed by a user: "0.1" means 0.1%
    pub fn from_decimal_str(s: &str) -> Result<Self, AmountError> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| AmountError::invalid_amount(s, "expected a decimal percentage"))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::invalid_amount(s, "percentage cannot be negative"));
        }
        Fraction::from_decimal(value)
            .div_integer(&BigUint::from(100u8))
            .map(Self)
    }

    pub fn as_fraction(&self) -> &Fraction {
        &self.0
    }

    pub fn into_fraction(self) -> Fraction {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `1 - self`, the share kept after a fee or slippage allowance
    pub fn complement(&self) -> Fraction {
        self.0.one_minus()
    }

    /// `amount * self` as an exact fraction
    pub fn of(&self, amount: &BigUint) -> Fraction {
        self.0.mul_integer(amount)
    }

    /// Percentage string with `digits` fractional digits, e.g. "0.1000"
    pub fn to_fixed(&self, digits: u32) -> String {
        self.0.mul_integer(&BigUint::from(100u8)).to_fixed(digits)
    }
}

impl From<Fraction> for Percent {
    fn from(fraction: Fraction) -> Self {
        Self(fraction)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.to_fixed(4))
    }
}
