//! Token Amounts with Native Precision
//!
//! Pool reserves, LP supply and user inputs are raw integers in a token's
//! smallest unit. This module pairs the raw integer with its token so that
//! scale and identity travel together.
//!
//! ## Critical Rules
//!
//! 1. **NO FLOATING POINT**: `to_f64()` and `to_decimal()` are display exits only
//! 2. **Preserve Native Precision**: raw amounts are never normalised between tokens
//! 3. **Same Token Only**: arithmetic across tokens is a `TokenMismatch`
//! 4. **Checked Subtraction**: underflow is detected before subtracting
//!
//! ## Example Usage
//!
//! ```rust
//! use stableswap_types::{Token, TokenAddress, TokenAmount};
//!
//! let usdc = Token::new(TokenAddress::new([1u8; 32]), 6, "USDC");
//! let typed = TokenAmount::parse_units(&usdc, "12.5").unwrap();
//! assert_eq!(typed.raw().to_string(), "12500000");
//! assert_eq!(typed.to_exact_string(), "12.500000");
//! ```

use crate::common::errors::AmountError;
use crate::common::fraction::Fraction;
use crate::common::identifiers::TokenAddress;
use num_bigint::{BigInt, BigUint};
use num_traits::{CheckedSub, ToPrimitive, Zero};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A token: mint identity plus decimal scale
///
/// Equality and hashing use the mint only; the symbol is informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    mint: TokenAddress,
    decimals: u8,
    symbol: String,
}

impl Token {
    pub fn new(mint: TokenAddress, decimals: u8, symbol: impl Into<String>) -> Self {
        Self {
            mint,
            decimals,
            symbol: symbol.into(),
        }
    }

    pub fn mint(&self) -> &TokenAddress {
        &self.mint
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// `10^decimals`, the raw units in one whole token
    pub fn decimal_multiplier(&self) -> BigUint {
        BigUint::from(10u8).pow(u32::from(self.decimals))
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.mint == other.mint
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mint.hash(state);
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.mint)
    }
}

/// Non-negative raw amount of a specific token
///
/// The implied decimal value is `raw / 10^decimals`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAmount {
    token: Token,
    #[serde(with = "crate::common::serde_str")]
    raw: BigUint,
}

impl TokenAmount {
    pub fn new(token: Token, raw: impl Into<BigUint>) -> Self {
        Self {
            token,
            raw: raw.into(),
        }
    }

    pub fn zero(token: Token) -> Self {
        Self::new(token, BigUint::zero())
    }

    /// Parse a raw integer string as returned by an RPC node
    pub fn parse_raw(token: &Token, raw: &str) -> Result<Self, AmountError> {
        let value = BigUint::from_str(raw.trim())
            .map_err(|_| AmountError::invalid_amount(raw, "expected a non-negative integer"))?;
        Ok(Self::new(token.clone(), value))
    }

    /// Parse a user-entered decimal string at the token's scale
    ///
    /// More fractional digits than the token supports is an error, never a
    /// truncation.
    pub fn parse_units(token: &Token, input: &str) -> Result<Self, AmountError> {
        let trimmed = input.trim();
        let value = Decimal::from_str(trimmed)
            .map_err(|_| AmountError::invalid_amount(input, "expected a decimal number"))?
            .normalize();

        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::invalid_amount(input, "amount cannot be negative"));
        }

        let scale = value.scale();
        let decimals = u32::from(token.decimals);
        if scale > decimals {
            return Err(AmountError::invalid_amount(
                input,
                format!("{} supports at most {} decimal places", token.symbol, decimals),
            ));
        }

        let mantissa = BigUint::from(value.mantissa().unsigned_abs());
        let raw = mantissa * BigUint::from(10u8).pow(decimals - scale);
        Ok(Self::new(token.clone(), raw))
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn raw(&self) -> &BigUint {
        &self.raw
    }

    pub fn into_raw(self) -> BigUint {
        self.raw
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Another amount of the same token
    pub fn with_raw(&self, raw: impl Into<BigUint>) -> Self {
        Self::new(self.token.clone(), raw)
    }

    fn ensure_same_token(&self, other: &TokenAmount) -> Result<(), AmountError> {
        if self.token != other.token {
            return Err(AmountError::TokenMismatch {
                expected: self.token.to_string(),
                found: other.token.to_string(),
            });
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &TokenAmount) -> Result<TokenAmount, AmountError> {
        self.ensure_same_token(other)?;
        Ok(self.with_raw(&self.raw + &other.raw))
    }

    /// Subtract, failing before the subtraction if `other` is larger
    pub fn checked_sub(&self, other: &TokenAmount) -> Result<TokenAmount, AmountError> {
        self.ensure_same_token(other)?;
        let raw = self.raw.checked_sub(&other.raw).ok_or_else(|| {
            AmountError::underflow(format!(
                "{} minus {} {}",
                self.raw, other.raw, self.token.symbol
            ))
        })?;
        Ok(self.with_raw(raw))
    }

    pub fn mul_integer(&self, factor: &BigUint) -> TokenAmount {
        self.with_raw(&self.raw * factor)
    }

    /// Integer division, truncating toward zero
    pub fn div_integer(&self, divisor: &BigUint) -> Result<TokenAmount, AmountError> {
        if divisor.is_zero() {
            return Err(AmountError::DivisionByZero);
        }
        Ok(self.with_raw(&self.raw / divisor))
    }

    /// `floor(raw * fraction)`; negative results are an underflow
    pub fn mul_fraction_floor(&self, fraction: &Fraction) -> Result<TokenAmount, AmountError> {
        fraction
            .mul_integer(&self.raw)
            .floor_to_biguint()
            .map(|raw| self.with_raw(raw))
    }

    /// Ordering between amounts of the same token
    pub fn checked_cmp(&self, other: &TokenAmount) -> Result<Ordering, AmountError> {
        self.ensure_same_token(other)?;
        Ok(self.raw.cmp(&other.raw))
    }

    /// Raw amount as an exact fraction of raw units
    pub fn raw_fraction(&self) -> Fraction {
        Fraction::from_integer(BigInt::from(self.raw.clone()))
    }

    /// Exact value in whole tokens: `raw / 10^decimals`
    pub fn as_fraction(&self) -> Fraction {
        Fraction::from_positive_parts(
            BigInt::from(self.raw.clone()),
            BigInt::from(self.token.decimal_multiplier()),
        )
    }

    /// Exact decimal string with all of the token's decimals, e.g. "1.500000"
    ///
    /// `parse_units` of this string returns an equal amount.
    pub fn to_exact_string(&self) -> String {
        self.as_fraction().to_fixed(u32::from(self.token.decimals))
    }

    /// Display conversion; `None` past a 96-bit mantissa
    pub fn to_decimal(&self) -> Option<Decimal> {
        self.as_fraction().to_decimal()
    }

    /// Convert to f64 for display purposes only
    pub fn to_f64(&self) -> f64 {
        self.to_decimal()
            .and_then(|d| d.to_f64())
            .unwrap_or_else(|| self.as_fraction().to_f64())
    }
}

impl PartialOrd for TokenAmount {
    /// Amounts of different tokens are unordered
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.checked_cmp(other).ok()
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_exact_string(), self.token.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc() -> Token {
        Token::new(TokenAddress::new([1u8; 32]), 6, "USDC")
    }

    fn usdt() -> Token {
        Token::new(TokenAddress::new([2u8; 32]), 6, "USDT")
    }

    #[test]
    fn test_equality_by_mint() {
        let a = Token::new(TokenAddress::new([1u8; 32]), 6, "USDC");
        let b = Token::new(TokenAddress::new([1u8; 32]), 6, "USD Coin");
        assert_eq!(a, b);
        assert_ne!(a, usdt());
    }

    #[test]
    fn test_parse_units_exact() {
        let amount = TokenAmount::parse_units(&usdc(), "1.5").unwrap();
        assert_eq!(amount.raw(), &BigUint::from(1_500_000u32));

        let trailing = TokenAmount::parse_units(&usdc(), "2.1000000").unwrap();
        assert_eq!(trailing.raw(), &BigUint::from(2_100_000u32));

        assert!(TokenAmount::parse_units(&usdc(), "0.0000001").is_err());
        assert!(TokenAmount::parse_units(&usdc(), "-3").is_err());
        assert!(TokenAmount::parse_units(&usdc(), "abc").is_err());
    }

    #[test]
    fn test_exact_string_round_trip() {
        let amount = TokenAmount::new(usdc(), 123_456_789u64);
        let text = amount.to_exact_string();
        assert_eq!(text, "123.456789");
        assert_eq!(TokenAmount::parse_units(&usdc(), &text).unwrap(), amount);

        let small = TokenAmount::new(usdc(), 5u8);
        assert_eq!(small.to_exact_string(), "0.000005");
    }

    #[test]
    fn test_parse_raw() {
        let amount =
            TokenAmount::parse_raw(&usdc(), "340282366920938463463374607431768211457").unwrap();
        assert!(amount.raw() > &BigUint::from(u128::MAX));
        assert!(TokenAmount::parse_raw(&usdc(), "-1").is_err());
    }

    #[test]
    fn test_token_mismatch() {
        let a = TokenAmount::new(usdc(), 10u8);
        let b = TokenAmount::new(usdt(), 10u8);
        assert!(matches!(a.checked_add(&b), Err(AmountError::TokenMismatch { .. })));
        assert!(a.partial_cmp(&b).is_none());
    }

    #[test]
    fn test_underflow_checked_before_subtracting() {
        let a = TokenAmount::new(usdc(), 10u8);
        let b = TokenAmount::new(usdc(), 11u8);
        assert!(matches!(a.checked_sub(&b), Err(AmountError::Underflow { .. })));
        assert_eq!(b.checked_sub(&a).unwrap().raw(), &BigUint::from(1u8));
    }

    #[test]
    fn test_fraction_multiplication_floors() {
        let a = TokenAmount::new(usdc(), 1_000u32);
        let third = Fraction::new(1, 3).unwrap();
        assert_eq!(a.mul_fraction_floor(&third).unwrap().raw(), &BigUint::from(333u32));
        assert!(a.div_integer(&BigUint::zero()).is_err());
    }

    #[test]
    fn test_display_only_conversions() {
        let a = TokenAmount::new(usdc(), 2_500_000u32);
        assert_eq!(a.to_f64(), 2.5);
        assert_eq!(a.to_string(), "2.500000 USDC");
    }
}
