//! # StableSwap Types Library
//!
//! Exact value types for the StableSwap pool math engine.
//!
//! ## Design Philosophy
//!
//! - **No Precision Loss**: amounts are arbitrary-precision raw integers in
//!   each token's smallest unit, ratios are exact fractions
//! - **Type Safety**: a `TokenAmount` carries its `Token`, so amounts of
//!   different tokens cannot be mixed silently
//! - **Clear Boundaries**: floating point and `Decimal` appear only in
//!   explicit display conversions and in parsing user input
//!
//! ## Quick Start
//!
//! ```rust
//! use stableswap_types::{Percent, Token, TokenAddress, TokenAmount};
//!
//! let usdc = Token::new(TokenAddress::new([1u8; 32]), 6, "USDC");
//! let deposit = TokenAmount::parse_units(&usdc, "250.75").unwrap();
//!
//! // 0.1% slippage allowance, kept as an exact fraction
//! let slippage = Percent::default_max_slippage();
//! let minimum = deposit.mul_fraction_floor(&slippage.complement()).unwrap();
//! assert_eq!(minimum.raw().to_string(), "250499250");
//! ```

pub mod common;
pub mod precision;

pub use common::errors::AmountError;
pub use common::fraction::{Fraction, Percent, BPS_DENOMINATOR, DEFAULT_MAX_SLIPPAGE_BPS};
pub use common::identifiers::{AccountAddress, TokenAddress};
pub use precision::{Token, TokenAmount};

pub use num_bigint::{BigInt, BigUint};

pub type Result<T> = std::result::Result<T, AmountError>;
