//! Typed 32-byte account identifiers
//!
//! Mints, token accounts, swap accounts and program ids are all 32-byte keys
//! rendered as base58. The math engine never interprets them; distinct types
//! keep a reserve account from being passed where a mint is expected.

use crate::common::errors::AmountError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Macro to define a typed 32-byte key wrapper with base58 display and serde
macro_rules! define_address {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            /// Create from raw key bytes
            #[inline(always)]
            pub const fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Raw key bytes
            #[inline(always)]
            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Base58 rendering used on-chain and in registries
            pub fn to_base58(&self) -> String {
                bs58::encode(self.0).into_string()
            }
        }

        impl FromStr for $name {
            type Err = AmountError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let decoded = bs58::decode(s)
                    .into_vec()
                    .map_err(|_| AmountError::InvalidAddress(s.to_string()))?;
                let bytes: [u8; 32] = decoded
                    .try_into()
                    .map_err(|_| AmountError::InvalidAddress(s.to_string()))?;
                Ok(Self(bytes))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_base58())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_base58())
            }
        }

        impl From<[u8; 32]> for $name {
            #[inline(always)]
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_base58())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_address!(
    /// Token mint address
    ///
    /// Identity of a token; two `Token` values are equal when their mints are.
    TokenAddress
);

define_address!(
    /// Any other on-chain account: reserve token accounts, admin fee
    /// accounts, the swap account, its authority, or a program id
    AccountAddress
);
