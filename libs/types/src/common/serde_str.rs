//! Serde helper: (de)serialize big integers as decimal strings
//!
//! JSON numbers cannot carry 128-bit and larger values faithfully, so raw
//! amounts travel as strings the same way RPC nodes return them.

use serde::{Deserialize, Deserializer, Serializer};
use std::fmt::Display;
use std::str::FromStr;

pub fn serialize<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: FromStr,
    T::Err: Display,
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.trim().parse().map_err(serde::de::Error::custom)
}
