//! Common value types shared by the math engine and its callers

pub mod errors;
pub mod fraction;
pub mod identifiers;
pub(crate) mod serde_str;
