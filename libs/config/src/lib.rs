//! # StableSwap Estimator Settings
//!
//! Layered configuration for the tools built on the StableSwap math engine.
//! The math itself takes every parameter explicitly; these settings only
//! supply defaults such as the slippage allowance and the log filter.
//!
//! ## Sources
//!
//! Later sources override earlier ones:
//!
//! 1. Built-in defaults ([`defaults`])
//! 2. The settings file (`config/stableswap.toml` unless a path is given)
//! 3. An environment overlay, `environments/<name>.toml` next to the file
//! 4. `STABLESWAP_*` environment variables, nested keys split by `__`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stableswap_config::EstimatorSettings;
//!
//! let settings = EstimatorSettings::load(None, Some("production")).unwrap();
//! let max_slippage = settings.max_slippage();
//! ```

pub mod defaults;
pub mod settings;

pub use settings::{load_settings, EstimatorConfig, EstimatorSettings, LogFormat, LoggingConfig};
