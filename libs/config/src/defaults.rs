//! Default values and constants shared by the estimator tools

/// Settings file read when no path is given; missing is not an error
pub const DEFAULT_CONFIG_PATH: &str = "config/stableswap.toml";

/// Directory, relative to the settings file, holding `<environment>.toml`
/// overlays
pub const ENVIRONMENTS_DIR: &str = "environments";

/// Prefix of environment variable overrides, e.g.
/// `STABLESWAP_ESTIMATOR__MAX_SLIPPAGE_BPS=25`
pub const ENV_PREFIX: &str = "STABLESWAP";

/// Separator between nested keys in environment variable overrides
pub const ENV_SEPARATOR: &str = "__";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// 100% in basis points; the largest slippage allowance accepted
pub const MAX_SLIPPAGE_BPS_LIMIT: u64 = 10_000;
