//! Settings Loading
//!
//! Loads [`EstimatorSettings`] from TOML files with environment-specific
//! overlays and `STABLESWAP_*` variable overrides.

use crate::defaults::{
    DEFAULT_CONFIG_PATH, DEFAULT_LOG_LEVEL, ENVIRONMENTS_DIR, ENV_PREFIX, ENV_SEPARATOR,
    MAX_SLIPPAGE_BPS_LIMIT,
};
use anyhow::{ensure, Context, Result};
use config_crate::builder::DefaultState;
use config_crate::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use stableswap_types::{Percent, DEFAULT_MAX_SLIPPAGE_BPS};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Settings for the estimator tools
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct EstimatorSettings {
    pub estimator: EstimatorConfig,
    pub logging: LoggingConfig,
}

/// Defaults applied to estimates
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct EstimatorConfig {
    /// Slippage allowance used when a request does not name one
    pub max_slippage_bps: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` takes precedence
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            estimator: EstimatorConfig {
                max_slippage_bps: DEFAULT_MAX_SLIPPAGE_BPS,
            },
            logging: LoggingConfig {
                level: DEFAULT_LOG_LEVEL.to_string(),
                format: LogFormat::Pretty,
            },
        }
    }
}

impl EstimatorSettings {
    /// Load settings from files with environment overrides
    ///
    /// An explicit `base_path` must exist; the default path is optional.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let (base, required) = match base_path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        let mut builder = with_defaults(Config::builder())
            .context("Failed to register default settings")?
            .add_source(File::from(base.as_path()).required(required));

        if let Some(env) = environment {
            let env_file = base
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(ENVIRONMENTS_DIR)
                .join(format!("{env}.toml"));

            if env_file.exists() {
                info!("Loading environment settings: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment settings not found: {:?}", env_file);
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        let settings: Self = builder
            .build()
            .context("Failed to build settings")?
            .try_deserialize()
            .context("Failed to deserialize settings")?;
        settings.validate()?;

        debug!(?settings, "estimator settings loaded");
        Ok(settings)
    }

    /// Reject values the estimators would refuse at request time
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.estimator.max_slippage_bps <= MAX_SLIPPAGE_BPS_LIMIT,
            "estimator.max_slippage_bps must be at most {MAX_SLIPPAGE_BPS_LIMIT}, got {}",
            self.estimator.max_slippage_bps
        );
        ensure!(
            !self.logging.level.trim().is_empty(),
            "logging.level must not be empty"
        );
        Ok(())
    }

    pub fn max_slippage(&self) -> Percent {
        Percent::from_bps(self.estimator.max_slippage_bps)
    }

    /// Render as a settings file that loads back to the same values
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize settings")
    }
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = EstimatorSettings::default();
    builder
        .set_default("estimator.max_slippage_bps", defaults.estimator.max_slippage_bps)?
        .set_default("logging.level", defaults.logging.level)?
        .set_default("logging.format", "pretty")
}

/// Convenience function to load settings from the default location
pub fn load_settings(environment: Option<&str>) -> Result<EstimatorSettings> {
    EstimatorSettings::load(None, environment)
}
