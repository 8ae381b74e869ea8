//! Pool snapshot files: a decoded swap account plus the balances read with it

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use stableswap_math::{ExchangeInfo, PoolBalances, PoolState};
use stableswap_types::Token;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolSnapshot {
    /// Unix time the balances were read at
    #[serde(default)]
    pub now: Option<i64>,
    pub state: PoolState,
    pub balances: PoolBalances,
}

impl PoolSnapshot {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pool snapshot {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse pool snapshot {}", path.display()))
    }

    /// Build the exchange at `now`, falling back to the snapshot's own
    /// timestamp and then the system clock
    pub fn exchange_info(&self, now: Option<i64>) -> Result<ExchangeInfo> {
        let now = match now.or(self.now) {
            Some(ts) => ts,
            None => unix_now()?,
        };
        let info = ExchangeInfo::from_pool_state(&self.state, &self.balances, now)
            .context("Pool snapshot is not usable")?;
        debug!(now, amp_factor = info.amp_factor(), "exchange resolved");
        Ok(info)
    }
}

fn unix_now() -> Result<i64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock is before the unix epoch")?;
    i64::try_from(elapsed.as_secs()).context("System clock out of range")
}

/// Resolve a pool token by symbol (case-insensitive) or base58 mint
pub fn find_token(info: &ExchangeInfo, name: &str) -> Result<Token> {
    let candidates = info
        .reserves()
        .iter()
        .map(|reserve| reserve.token())
        .chain(std::iter::once(info.lp_token()));

    for token in candidates {
        if token.symbol().eq_ignore_ascii_case(name) || token.mint().to_base58() == name {
            return Ok(token.clone());
        }
    }
    bail!("Token {name} is not part of this pool")
}
