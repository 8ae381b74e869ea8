//! Quote tool for StableSwap pools
//!
//! Usage:
//!   quote deposit --pool pools/usdc_usdt.json --amount-a 1000 --amount-b 250
//!   quote withdraw --pool pools/usdc_usdt.json --lp 500 --token USDC
//!   quote swap --pool pools/usdc_usdt.json --from USDT --amount 10000
//!   quote pool --pool pools/usdc_usdt.json --price-a 1.0 --price-b 0.998

use anyhow::{ensure, Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use stableswap_config::defaults::MAX_SLIPPAGE_BPS_LIMIT;
use stableswap_config::{EstimatorSettings, LogFormat, LoggingConfig};
use stableswap_math::{
    estimate_deposit, estimate_swap, estimate_withdraw, tvl, virtual_price, DepositEstimate,
    ExchangeInfo, SwapEstimate,
};
use stableswap_types::{Percent, TokenAmount};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod snapshot;

use snapshot::{find_token, PoolSnapshot};

#[derive(Parser)]
#[command(name = "quote")]
#[command(about = "Quote deposits, withdrawals and swaps against a StableSwap pool snapshot")]
#[command(version)]
struct Cli {
    /// Settings file (config/stableswap.toml is used when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Environment overlay applied on top of the settings file
    #[arg(short, long, global = true)]
    env: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PoolArgs {
    /// Pool snapshot JSON: decoded swap account plus balances
    #[arg(short, long)]
    pool: PathBuf,

    /// Unix time to resolve the amplification ramp at
    #[arg(long)]
    now: Option<i64>,
}

impl PoolArgs {
    fn load(&self) -> Result<ExchangeInfo> {
        PoolSnapshot::from_file(&self.pool)?.exchange_info(self.now)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate LP tokens minted for a deposit
    Deposit {
        #[command(flatten)]
        pool: PoolArgs,
        /// First reserve token amount, in whole tokens
        #[arg(long, default_value = "0")]
        amount_a: String,
        /// Second reserve token amount, in whole tokens
        #[arg(long, default_value = "0")]
        amount_b: String,
        /// Overrides the configured slippage allowance
        #[arg(long)]
        max_slippage_bps: Option<u64>,
    },
    /// Estimate tokens received for burning LP tokens
    Withdraw {
        #[command(flatten)]
        pool: PoolArgs,
        /// LP tokens to burn, in whole tokens
        #[arg(long)]
        lp: String,
        /// Withdraw only this token (symbol or mint); balanced otherwise
        #[arg(short, long)]
        token: Option<String>,
        #[arg(long)]
        max_slippage_bps: Option<u64>,
    },
    /// Estimate the output of a swap
    Swap {
        #[command(flatten)]
        pool: PoolArgs,
        /// Input token (symbol or mint)
        #[arg(long)]
        from: String,
        /// Input amount, in whole tokens
        #[arg(long)]
        amount: String,
        #[arg(long)]
        max_slippage_bps: Option<u64>,
    },
    /// Show amplification, virtual price and, given prices, TVL
    Pool {
        #[command(flatten)]
        pool: PoolArgs,
        /// USD price of the first reserve token
        #[arg(long, requires = "price_b")]
        price_a: Option<Decimal>,
        /// USD price of the second reserve token
        #[arg(long, requires = "price_a")]
        price_b: Option<Decimal>,
    },
    /// Print the effective settings as TOML
    Settings,
}

#[derive(Serialize)]
struct DepositQuote {
    #[serde(flatten)]
    estimate: DepositEstimate,
    minimum_mint_amount: TokenAmount,
    max_slippage: Percent,
}

#[derive(Serialize)]
struct SwapQuote {
    #[serde(flatten)]
    estimate: SwapEstimate,
    minimum_output: TokenAmount,
    max_slippage: Percent,
}

#[derive(Serialize)]
struct PoolSummary {
    amp_factor: u64,
    is_paused: bool,
    reserves: [String; 2],
    lp_total_supply: String,
    virtual_price: Option<String>,
    tvl_usd: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = EstimatorSettings::load(cli.config.as_deref(), cli.env.as_deref())?;
    init_logging(&settings.logging)?;

    let output = run(cli.command, &settings)?;
    println!("{output}");
    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .with_context(|| format!("Invalid logging.level {:?}", logging.level))?,
    };

    // Quotes go to stdout; logs stay on stderr
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}

fn run(command: Commands, settings: &EstimatorSettings) -> Result<String> {
    match command {
        Commands::Deposit {
            pool,
            amount_a,
            amount_b,
            max_slippage_bps,
        } => {
            let info = pool.load()?;
            let max_slippage = slippage(settings, max_slippage_bps)?;
            let [reserve_a, reserve_b] = info.reserves();
            let amount_a = TokenAmount::parse_units(reserve_a.token(), &amount_a)
                .context("Invalid --amount-a")?;
            let amount_b = TokenAmount::parse_units(reserve_b.token(), &amount_b)
                .context("Invalid --amount-b")?;

            let estimate =
                estimate_deposit(&info, &amount_a, &amount_b).context("Deposit estimate failed")?;
            let minimum_mint_amount = estimate.minimum_mint_amount(&max_slippage)?;
            info!(
                mint = %estimate.mint_amount,
                price_impact = %estimate.price_impact,
                "deposit quoted"
            );
            render(&DepositQuote {
                estimate,
                minimum_mint_amount,
                max_slippage,
            })
        }
        Commands::Withdraw {
            pool,
            lp,
            token,
            max_slippage_bps,
        } => {
            let info = pool.load()?;
            let max_slippage = slippage(settings, max_slippage_bps)?;
            let lp_amount =
                TokenAmount::parse_units(info.lp_token(), &lp).context("Invalid --lp")?;
            let target = token
                .as_deref()
                .map(|name| find_token(&info, name))
                .transpose()?;

            let estimate = estimate_withdraw(&info, &lp_amount, target.as_ref(), &max_slippage)
                .context("Withdrawal estimate failed")?;
            if estimate.exceeds_max_slippage() {
                warn!(
                    max_slippage = %max_slippage,
                    "withdrawal slippage exceeds the allowance; the transaction would fail"
                );
            }
            render(&estimate)
        }
        Commands::Swap {
            pool,
            from,
            amount,
            max_slippage_bps,
        } => {
            let info = pool.load()?;
            let max_slippage = slippage(settings, max_slippage_bps)?;
            let token = find_token(&info, &from)?;
            let input = TokenAmount::parse_units(&token, &amount).context("Invalid --amount")?;

            let estimate = estimate_swap(&info, &input).context("Swap estimate failed")?;
            let minimum_output = estimate.minimum_output(&max_slippage)?;
            info!(output = %estimate.output, fee = %estimate.fee, "swap quoted");
            render(&SwapQuote {
                estimate,
                minimum_output,
                max_slippage,
            })
        }
        Commands::Pool {
            pool,
            price_a,
            price_b,
        } => {
            let info = pool.load()?;
            let virtual_price = virtual_price(&info)
                .context("Virtual price failed")?
                .map(|price| price.to_fixed(6));
            let tvl_usd = price_a
                .zip(price_b)
                .map(|(a, b)| tvl(&info, [a, b]).to_fixed(2));
            let [reserve_a, reserve_b] = info.reserves();

            render(&PoolSummary {
                amp_factor: info.amp_factor(),
                is_paused: info.is_paused(),
                reserves: [reserve_a, reserve_b].map(|reserve| {
                    format!("{} {}", reserve.amount.to_exact_string(), reserve.token().symbol())
                }),
                lp_total_supply: info.lp_total_supply().to_exact_string(),
                virtual_price,
                tvl_usd,
            })
        }
        Commands::Settings => settings.to_toml_string(),
    }
}

fn slippage(settings: &EstimatorSettings, override_bps: Option<u64>) -> Result<Percent> {
    match override_bps {
        Some(bps) => {
            ensure!(
                bps <= MAX_SLIPPAGE_BPS_LIMIT,
                "--max-slippage-bps must be at most {MAX_SLIPPAGE_BPS_LIMIT}, got {bps}"
            );
            Ok(Percent::from_bps(bps))
        }
        None => Ok(settings.max_slippage()),
    }
}

fn render<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize quote")
}
