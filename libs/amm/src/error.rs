//! Error taxonomy for the pool math engine
//!
//! All failures are local and synchronous. Nothing is retried inside the
//! engine: the same inputs always reproduce the same error.

use stableswap_types::AmountError;
use std::fmt;
use thiserror::Error;
use tracing::warn;

pub type Result<T> = std::result::Result<T, StableSwapError>;

/// Step of an estimation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EstimationStage {
    Input,
    AmpFactor,
    EmptyReserve,
    ComputeD0,
    ComputeD1,
    ComputeD2,
    ComputeY,
    InvariantDecreased,
    ImbalanceFee,
    MintAmount,
    PriceImpact,
    BurnExceedsSupply,
    WithdrawFee,
    SwapOutput,
    Slippage,
}

impl fmt::Display for EstimationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EstimationStage::Input => "input validation",
            EstimationStage::AmpFactor => "amplification factor",
            EstimationStage::EmptyReserve => "empty reserve",
            EstimationStage::ComputeD0 => "invariant D0",
            EstimationStage::ComputeD1 => "invariant D1",
            EstimationStage::ComputeD2 => "invariant D2",
            EstimationStage::ComputeY => "paired balance (get_y)",
            EstimationStage::InvariantDecreased => "invariant growth check",
            EstimationStage::ImbalanceFee => "imbalance fee",
            EstimationStage::MintAmount => "mint amount",
            EstimationStage::PriceImpact => "price impact",
            EstimationStage::BurnExceedsSupply => "burn amount",
            EstimationStage::WithdrawFee => "withdraw fee",
            EstimationStage::SwapOutput => "swap output",
            EstimationStage::Slippage => "slippage bound",
        };
        f.write_str(name)
    }
}

/// Errors produced by the invariant solvers and estimators
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StableSwapError {
    /// Newton iteration exceeded its cap; the pool is unquotable until the
    /// next data refresh
    #[error("Newton iteration did not converge within {iterations} iterations")]
    Convergence { iterations: u32 },

    /// Amounts of different tokens were combined; a caller bug
    #[error("Token mismatch: expected {expected}, found {found}")]
    TokenMismatch { expected: String, found: String },

    /// An unsigned subtraction would have gone negative
    #[error("Underflow: {context}")]
    Underflow { context: String },

    /// A precondition or intermediate step of an estimate failed
    #[error("Estimation failed at {stage}: {reason}")]
    Estimation {
        stage: EstimationStage,
        reason: String,
        #[source]
        cause: Option<Box<StableSwapError>>,
    },

    /// Pool is uninitialised, or paused for the requested operation
    #[error("Pool unavailable: {reason}")]
    PoolUnavailable { reason: String },
}

impl StableSwapError {
    pub(crate) fn estimation(stage: EstimationStage, reason: impl Into<String>) -> Self {
        Self::Estimation {
            stage,
            reason: reason.into(),
            cause: None,
        }
    }

    pub(crate) fn underflow(context: impl Into<String>) -> Self {
        Self::Underflow {
            context: context.into(),
        }
    }

    /// Wrap a failure as an estimation error naming `stage`
    ///
    /// Token mismatches stay as they are, and errors that already name a
    /// stage keep the innermost one.
    pub(crate) fn at<E: Into<StableSwapError>>(
        stage: EstimationStage,
    ) -> impl FnOnce(E) -> StableSwapError {
        move |err| match err.into() {
            err @ (StableSwapError::TokenMismatch { .. }
            | StableSwapError::Estimation { .. }
            | StableSwapError::PoolUnavailable { .. }) => err,
            other => {
                warn!(%stage, error = %other, "estimation stage failed");
                StableSwapError::Estimation {
                    stage,
                    reason: other.to_string(),
                    cause: Some(Box::new(other)),
                }
            }
        }
    }

    /// Stage named by an estimation error
    pub fn stage(&self) -> Option<EstimationStage> {
        match self {
            StableSwapError::Estimation { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Innermost error, following estimation wrappers
    pub fn root_cause(&self) -> &StableSwapError {
        match self {
            StableSwapError::Estimation {
                cause: Some(inner), ..
            } => inner.root_cause(),
            other => other,
        }
    }

    /// Convergence failures may succeed after the next data refresh; every
    /// other error reproduces with the same inputs
    pub fn is_retryable_on_refresh(&self) -> bool {
        matches!(self.root_cause(), StableSwapError::Convergence { .. })
    }
}

impl From<AmountError> for StableSwapError {
    fn from(err: AmountError) -> Self {
        match err {
            AmountError::TokenMismatch { expected, found } => {
                StableSwapError::TokenMismatch { expected, found }
            }
            AmountError::Underflow { context } => StableSwapError::Underflow { context },
            other => StableSwapError::estimation(EstimationStage::Input, other.to_string()),
        }
    }
}
