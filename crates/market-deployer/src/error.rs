//! Error taxonomy for market creation
//!
//! Validation problems are caught before anything is submitted. Once the
//! first transaction is sent, errors distinguish "nothing deployed",
//! "condition prepared but no market maker", "deployed but address unknown"
//! and "deployed but not registered" so callers can tell the user what
//! actually exists on-chain.

use alloy_primitives::B256;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::DeployStage;

/// A single problem with the market form
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title is required")]
    MissingTitle,

    #[error("description is required")]
    MissingDescription,

    #[error("fee must be a fraction in [0, 1), got {0}")]
    FeeOutOfRange(Decimal),

    #[error("a market needs at least 2 outcomes, got {0}")]
    TooFewOutcomes(usize),

    #[error("duplicate outcome {0:?}")]
    DuplicateOutcome(String),

    #[error("invalid oracle address {value:?}: {reason}")]
    InvalidOracle { value: String, reason: String },

    #[error("invalid end date {0:?}: expected YYYY-MM-DD or RFC 3339")]
    InvalidEndDate(String),

    #[error("gas price must not be negative, got {0} gwei")]
    NegativeGasPrice(Decimal),
}

/// Errors surfaced by the creation flow
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("invalid market: {}", join_problems(.0))]
    Validation(Vec<ValidationError>),

    /// Every gas tier failed; the last tier's error is kept
    #[error("gas price unavailable: {0}")]
    GasPrice(String),

    /// Submission or confirmation of a transaction failed.
    /// `committed` holds the prepare-condition tx when it already landed.
    #[error("{stage} failed: {message}")]
    Transaction { stage: DeployStage, message: String, committed: Option<B256> },

    /// The market maker transaction confirmed but its address could not be recovered
    #[error(
        "market maker deployed in tx {tx_hash} but no FixedProductMarketMakerCreation event \
         decoded from {log_count} log(s)"
    )]
    EventDecode { tx_hash: B256, log_count: usize },

    /// Catalog write failed; the on-chain market exists regardless
    #[error("catalog registration failed: {0}")]
    Registration(String),

    #[error("a deployment is already in progress")]
    InProgress,

    #[error("configuration error: {0}")]
    Config(String),
}

impl MarketError {
    /// True when something was committed on-chain before the error occurred
    pub fn has_onchain_effects(&self) -> bool {
        match self {
            MarketError::Transaction { committed, .. } => committed.is_some(),
            MarketError::EventDecode { .. } | MarketError::Registration(_) => true,
            _ => false,
        }
    }
}

impl From<ValidationError> for MarketError {
    fn from(err: ValidationError) -> Self {
        MarketError::Validation(vec![err])
    }
}

fn join_problems(problems: &[ValidationError]) -> String {
    problems.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
