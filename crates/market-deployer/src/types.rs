//! Market model and deployment state
//!
//! # Lifecycle
//! `Question` / `Condition` / `Market` are built per submission, consumed once
//! by the deployment sequence and then dropped. Nothing is persisted locally;
//! the catalog is the system of record and is only written after deployment.

use std::fmt;

use alloy_primitives::{Address, Log, B256, U256};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity;
use crate::{DEFAULT_FEE, DEFAULT_OUTCOMES};

/// Fee and collateral amounts use 18-decimal fixed point on-chain
const FEE_DECIMALS: u32 = 18;

// ============================================================================
// Market Model
// ============================================================================

/// Market question; title and description together form the question id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub title: String,
    pub description: String,
}

impl Question {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into() }
    }

    /// keccak256(abi.encodePacked(title, description))
    pub fn id(&self) -> B256 {
        identity::question_id(&self.title, &self.description)
    }
}

/// Outcome set and resolving oracle
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub outcomes: Vec<String>,
    pub oracle: Address,
}

impl Condition {
    /// Apply defaults: no outcomes -> ["Yes", "No"], empty oracle -> `default_oracle`.
    ///
    /// Fails if the oracle is not a 42-character hex address or fewer than two
    /// outcomes remain after defaults.
    pub fn resolve(
        outcomes: Vec<String>,
        oracle: &str,
        default_oracle: Address,
    ) -> Result<Self, ValidationError> {
        let outcomes = if outcomes.is_empty() {
            DEFAULT_OUTCOMES.iter().map(|o| o.to_string()).collect()
        } else {
            outcomes
        };

        if outcomes.len() < 2 {
            return Err(ValidationError::TooFewOutcomes(outcomes.len()));
        }

        let oracle = if oracle.trim().is_empty() { default_oracle } else { parse_address(oracle)? };

        Ok(Self { outcomes, oracle })
    }

    pub fn outcome_count(&self) -> usize {
        self.outcomes.len()
    }
}

/// Parse a 0x-prefixed, 40 hex digit address
pub fn parse_address(value: &str) -> Result<Address, ValidationError> {
    let trimmed = value.trim();
    if trimmed.len() != 42 || !trimmed.starts_with("0x") {
        return Err(ValidationError::InvalidOracle {
            value: value.to_string(),
            reason: "expected 0x followed by 40 hex digits".to_string(),
        });
    }

    trimmed.parse::<Address>().map_err(|e| ValidationError::InvalidOracle {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Deployment input
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub question: Question,
    pub condition: Condition,
    /// Fee as a fraction of trade volume (0.02 = 2%)
    pub fee: Decimal,
}

impl Market {
    /// Build a market, replacing a zero fee with the 0.02 default
    pub fn new(question: Question, condition: Condition, fee: Decimal) -> Result<Self, ValidationError> {
        let fee = if fee.is_zero() { DEFAULT_FEE } else { fee };
        if fee.is_sign_negative() || fee >= Decimal::ONE {
            return Err(ValidationError::FeeOutOfRange(fee));
        }

        Ok(Self { question, condition, fee })
    }

    pub fn question_id(&self) -> B256 {
        self.question.id()
    }

    /// Fee in 18-decimal fixed point, as passed to the factory and the catalog
    pub fn fee_wei(&self) -> U256 {
        fee_to_wei(self.fee)
    }
}

/// Scale a fee fraction to 18-decimal fixed point (digits past 18 are truncated)
pub fn fee_to_wei(fee: Decimal) -> U256 {
    let scale = Decimal::from(10u64.pow(FEE_DECIMALS));
    fee.checked_mul(scale)
        .and_then(|scaled| scaled.trunc().to_u128())
        .map(U256::from)
        .unwrap_or(U256::ZERO)
}

// ============================================================================
// Deployment State
// ============================================================================

/// Step of the deployment sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStage {
    PrepareCondition,
    CreateMarketMaker,
    ExtractAddress,
}

impl fmt::Display for DeployStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeployStage::PrepareCondition => "prepare condition",
            DeployStage::CreateMarketMaker => "create market maker",
            DeployStage::ExtractAddress => "extract market maker address",
        };
        f.write_str(name)
    }
}

/// Deployment progress
///
/// # State Machine
/// NotStarted -> PreparingCondition -> PreparedConfirmed
///            -> CreatingMarketMaker -> Deployed
/// Any step -> Failed
///
/// Once `PreparedConfirmed` is reached the condition exists on-chain and is
/// never rolled back; later states carry its tx hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum DeployPhase {
    NotStarted,
    PreparingCondition,
    PreparedConfirmed { prepare_tx: B256 },
    CreatingMarketMaker { prepare_tx: B256 },
    Deployed(Deployment),
    Failed {
        stage: DeployStage,
        /// Prepare-condition tx, if it confirmed before the failure
        committed: Option<B256>,
        message: String,
    },
}

impl DeployPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeployPhase::Deployed(_) | DeployPhase::Failed { .. })
    }

    /// Prepare-condition tx once it is irreversibly on-chain
    pub fn committed_condition(&self) -> Option<B256> {
        match self {
            DeployPhase::PreparedConfirmed { prepare_tx }
            | DeployPhase::CreatingMarketMaker { prepare_tx } => Some(*prepare_tx),
            DeployPhase::Deployed(deployment) => Some(deployment.prepare_tx),
            DeployPhase::Failed { committed, .. } => *committed,
            DeployPhase::NotStarted | DeployPhase::PreparingCondition => None,
        }
    }
}

/// Successful deployment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub market_maker: Address,
    pub prepare_tx: B256,
    pub create_tx: B256,
}

/// Confirmed transaction as seen by the sequencer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmedTx {
    pub tx_hash: B256,
    /// Emitted logs in receipt order
    pub logs: Vec<Log>,
}
