//! Market deployment sequencer
//!
//! # Sequence
//! 1. prepareCondition(oracle, questionId, outcomeCount) and wait for the receipt
//! 2. createPolymarketFixedProductMarketMaker(...) and wait for the receipt
//! 3. Decode the first FixedProductMarketMakerCreation log -> market maker address
//!
//! Step 2 never starts unless step 1 confirmed. A confirmed step is never
//! undone: if step 2 fails the condition stays prepared, and the failed
//! phase records its tx hash.
//!
//! Progress is published on a watch channel (`subscribe`). Only one
//! deployment may run at a time per deployer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy_primitives::{Address, Log, B256};
use alloy_sol_types::SolEvent;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::chain::contracts::FixedProductMarketMakerCreation;
use crate::chain::MarketChain;
use crate::error::MarketError;
use crate::types::{DeployPhase, DeployStage, Deployment, Market};

/// Runs the two-transaction deployment and tracks its phase
pub struct MarketDeployer {
    chain: Arc<dyn MarketChain>,
    phase: watch::Sender<DeployPhase>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the deployment future finishes or is dropped
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl MarketDeployer {
    pub fn new(chain: Arc<dyn MarketChain>) -> Self {
        let (phase, _) = watch::channel(DeployPhase::NotStarted);
        Self { chain, phase, in_flight: AtomicBool::new(false) }
    }

    /// Current phase
    pub fn phase(&self) -> DeployPhase {
        self.phase.borrow().clone()
    }

    /// Receive every phase change
    pub fn subscribe(&self) -> watch::Receiver<DeployPhase> {
        self.phase.subscribe()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Deploy `market` paying `gas_price` wei per gas on both transactions
    pub async fn deploy(&self, market: &Market, gas_price: u128) -> Result<Deployment, MarketError> {
        let _guard = self.begin()?;

        let question_id = market.question_id();
        let condition = &market.condition;

        info!(
            "Preparing condition: question_id={}, oracle={}, outcomes={}, gas_price={}",
            question_id,
            condition.oracle,
            condition.outcome_count(),
            gas_price
        );
        self.set_phase(DeployPhase::PreparingCondition);

        let prepared = match self
            .chain
            .prepare_condition(condition.oracle, question_id, condition.outcome_count(), gas_price)
            .await
        {
            Ok(tx) => tx,
            Err(e) => return Err(self.fail(DeployStage::PrepareCondition, None, &e)),
        };

        let prepare_tx = prepared.tx_hash;
        info!("Condition prepared in tx {}", prepare_tx);
        self.set_phase(DeployPhase::PreparedConfirmed { prepare_tx });

        info!("Deploying market maker: fee={} ({} wei)", market.fee, market.fee_wei());
        self.set_phase(DeployPhase::CreatingMarketMaker { prepare_tx });

        let created = match self.chain.create_market_maker(market, gas_price).await {
            Ok(tx) => tx,
            Err(e) => return Err(self.fail(DeployStage::CreateMarketMaker, Some(prepare_tx), &e)),
        };

        let Some(market_maker) = find_market_maker(&created.logs) else {
            let err = MarketError::EventDecode { tx_hash: created.tx_hash, log_count: created.logs.len() };
            error!("{}", err);
            self.set_phase(DeployPhase::Failed {
                stage: DeployStage::ExtractAddress,
                committed: Some(prepare_tx),
                message: err.to_string(),
            });
            return Err(err);
        };

        let deployment = Deployment { market_maker, prepare_tx, create_tx: created.tx_hash };
        info!("Market maker deployed at {} (tx {})", market_maker, created.tx_hash);
        self.set_phase(DeployPhase::Deployed(deployment.clone()));

        Ok(deployment)
    }

    fn begin(&self) -> Result<InFlightGuard<'_>, MarketError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| MarketError::InProgress)?;
        Ok(InFlightGuard(&self.in_flight))
    }

    fn set_phase(&self, phase: DeployPhase) {
        debug!("Deploy phase -> {:?}", phase);
        self.phase.send_replace(phase);
    }

    fn fail(&self, stage: DeployStage, committed: Option<B256>, e: &anyhow::Error) -> MarketError {
        let message = format!("{:#}", e);
        match committed {
            Some(tx) => error!("{} failed after condition tx {} was committed: {}", stage, tx, message),
            None => error!("{} failed: {}", stage, message),
        }

        self.set_phase(DeployPhase::Failed { stage, committed, message: message.clone() });
        MarketError::Transaction { stage, message, committed }
    }
}

/// First log that decodes as FixedProductMarketMakerCreation, in receipt order
pub fn find_market_maker(logs: &[Log]) -> Option<Address> {
    logs.iter().enumerate().find_map(|(index, log)| {
        match FixedProductMarketMakerCreation::decode_log_data(&log.data) {
            Ok(event) => Some(event.fixedProductMarketMaker),
            Err(e) => {
                debug!("Log {} from {} is not a creation event: {}", index, log.address, e);
                None
            }
        }
    })
}
