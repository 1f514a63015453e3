//! Test doubles
//!
//! `ScriptedChain` answers every `MarketChain` call from a script and records
//! what was called, so deployment ordering can be asserted without a node.

use std::sync::Mutex;
use std::time::Duration;

use alloy_primitives::{Address, Log, B256, U256};
use alloy_sol_types::SolEvent;
use anyhow::Result;
use async_trait::async_trait;

use crate::chain::contracts::FixedProductMarketMakerCreation;
use crate::chain::MarketChain;
use crate::identity;
use crate::types::{ConfirmedTx, Market};

/// Recorded chain call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainCall {
    PrepareCondition { oracle: Address, question_id: B256, outcome_count: usize, gas_price: u128 },
    CreateMarketMaker { title: String, fee: U256, gas_price: u128 },
    ConditionId { oracle: Address, question_id: B256, outcome_count: usize },
    GasPrice,
    Balance { address: Address },
}

/// Scripted `MarketChain`
pub struct ScriptedChain {
    prepare: Result<ConfirmedTx, String>,
    create: Result<ConfirmedTx, String>,
    gas_price: Result<u128, String>,
    balance: Result<U256, String>,
    condition_id: Option<Result<B256, String>>,
    prepare_delay: Option<Duration>,
    calls: Mutex<Vec<ChainCall>>,
}

impl ScriptedChain {
    /// Both transactions confirm; the second emits a creation event for `market_maker`.
    /// The wallet holds 1 native token.
    pub fn deploying(market_maker: Address) -> Self {
        Self {
            prepare: Ok(ConfirmedTx { tx_hash: B256::repeat_byte(0x01), logs: vec![] }),
            create: Ok(ConfirmedTx {
                tx_hash: B256::repeat_byte(0x02),
                logs: vec![unrelated_log(), creation_log(market_maker)],
            }),
            gas_price: Ok(1_000_000_000),
            balance: Ok(U256::from(1_000_000_000_000_000_000u128)),
            condition_id: None,
            prepare_delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_prepare(mut self, result: Result<ConfirmedTx, String>) -> Self {
        self.prepare = result;
        self
    }

    pub fn with_create(mut self, result: Result<ConfirmedTx, String>) -> Self {
        self.create = result;
        self
    }

    pub fn with_gas_price(mut self, result: Result<u128, String>) -> Self {
        self.gas_price = result;
        self
    }

    pub fn with_balance(mut self, result: Result<U256, String>) -> Self {
        self.balance = result;
        self
    }

    /// Override getConditionId (defaults to the locally derived id)
    pub fn with_condition_id(mut self, result: Result<B256, String>) -> Self {
        self.condition_id = Some(result);
        self
    }

    /// Hold prepareCondition open so a second deployment can race it
    pub fn with_prepare_delay(mut self, delay: Duration) -> Self {
        self.prepare_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<ChainCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: ChainCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl MarketChain for ScriptedChain {
    async fn prepare_condition(
        &self,
        oracle: Address,
        question_id: B256,
        outcome_count: usize,
        gas_price: u128,
    ) -> Result<ConfirmedTx> {
        self.record(ChainCall::PrepareCondition { oracle, question_id, outcome_count, gas_price });
        if let Some(delay) = self.prepare_delay {
            tokio::time::sleep(delay).await;
        }
        self.prepare.clone().map_err(anyhow::Error::msg)
    }

    async fn create_market_maker(&self, market: &Market, gas_price: u128) -> Result<ConfirmedTx> {
        self.record(ChainCall::CreateMarketMaker {
            title: market.question.title.clone(),
            fee: market.fee_wei(),
            gas_price,
        });
        self.create.clone().map_err(anyhow::Error::msg)
    }

    async fn condition_id(
        &self,
        oracle: Address,
        question_id: B256,
        outcome_count: usize,
    ) -> Result<B256> {
        self.record(ChainCall::ConditionId { oracle, question_id, outcome_count });
        match &self.condition_id {
            Some(result) => result.clone().map_err(anyhow::Error::msg),
            None => Ok(identity::condition_id(oracle, question_id, outcome_count)),
        }
    }

    async fn gas_price(&self) -> Result<u128> {
        self.record(ChainCall::GasPrice);
        self.gas_price.clone().map_err(anyhow::Error::msg)
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.record(ChainCall::Balance { address });
        self.balance.clone().map_err(anyhow::Error::msg)
    }
}

/// FixedProductMarketMakerCreation log announcing `market_maker`
pub fn creation_log(market_maker: Address) -> Log {
    let event = FixedProductMarketMakerCreation {
        creator: Address::repeat_byte(0xc0),
        fixedProductMarketMaker: market_maker,
        conditionalTokens: Address::repeat_byte(0xc7),
        collateralToken: Address::repeat_byte(0x05),
        conditionIds: vec![B256::repeat_byte(0xcd)],
        fee: U256::from(20_000_000_000_000_000u128),
    };
    Log { address: Address::repeat_byte(0xfa), data: event.encode_log_data() }
}

/// Log from some other event (ERC-20 Transfer shaped)
pub fn unrelated_log() -> Log {
    let transfer_topic = alloy_primitives::keccak256("Transfer(address,address,uint256)");
    Log::new_unchecked(
        Address::repeat_byte(0x05),
        vec![transfer_topic, B256::ZERO, B256::ZERO],
        U256::from(1u64).to_be_bytes::<32>().to_vec().into(),
    )
}
