//! On-chain access
//!
//! `MarketChain` is the seam between the deployment logic and the wallet /
//! provider. `RpcChain` implements it over alloy's HTTP provider with a local
//! private-key signer; tests use the scripted chain from `testkit`.

pub mod contracts;
mod rpc;

use alloy_primitives::{Address, B256, U256};
use anyhow::Result;
use async_trait::async_trait;

use crate::types::{ConfirmedTx, Market};

pub use rpc::RpcChain;

/// Chain operations needed to deploy and register a market.
///
/// Transaction methods return only after the receipt is available; a
/// reverted receipt is an error.
#[async_trait]
pub trait MarketChain: Send + Sync {
    /// ConditionalTokens.prepareCondition(oracle, questionId, outcomeSlotCount)
    async fn prepare_condition(
        &self,
        oracle: Address,
        question_id: B256,
        outcome_count: usize,
        gas_price: u128,
    ) -> Result<ConfirmedTx>;

    /// Factory.createPolymarketFixedProductMarketMaker(conditionalTokens, collateral, question, fee)
    async fn create_market_maker(&self, market: &Market, gas_price: u128) -> Result<ConfirmedTx>;

    /// ConditionalTokens.getConditionId(oracle, questionId, outcomeSlotCount)
    async fn condition_id(
        &self,
        oracle: Address,
        question_id: B256,
        outcome_count: usize,
    ) -> Result<B256>;

    /// Provider's gas price estimate in wei
    async fn gas_price(&self) -> Result<u128>;

    /// Native balance of `address` in wei
    async fn balance(&self, address: Address) -> Result<U256>;
}
