//! JSON-RPC chain backend (alloy provider + local signer)

use std::str::FromStr;

use alloy_primitives::{Address, Log, B256, U256};
use alloy_provider::network::{EthereumWallet, ReceiptResponse};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_signer::Signer as _;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use super::contracts::{ConditionalTokens, MarketQuestion, PolymarketMarketMakerFactory};
use super::MarketChain;
use crate::network::ContractAddresses;
use crate::types::{ConfirmedTx, Market};

/// Chain backend over an HTTP JSON-RPC endpoint
#[derive(Clone)]
pub struct RpcChain {
    rpc_url: Url,
    contracts: ContractAddresses,
    /// None for read-only use (condition ids, gas price)
    signer: Option<PrivateKeySigner>,
}

impl RpcChain {
    /// Signing backend from a hex private key
    pub fn new(
        rpc_url: &str,
        chain_id: u64,
        contracts: ContractAddresses,
        private_key: &str,
    ) -> Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key.trim())
            .context("Invalid private key")?
            .with_chain_id(Some(chain_id));

        Ok(Self { rpc_url: parse_rpc_url(rpc_url)?, contracts, signer: Some(signer) })
    }

    /// Backend that can only read (no transactions)
    pub fn read_only(rpc_url: &str, contracts: ContractAddresses) -> Result<Self> {
        Ok(Self { rpc_url: parse_rpc_url(rpc_url)?, contracts, signer: None })
    }

    /// Address of the signing wallet, if any
    pub fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    fn wallet(&self) -> Result<EthereumWallet> {
        let signer = self.signer.clone().context("No signer configured (read-only chain)")?;
        Ok(EthereumWallet::from(signer))
    }
}

fn parse_rpc_url(rpc_url: &str) -> Result<Url> {
    rpc_url.parse().with_context(|| format!("Invalid RPC URL: {}", rpc_url))
}

fn confirmed(tx_hash: B256, succeeded: bool, logs: Vec<Log>) -> Result<ConfirmedTx> {
    if !succeeded {
        anyhow::bail!("transaction {} reverted", tx_hash);
    }
    Ok(ConfirmedTx { tx_hash, logs })
}

#[async_trait]
impl MarketChain for RpcChain {
    async fn prepare_condition(
        &self,
        oracle: Address,
        question_id: B256,
        outcome_count: usize,
        gas_price: u128,
    ) -> Result<ConfirmedTx> {
        let provider = ProviderBuilder::new().wallet(self.wallet()?).connect_http(self.rpc_url.clone());
        let conditional_tokens = ConditionalTokens::new(self.contracts.conditional_tokens, &provider);

        let pending = conditional_tokens
            .prepareCondition(oracle, question_id, U256::from(outcome_count))
            .gas_price(gas_price)
            .send()
            .await
            .context("Failed to submit prepareCondition")?;

        info!(tx_hash = %pending.tx_hash(), "prepareCondition submitted, waiting for receipt");

        let receipt =
            pending.get_receipt().await.context("Failed to get prepareCondition receipt")?;
        let logs = receipt.inner.logs().iter().map(|log| log.inner.clone()).collect();

        confirmed(receipt.transaction_hash, ReceiptResponse::status(&receipt), logs)
    }

    async fn create_market_maker(&self, market: &Market, gas_price: u128) -> Result<ConfirmedTx> {
        let provider = ProviderBuilder::new().wallet(self.wallet()?).connect_http(self.rpc_url.clone());
        let factory =
            PolymarketMarketMakerFactory::new(self.contracts.market_maker_factory, &provider);

        let pending = factory
            .createPolymarketFixedProductMarketMaker(
                self.contracts.conditional_tokens,
                self.contracts.collateral,
                MarketQuestion::from_market(market),
                market.fee_wei(),
            )
            .gas_price(gas_price)
            .send()
            .await
            .context("Failed to submit createPolymarketFixedProductMarketMaker")?;

        info!(tx_hash = %pending.tx_hash(), "createPolymarketFixedProductMarketMaker submitted, waiting for receipt");

        let receipt = pending
            .get_receipt()
            .await
            .context("Failed to get createPolymarketFixedProductMarketMaker receipt")?;
        let logs = receipt.inner.logs().iter().map(|log| log.inner.clone()).collect();

        confirmed(receipt.transaction_hash, ReceiptResponse::status(&receipt), logs)
    }

    async fn condition_id(
        &self,
        oracle: Address,
        question_id: B256,
        outcome_count: usize,
    ) -> Result<B256> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let conditional_tokens = ConditionalTokens::new(self.contracts.conditional_tokens, &provider);

        let condition_id: B256 = conditional_tokens
            .getConditionId(oracle, question_id, U256::from(outcome_count))
            .call()
            .await
            .context("getConditionId call failed")?;

        debug!("getConditionId -> {}", condition_id);
        Ok(condition_id)
    }

    async fn gas_price(&self) -> Result<u128> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let gas_price = provider.get_gas_price().await.context("eth_gasPrice failed")?;
        debug!("Provider gas price: {} wei", gas_price);
        Ok(gas_price)
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let balance = provider.get_balance(address).await.context("eth_getBalance failed")?;
        debug!("Balance of {}: {} wei", address, balance);
        Ok(balance)
    }
}

impl std::fmt::Debug for RpcChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcChain")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("signer", &self.signer_address())
            .finish()
    }
}
