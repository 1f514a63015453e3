//! Operator session
//!
//! A session bundles what a signed-in operator brings: a signing chain
//! handle for the selected network and, optionally, a catalog bearer token.
//!
//! # Environment variables
//! - MARKET_PRIVATE_KEY: hex private key of the deploying wallet
//! - MARKET_CATALOG_TOKEN: catalog bearer token (registration only)

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use anyhow::Context;
use tracing::{debug, info};

use crate::chain::{MarketChain, RpcChain};
use crate::error::MarketError;
use crate::network::NetworkConfig;

/// Secrets for a session
#[derive(Clone)]
pub struct SessionCredentials {
    pub private_key: String,
    pub catalog_token: Option<String>,
}

impl SessionCredentials {
    /// Read MARKET_PRIVATE_KEY (required) and MARKET_CATALOG_TOKEN (optional)
    pub fn from_env() -> Option<Self> {
        let private_key = std::env::var("MARKET_PRIVATE_KEY").ok()?;
        let catalog_token = std::env::var("MARKET_CATALOG_TOKEN").ok().filter(|t| !t.trim().is_empty());

        Some(Self { private_key, catalog_token })
    }

    pub fn is_valid(&self) -> bool {
        !self.private_key.trim().is_empty()
    }
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("private_key", &"[REDACTED]")
            .field("catalog_token", &self.catalog_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Connected operator session
pub struct Session {
    network: NetworkConfig,
    chain: Arc<dyn MarketChain>,
    signer_address: Address,
    token: Option<String>,
}

impl Session {
    /// Connect a signing wallet to the network's RPC endpoint
    pub fn connect(
        network: NetworkConfig,
        private_key: &str,
        token: Option<String>,
    ) -> Result<Self, MarketError> {
        let chain = RpcChain::new(&network.rpc_url, network.chain_id, network.contracts, private_key)
            .map_err(|e| MarketError::Config(format!("{:#}", e)))?;
        let signer_address = chain
            .signer_address()
            .ok_or_else(|| MarketError::Config("signing chain has no signer".to_string()))?;

        info!(
            "Session connected: {} (chain {}) as {}",
            network.environment, network.chain_id, signer_address
        );
        Ok(Self::with_chain(network, Arc::new(chain), signer_address, token))
    }

    pub fn from_credentials(
        network: NetworkConfig,
        credentials: SessionCredentials,
    ) -> Result<Self, MarketError> {
        if !credentials.is_valid() {
            return Err(MarketError::Config("MARKET_PRIVATE_KEY is empty".to_string()));
        }
        Self::connect(network, &credentials.private_key, credentials.catalog_token)
    }

    /// Session over an existing chain handle
    pub fn with_chain(
        network: NetworkConfig,
        chain: Arc<dyn MarketChain>,
        signer_address: Address,
        token: Option<String>,
    ) -> Self {
        Self { network, chain, signer_address, token }
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn chain(&self) -> Arc<dyn MarketChain> {
        self.chain.clone()
    }

    pub fn signer_address(&self) -> Address {
        self.signer_address
    }

    /// Native balance of the signing wallet in wei (pays gas for both transactions)
    pub async fn balance(&self) -> anyhow::Result<U256> {
        let balance = self
            .chain
            .balance(self.signer_address)
            .await
            .with_context(|| format!("Failed to get balance of {}", self.signer_address))?;
        debug!("Signer {} holds {} wei", self.signer_address, balance);
        Ok(balance)
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Catalog bearer token, or a config error when the session has none
    pub fn bearer_token(&self) -> Result<&str, MarketError> {
        self.token.as_deref().ok_or_else(|| {
            MarketError::Config("no catalog token; set MARKET_CATALOG_TOKEN".to_string())
        })
    }

    /// End the session, dropping the token
    pub fn close(mut self) {
        self.token = None;
        info!("Session closed for {}", self.signer_address);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("environment", &self.network.environment)
            .field("signer_address", &self.signer_address)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Environment;
    use crate::testkit::{ChainCall, ScriptedChain};

    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn mainnet() -> NetworkConfig {
        NetworkConfig::for_environment(Environment::Mainnet)
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let creds = SessionCredentials {
            private_key: ANVIL_KEY.to_string(),
            catalog_token: Some("jwt-secret".to_string()),
        };

        let debug_str = format!("{:?}", creds);
        assert!(!debug_str.contains("ac0974"));
        assert!(!debug_str.contains("jwt-secret"));
        assert!(creds.is_valid());

        let empty = SessionCredentials { private_key: " ".to_string(), catalog_token: None };
        assert!(!empty.is_valid());
        assert!(matches!(
            Session::from_credentials(mainnet(), empty),
            Err(MarketError::Config(_))
        ));
    }

    #[test]
    fn test_connect_derives_signer_address() {
        let session = Session::connect(mainnet(), ANVIL_KEY, Some("tok".to_string())).unwrap();
        assert_eq!(
            session.signer_address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().unwrap()
        );
        assert_eq!(session.bearer_token().unwrap(), "tok");
        assert!(!format!("{:?}", session).contains("tok\""));
    }

    #[test]
    fn test_connect_rejects_bad_key() {
        assert!(matches!(
            Session::connect(mainnet(), "0x1234", None),
            Err(MarketError::Config(_))
        ));
    }

    #[test]
    fn test_missing_token() {
        let session = Session::with_chain(
            mainnet(),
            Arc::new(ScriptedChain::deploying(Address::ZERO)),
            Address::repeat_byte(0x11),
            None,
        );
        assert!(!session.has_token());
        assert!(matches!(session.bearer_token(), Err(MarketError::Config(_))));
        session.close();
    }

    #[tokio::test]
    async fn test_balance_of_signer() {
        let signer = Address::repeat_byte(0x11);
        let chain = Arc::new(
            ScriptedChain::deploying(Address::ZERO).with_balance(Ok(U256::from(2_500_000u64))),
        );
        let session = Session::with_chain(mainnet(), chain.clone(), signer, None);

        assert_eq!(session.balance().await.unwrap(), U256::from(2_500_000u64));
        assert_eq!(chain.calls(), vec![ChainCall::Balance { address: signer }]);
    }

    #[tokio::test]
    async fn test_balance_lookup_failure() {
        let chain = Arc::new(
            ScriptedChain::deploying(Address::ZERO).with_balance(Err("rpc down".to_string())),
        );
        let session = Session::with_chain(mainnet(), chain, Address::repeat_byte(0x11), None);

        let err = session.balance().await.unwrap_err();
        assert!(format!("{:#}", err).contains("rpc down"));
    }
}
