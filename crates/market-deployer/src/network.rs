//! Network environments
//!
//! Contract addresses, RPC endpoint and catalog URL per environment.
//!
//! # Environment variables
//! - MARKET_ENVIRONMENT: `mainnet` or `mumbai` (required)
//! - MARKET_RPC_URL: override the Polygon RPC endpoint
//! - MARKET_CATALOG_URL: override the catalog base URL
//! - MARKET_USDC_ADDRESS: override the collateral token

use std::str::FromStr;

use alloy_primitives::{address, Address};
use tracing::debug;

use crate::error::MarketError;

/// Deployment environment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    /// Polygon mainnet (chain 137)
    Mainnet,
    /// Polygon Mumbai testnet (chain 80001)
    Mumbai,
}

impl FromStr for Environment {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" => Ok(Environment::Mainnet),
            "mumbai" => Ok(Environment::Mumbai),
            other => Err(MarketError::Config(format!(
                "invalid environment {other:?}, expected mainnet or mumbai"
            ))),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Mainnet => f.write_str("mainnet"),
            Environment::Mumbai => f.write_str("mumbai"),
        }
    }
}

/// Contracts touched by a deployment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractAddresses {
    pub conditional_tokens: Address,
    pub market_maker_factory: Address,
    /// Collateral token (USDC)
    pub collateral: Address,
    /// Oracle used when the form leaves it empty
    pub default_oracle: Address,
}

/// Resolved network configuration
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    pub environment: Environment,
    pub chain_id: u64,
    pub rpc_url: String,
    pub explorer_url: String,
    /// Empty when the environment has no catalog
    pub catalog_url: String,
    pub contracts: ContractAddresses,
}

impl NetworkConfig {
    /// Built-in defaults for an environment
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Mainnet => Self {
                environment,
                chain_id: 137,
                rpc_url: "https://polygon-rpc.com".to_string(),
                explorer_url: "https://polygonscan.com".to_string(),
                catalog_url: "https://strapi-matic.poly.market".to_string(),
                contracts: ContractAddresses {
                    conditional_tokens: address!("4D97DCd97eC945f40cF65F87097ACe5EA0476045"),
                    market_maker_factory: address!("eF2e639bbDBBAF483Cb8E9FaaE20B96534C740D3"),
                    collateral: address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174"),
                    default_oracle: address!("2EF848Af24eB23E8EA67184B6391B0C5a1775ed5"),
                },
            },
            Environment::Mumbai => Self {
                environment,
                chain_id: 80001,
                rpc_url: "https://rpc-mumbai.matic.today".to_string(),
                explorer_url: "https://explorer-mumbai.maticvigil.com".to_string(),
                catalog_url: String::new(),
                contracts: ContractAddresses {
                    conditional_tokens: address!("7D8610E9567d2a6C9FBf66a5A13E9Ba8bb120d43"),
                    market_maker_factory: address!("b66ad17f931AAbBACa85bc79D28F74284b8eE04c"),
                    collateral: address!("dEe897d5E6eaA6365F293c37cB3fA8335B9B8f3F"),
                    default_oracle: address!("2EF848Af24eB23E8EA67184B6391B0C5a1775ed5"),
                },
            },
        }
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self, MarketError> {
        let environment: Environment = std::env::var("MARKET_ENVIRONMENT")
            .map_err(|_| MarketError::Config("MARKET_ENVIRONMENT is not set".to_string()))?
            .parse()?;

        Self::for_environment(environment).with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup (env vars in production, a map in tests)
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, MarketError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(rpc_url) = non_empty("MARKET_RPC_URL") {
            debug!("RPC URL overridden: {}", rpc_url);
            self.rpc_url = rpc_url;
        }

        if let Some(catalog_url) = non_empty("MARKET_CATALOG_URL") {
            debug!("Catalog URL overridden: {}", catalog_url);
            self.catalog_url = catalog_url;
        }

        if let Some(usdc) = non_empty("MARKET_USDC_ADDRESS") {
            self.contracts.collateral = usdc.trim().parse().map_err(|e| {
                MarketError::Config(format!("MARKET_USDC_ADDRESS {usdc:?} is not an address: {e}"))
            })?;
        }

        Ok(self)
    }

    /// Catalog base URL, or a config error when this environment has none
    pub fn require_catalog_url(&self) -> Result<&str, MarketError> {
        if self.catalog_url.trim().is_empty() {
            return Err(MarketError::Config(format!(
                "no catalog URL for {}; set MARKET_CATALOG_URL",
                self.environment
            )));
        }
        Ok(&self.catalog_url)
    }

    /// Explorer link for an address
    pub fn explorer_address_url(&self, address: Address) -> String {
        format!("{}/address/{}", self.explorer_url.trim_end_matches('/'), address.to_checksum(None))
    }
}
