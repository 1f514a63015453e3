//! Prediction market deployment
//!
//! Deploys a market in two on-chain steps and registers it with the catalog:
//! - `identity`: question / condition identifiers (keccak-256 over packed args)
//! - `gas`: gas price resolution (user value -> gas station -> provider estimate)
//! - `chain`: contract bindings and the `MarketChain` seam over an alloy provider
//! - `deploy`: two-transaction deployment state machine
//! - `catalog`: catalog REST client and market registration
//! - `form`: form input, validation and defaults
//! - `network`: per-environment contracts and endpoints
//! - `session`: signer and catalog token for one operator
//! - `creation`: end-to-end submit flow
//!
//! # Contracts
//! - ConditionalTokens: `prepareCondition`, `getConditionId`
//! - PolymarketMarketMakerFactory: `createPolymarketFixedProductMarketMaker`,
//!   event `FixedProductMarketMakerCreation`

pub mod catalog;
pub mod chain;
pub mod creation;
pub mod deploy;
pub mod error;
pub mod form;
pub mod gas;
pub mod identity;
pub mod network;
pub mod session;
pub mod types;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use error::{MarketError, ValidationError};
pub use types::*;

/// Polygon gas station (values in gwei keyed by speed tier)
pub const GAS_STATION_URL: &str = "https://gasstation-mainnet.matic.network/";

/// Gas station tier used for deployments
pub const GAS_STATION_TIER: &str = "fast";

/// Fee applied when the form leaves it at zero (0.02)
pub const DEFAULT_FEE: rust_decimal::Decimal = rust_decimal::Decimal::from_parts(2, 0, 0, false, 2);

/// Outcomes applied when the form provides none
pub const DEFAULT_OUTCOMES: [&str; 2] = ["Yes", "No"];

/// gwei -> wei
pub const WEI_PER_GWEI: u128 = 1_000_000_000;
