//! Gas price resolution
//!
//! # Tiers (first usable price wins)
//! 1. User-supplied gwei value
//! 2. Gas station "fast" tier
//! 3. Provider's own estimate
//!
//! Every tier but the last may fail softly: the error is logged and the next
//! tier is tried. The last tier's failure is the resolver's failure.
//! No retries and no caching between calls.

mod station;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::chain::MarketChain;
use crate::error::MarketError;
use crate::{GAS_STATION_TIER, WEI_PER_GWEI};

pub use station::GasStationClient;

/// One source of gas prices
#[async_trait]
pub trait GasPriceSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Price in wei, `None` when this source has nothing to offer
    async fn gas_price(&self) -> Result<Option<u128>>;
}

/// gwei -> wei, rounded up to a whole wei
pub fn gwei_to_wei(gwei: Decimal) -> Option<u128> {
    gwei.checked_mul(Decimal::from(WEI_PER_GWEI as u64))?.ceil().to_u128()
}

/// Tier 1: price typed in by the user. Zero or absent means "not set".
pub struct UserGasPrice {
    gwei: Option<Decimal>,
}

impl UserGasPrice {
    pub fn new(gwei: Option<Decimal>) -> Self {
        Self { gwei }
    }
}

#[async_trait]
impl GasPriceSource for UserGasPrice {
    fn name(&self) -> &'static str {
        "user"
    }

    async fn gas_price(&self) -> Result<Option<u128>> {
        match self.gwei {
            Some(gwei) if gwei > Decimal::ZERO => {
                let wei = gwei_to_wei(gwei)
                    .ok_or_else(|| anyhow::anyhow!("gas price {} gwei is out of range", gwei))?;
                Ok(Some(wei))
            }
            _ => Ok(None),
        }
    }
}

/// Tier 2: gas station, rounded up to whole gwei
pub struct StationGasPrice {
    client: GasStationClient,
    tier: String,
}

impl StationGasPrice {
    pub fn new(client: GasStationClient) -> Self {
        Self::with_tier(client, GAS_STATION_TIER)
    }

    pub fn with_tier(client: GasStationClient, tier: &str) -> Self {
        Self { client, tier: tier.to_string() }
    }
}

#[async_trait]
impl GasPriceSource for StationGasPrice {
    fn name(&self) -> &'static str {
        "gas station"
    }

    async fn gas_price(&self) -> Result<Option<u128>> {
        let gwei = self.client.tier_gwei(&self.tier).await?;
        let wei = Decimal::from_f64(gwei.ceil())
            .and_then(gwei_to_wei)
            .ok_or_else(|| anyhow::anyhow!("{:?} tier price {} gwei is out of range", self.tier, gwei))?;
        Ok(Some(wei))
    }
}

/// Tier 3: connected provider's estimate
pub struct ProviderGasPrice {
    chain: Arc<dyn MarketChain>,
}

impl ProviderGasPrice {
    pub fn new(chain: Arc<dyn MarketChain>) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl GasPriceSource for ProviderGasPrice {
    fn name(&self) -> &'static str {
        "provider"
    }

    async fn gas_price(&self) -> Result<Option<u128>> {
        Ok(Some(self.chain.gas_price().await?))
    }
}

/// Ordered list of gas price sources
pub struct GasPriceResolver {
    sources: Vec<Box<dyn GasPriceSource>>,
}

impl GasPriceResolver {
    pub fn new(sources: Vec<Box<dyn GasPriceSource>>) -> Self {
        Self { sources }
    }

    /// user -> gas station -> provider
    pub fn standard(
        user_gwei: Option<Decimal>,
        station: GasStationClient,
        chain: Arc<dyn MarketChain>,
    ) -> Self {
        Self::new(vec![
            Box::new(UserGasPrice::new(user_gwei)),
            Box::new(StationGasPrice::new(station)),
            Box::new(ProviderGasPrice::new(chain)),
        ])
    }

    /// Resolve a positive gas price in wei
    pub async fn resolve(&self) -> Result<u128, MarketError> {
        let mut last_error: Option<String> = None;

        for source in &self.sources {
            match source.gas_price().await {
                Ok(Some(wei)) if wei > 0 => {
                    info!("Gas price from {}: {} wei", source.name(), wei);
                    return Ok(wei);
                }
                Ok(Some(_)) => {
                    warn!("{} returned a zero gas price, trying next source", source.name());
                    last_error = Some(format!("{} returned a zero gas price", source.name()));
                }
                Ok(None) => {
                    debug!("No gas price from {}", source.name());
                }
                Err(e) => {
                    warn!("Failed to get gas price from {}: {:#}", source.name(), e);
                    last_error = Some(format!("{}: {:#}", source.name(), e));
                }
            }
        }

        Err(MarketError::GasPrice(
            last_error.unwrap_or_else(|| "no gas price source produced a price".to_string()),
        ))
    }
}
