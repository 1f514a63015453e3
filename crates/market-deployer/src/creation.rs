//! End-to-end market creation
//!
//! validate form -> build market -> resolve gas -> deploy -> register
//!
//! A deployment failure is the call's error. A registration failure is
//! reported inside the outcome, next to the deployed address.

use alloy_primitives::Address;
use tracing::{info, warn};

use crate::catalog::{CatalogClient, CatalogResponse, MarketRegistrar};
use crate::deploy::MarketDeployer;
use crate::error::MarketError;
use crate::form::MarketForm;
use crate::gas::{GasPriceResolver, GasStationClient};
use crate::session::Session;
use crate::types::Deployment;

/// Result of a submitted form
#[derive(Debug)]
pub struct CreationOutcome {
    pub deployment: Deployment,
    /// None when registration was skipped
    pub registration: Option<Result<CatalogResponse, MarketError>>,
}

impl CreationOutcome {
    pub fn market_maker(&self) -> Address {
        self.deployment.market_maker
    }

    pub fn is_registered(&self) -> bool {
        matches!(self.registration, Some(Ok(_)))
    }
}

/// Creates markets for one session
pub struct MarketCreation {
    session: Session,
    deployer: MarketDeployer,
    gas_station: GasStationClient,
    registrar: Option<MarketRegistrar>,
}

impl MarketCreation {
    /// Deploy-only creation (no catalog registration)
    pub fn new(session: Session, gas_station: GasStationClient) -> Self {
        let deployer = MarketDeployer::new(session.chain());
        Self { session, deployer, gas_station, registrar: None }
    }

    /// Register deployed markets with `catalog`
    pub fn with_catalog(mut self, catalog: CatalogClient) -> Self {
        self.registrar = Some(MarketRegistrar::new(self.session.chain(), catalog));
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Phase tracking for the running deployment
    pub fn deployer(&self) -> &MarketDeployer {
        &self.deployer
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Submit a form
    pub async fn submit(&self, form: &MarketForm) -> Result<CreationOutcome, MarketError> {
        if self.deployer.is_in_flight() {
            return Err(MarketError::InProgress);
        }

        let submission = form.to_submission(&self.session.network().contracts)?;
        info!(
            "Creating market {:?} on {} ({} outcomes, fee {})",
            submission.market.question.title,
            self.session.network().environment,
            submission.market.condition.outcome_count(),
            submission.market.fee
        );

        let gas_price = GasPriceResolver::standard(
            submission.user_gas_gwei,
            self.gas_station.clone(),
            self.session.chain(),
        )
        .resolve()
        .await?;

        let deployment = self.deployer.deploy(&submission.market, gas_price).await?;
        info!(
            "Deployed: {}",
            self.session.network().explorer_address_url(deployment.market_maker)
        );

        let registration = match &self.registrar {
            Some(registrar) => {
                let result = match self.session.bearer_token() {
                    Ok(token) => registrar.register(&submission, deployment.market_maker, token).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = &result {
                    warn!("Market {} deployed but not registered: {}", deployment.market_maker, e);
                }
                Some(result)
            }
            None => None,
        };

        Ok(CreationOutcome { deployment, registration })
    }
}
