//! Market form
//!
//! Everything an operator fills in to create a market. Only title and
//! description are required; the rest falls back to defaults when the
//! market is built.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, ValidationError};
use crate::network::ContractAddresses;
use crate::types::{parse_address, Condition, Market, Question};

/// Raw form input (camelCase keys when read from JSON)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketForm {
    pub title: String,
    pub description: String,
    pub outcomes: Vec<String>,
    pub category: String,
    pub image: String,
    pub icon: String,
    /// Fee fraction; zero means the 0.02 default
    pub fee: Decimal,
    /// Empty means the network's default oracle
    pub oracle: String,
    pub resolution_source: String,
    pub submitted_by: String,
    /// YYYY-MM-DD or RFC 3339
    pub end_date: String,
    pub wide_format: bool,
    /// Gas price in gwei; zero means "resolve automatically"
    pub user_defined_gas: Decimal,
}

/// Catalog-only fields carried alongside the deployed market
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDetails {
    pub category: String,
    pub image: String,
    pub icon: String,
    pub resolution_source: String,
    pub submitted_by: String,
    pub end_date: Option<String>,
    pub wide_format: bool,
}

/// Validated form: deployment input plus catalog details
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketSubmission {
    pub market: Market,
    pub details: MarketDetails,
    /// User gas price in gwei, if one was given
    pub user_gas_gwei: Option<Decimal>,
}

impl MarketForm {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), ..Default::default() }
    }

    /// Append an outcome. Blank and duplicate outcomes are ignored.
    pub fn add_outcome(&mut self, outcome: &str) -> bool {
        let outcome = outcome.trim();
        if outcome.is_empty() || self.outcomes.iter().any(|o| o == outcome) {
            return false;
        }
        self.outcomes.push(outcome.to_string());
        true
    }

    /// Remove the first matching outcome
    pub fn remove_outcome(&mut self, outcome: &str) -> bool {
        match self.outcomes.iter().position(|o| o == outcome) {
            Some(index) => {
                self.outcomes.remove(index);
                true
            }
            None => false,
        }
    }

    /// Every problem with the form, empty when it can be submitted
    pub fn problems(&self) -> Vec<ValidationError> {
        let mut problems = Vec::new();

        if self.title.trim().is_empty() {
            problems.push(ValidationError::MissingTitle);
        }
        if self.description.trim().is_empty() {
            problems.push(ValidationError::MissingDescription);
        }

        if self.fee < Decimal::ZERO || self.fee >= Decimal::ONE {
            problems.push(ValidationError::FeeOutOfRange(self.fee));
        }

        if self.outcomes.len() == 1 {
            problems.push(ValidationError::TooFewOutcomes(1));
        }
        for (index, outcome) in self.outcomes.iter().enumerate() {
            if self.outcomes[..index].contains(outcome) {
                problems.push(ValidationError::DuplicateOutcome(outcome.clone()));
            }
        }

        if !self.oracle.trim().is_empty() {
            if let Err(e) = parse_address(&self.oracle) {
                problems.push(e);
            }
        }

        if !self.end_date.trim().is_empty() && parse_end_date(&self.end_date).is_none() {
            problems.push(ValidationError::InvalidEndDate(self.end_date.clone()));
        }

        if self.user_defined_gas < Decimal::ZERO {
            problems.push(ValidationError::NegativeGasPrice(self.user_defined_gas));
        }

        problems
    }

    pub fn validate(&self) -> Result<(), MarketError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(MarketError::Validation(problems))
        }
    }

    /// Validate and apply defaults (outcomes, oracle, fee)
    pub fn to_submission(&self, contracts: &ContractAddresses) -> Result<MarketSubmission, MarketError> {
        self.validate()?;

        let condition =
            Condition::resolve(self.outcomes.clone(), &self.oracle, contracts.default_oracle)?;
        let market = Market::new(
            Question::new(self.title.clone(), self.description.clone()),
            condition,
            self.fee,
        )?;

        let end_date = self.end_date.trim();
        let details = MarketDetails {
            category: self.category.clone(),
            image: self.image.clone(),
            icon: self.icon.clone(),
            resolution_source: self.resolution_source.clone(),
            submitted_by: self.submitted_by.clone(),
            end_date: (!end_date.is_empty()).then(|| end_date.to_string()),
            wide_format: self.wide_format,
        };

        let user_gas_gwei = (self.user_defined_gas > Decimal::ZERO).then_some(self.user_defined_gas);

        Ok(MarketSubmission { market, details, user_gas_gwei })
    }
}

fn parse_end_date(value: &str) -> Option<()> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|_| ()))
        .ok()
}
