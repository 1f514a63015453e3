//! Catalog REST client and market registration
//!
//! # Endpoints
//! - POST /markets - Register a deployed market (bearer auth)
//! - GET /users/me - Identify the bearer token's user
//!
//! Registration runs only after deployment succeeded. Its failure never
//! implies the market is missing on-chain.

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::chain::MarketChain;
use crate::error::MarketError;
use crate::form::MarketSubmission;

/// Market record as stored by the catalog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogMarket {
    pub question: String,
    pub description: String,
    pub slug: String,
    pub category: String,
    pub image: String,
    pub icon: String,
    #[serde(rename = "marketMakerAddress")]
    pub market_maker_address: String,
    /// One "0" per outcome until trading starts
    #[serde(rename = "outcomePrices")]
    pub outcome_prices: Vec<String>,
    pub outcomes: Vec<String>,
    pub resolution_source: String,
    /// Empty when the form has no end date
    pub end_date: String,
    pub submitted_by: String,
    pub liquidity: String,
    #[serde(rename = "conditionId")]
    pub condition_id: String,
    pub volume: String,
    /// Fee in 18-decimal fixed point, as a decimal string
    pub fee: String,
    pub wide_format: bool,
    pub new: bool,
    pub active: bool,
    pub closed: bool,
}

impl CatalogMarket {
    /// Record for a freshly deployed market: new, inactive, no volume
    pub fn new(submission: &MarketSubmission, market_maker: Address, condition_id: B256) -> Self {
        let market = &submission.market;
        let details = &submission.details;

        Self {
            question: market.question.title.clone(),
            description: market.question.description.clone(),
            slug: slugify(&market.question.title),
            category: details.category.clone(),
            image: details.image.clone(),
            icon: details.icon.clone(),
            market_maker_address: market_maker.to_checksum(None),
            outcome_prices: market.condition.outcomes.iter().map(|_| "0".to_string()).collect(),
            outcomes: market.condition.outcomes.clone(),
            resolution_source: details.resolution_source.clone(),
            end_date: details.end_date.clone().unwrap_or_default(),
            submitted_by: details.submitted_by.clone(),
            liquidity: "0".to_string(),
            condition_id: condition_id.to_string(),
            volume: "0".to_string(),
            fee: market.fee_wei().to_string(),
            wide_format: details.wide_format,
            new: true,
            active: false,
            closed: false,
        }
    }
}

#[derive(Serialize)]
struct AddMarketRequest<'a> {
    market: &'a CatalogMarket,
}

/// Catalog response
#[derive(Clone, Debug)]
pub struct CatalogResponse {
    pub status: u16,
    pub body: Value,
}

/// URL slug: lowercase, whitespace -> '-', only [a-z0-9_-], no repeated or edge dashes
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.to_lowercase().chars() {
        if c.is_whitespace() || c == '-' {
            pending_dash = true;
        } else if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        }
    }

    slug
}

/// Catalog REST client
#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    /// Create a client for a catalog base URL
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST /markets with `{ "market": {...} }`
    pub async fn add_market(&self, market: &CatalogMarket, token: &str) -> Result<CatalogResponse> {
        let url = format!("{}/markets", self.base_url);
        debug!("POST {} (slug={})", url, market.slug);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&AddMarketRequest { market })
            .send()
            .await
            .context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("HTTP {} for {}: {}", status, url, body);
        }

        let body = response.json().await.unwrap_or(Value::Null);
        Ok(CatalogResponse { status: status.as_u16(), body })
    }

    /// GET /users/me
    pub async fn current_user(&self, token: &str) -> Result<Value> {
        let url = format!("{}/users/me", self.base_url);
        debug!("GET {}", url);

        let response =
            self.client.get(&url).bearer_auth(token).send().await.context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("HTTP {} for {}: {}", status, url, body);
        }

        response.json().await.context("Failed to parse user")
    }
}

/// Looks up the condition id and writes the market to the catalog
pub struct MarketRegistrar {
    chain: Arc<dyn MarketChain>,
    catalog: CatalogClient,
}

impl MarketRegistrar {
    pub fn new(chain: Arc<dyn MarketChain>, catalog: CatalogClient) -> Self {
        Self { chain, catalog }
    }

    /// Register a deployed market. Single attempt, no retry.
    pub async fn register(
        &self,
        submission: &MarketSubmission,
        market_maker: Address,
        token: &str,
    ) -> Result<CatalogResponse, MarketError> {
        let market = &submission.market;
        let condition = &market.condition;

        let condition_id = self
            .chain
            .condition_id(condition.oracle, market.question_id(), condition.outcome_count())
            .await
            .map_err(|e| MarketError::Registration(format!("condition id lookup failed: {:#}", e)))?;

        let record = CatalogMarket::new(submission, market_maker, condition_id);
        info!("Registering market {} ({}) with catalog", record.slug, record.market_maker_address);

        match self.catalog.add_market(&record, token).await {
            Ok(response) => {
                info!("Catalog accepted market: HTTP {}", response.status);
                Ok(response)
            }
            Err(e) => {
                warn!("Catalog registration failed for {}: {:#}", record.market_maker_address, e);
                Err(MarketError::Registration(format!("{:#}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::MarketForm;
    use crate::identity;
    use crate::network::{Environment, NetworkConfig};
    use crate::testkit::{ChainCall, ScriptedChain};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn submission() -> MarketSubmission {
        let mut form = MarketForm::new("Will it rain tomorrow?", "Resolves via official weather report");
        form.category = "Weather".to_string();
        form.submitted_by = "ops".to_string();
        form.to_submission(&NetworkConfig::for_environment(Environment::Mainnet).contracts).unwrap()
    }

    fn maker() -> Address {
        "0x00000000000000000000000000000000000000ab".parse().unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Will it rain tomorrow?"), "will-it-rain-tomorrow");
        assert_eq!(slugify("  BTC  >  $100k -- by 2026! "), "btc-100k-by-2026");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_catalog_record() {
        let submission = submission();
        let condition_id = B256::repeat_byte(0xcd);
        let record = CatalogMarket::new(&submission, maker(), condition_id);

        assert_eq!(record.slug, "will-it-rain-tomorrow");
        assert_eq!(record.outcomes, vec!["Yes", "No"]);
        assert_eq!(record.outcome_prices, vec!["0", "0"]);
        assert_eq!(record.fee, "20000000000000000");
        assert_eq!(record.condition_id, condition_id.to_string());
        assert!(record.new && !record.active && !record.closed);

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("marketMakerAddress").is_some());
        assert!(json.get("outcomePrices").is_some());
        assert!(json.get("conditionId").is_some());
        assert!(json.get("resolution_source").is_some());
        assert!(json.get("wide_format").is_some());
    }

    #[test]
    fn test_missing_end_date_is_empty_string() {
        let record = CatalogMarket::new(&submission(), maker(), B256::ZERO);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["end_date"], json!(""));

        let mut form = MarketForm::new("t", "d");
        form.end_date = "2026-12-31".to_string();
        let dated = form
            .to_submission(&NetworkConfig::for_environment(Environment::Mainnet).contracts)
            .unwrap();
        assert_eq!(CatalogMarket::new(&dated, maker(), B256::ZERO).end_date, "2026-12-31");
    }

    #[tokio::test]
    async fn test_add_market_posts_wrapped_record_with_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/markets"))
            .and(header("authorization", "Bearer token-123"))
            .and(body_partial_json(json!({"market": {"slug": "will-it-rain-tomorrow", "new": true}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let client = CatalogClient::new(&format!("{}/", server.uri())).unwrap();
        let record = CatalogMarket::new(&submission(), maker(), B256::ZERO);
        let response = client.add_market(&record, "token-123").await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"id": 7}));
    }

    #[tokio::test]
    async fn test_register_queries_condition_id() {
        let server = MockServer::start().await;
        let submission = submission();
        let market = &submission.market;
        let expected_condition = identity::condition_id(
            market.condition.oracle,
            market.question_id(),
            market.condition.outcome_count(),
        );

        Mock::given(method("POST"))
            .and(path("/markets"))
            .and(body_partial_json(json!({"market": {"conditionId": expected_condition.to_string()}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let chain = Arc::new(ScriptedChain::deploying(maker()));
        let registrar = MarketRegistrar::new(chain.clone(), CatalogClient::new(&server.uri()).unwrap());

        let response = registrar.register(&submission, maker(), "t").await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(
            chain.calls(),
            vec![ChainCall::ConditionId {
                oracle: market.condition.oracle,
                question_id: market.question_id(),
                outcome_count: 2,
            }]
        );
    }

    #[tokio::test]
    async fn test_register_reports_catalog_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid token"))
            .mount(&server)
            .await;

        let registrar = MarketRegistrar::new(
            Arc::new(ScriptedChain::deploying(maker())),
            CatalogClient::new(&server.uri()).unwrap(),
        );

        match registrar.register(&submission(), maker(), "bad").await {
            Err(MarketError::Registration(message)) => assert!(message.contains("401")),
            other => panic!("expected registration error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_reports_condition_lookup_failure() {
        let chain = Arc::new(
            ScriptedChain::deploying(maker()).with_condition_id(Err("call reverted".to_string())),
        );
        let registrar = MarketRegistrar::new(chain, CatalogClient::new("http://127.0.0.1:9").unwrap());

        let err = registrar.register(&submission(), maker(), "t").await.unwrap_err();
        assert!(matches!(err, MarketError::Registration(ref m) if m.contains("call reverted")));
    }

    #[tokio::test]
    async fn test_current_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"email": "ops@example.com"})))
            .mount(&server)
            .await;

        let client = CatalogClient::new(&server.uri()).unwrap();
        let user = client.current_user("abc").await.unwrap();
        assert_eq!(user["email"], "ops@example.com");
    }
}
