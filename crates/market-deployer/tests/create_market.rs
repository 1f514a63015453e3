//! Form -> gas -> deploy -> catalog, against a scripted chain and mock HTTP services

use std::sync::Arc;

use alloy_primitives::Address;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use market_deployer::catalog::CatalogClient;
use market_deployer::creation::MarketCreation;
use market_deployer::form::MarketForm;
use market_deployer::gas::GasStationClient;
use market_deployer::network::{Environment, NetworkConfig};
use market_deployer::session::Session;
use market_deployer::testkit::{ChainCall, ScriptedChain};
use market_deployer::{identity, DeployPhase, MarketError};

fn market_maker() -> Address {
    "0x5bc7a5a5bf8b6a1f9df2a5ba1f6b3b5bd1f0ca11".parse().unwrap()
}

fn rain_form() -> MarketForm {
    let mut form = MarketForm::new("Will it rain tomorrow?", "Resolves via official weather report");
    form.add_outcome("Yes");
    form.add_outcome("No");
    form.category = "Weather".to_string();
    form
}

async fn gas_station(fast_gwei: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fast": fast_gwei})))
        .mount(&server)
        .await;
    server
}

fn session(chain: Arc<ScriptedChain>) -> Session {
    Session::with_chain(
        NetworkConfig::for_environment(Environment::Mainnet),
        chain,
        Address::repeat_byte(0x11),
        Some("catalog-jwt".to_string()),
    )
}

#[tokio::test]
async fn rain_market_is_deployed_and_registered() {
    let station = gas_station(30).await;
    let catalog = MockServer::start().await;
    let network = NetworkConfig::for_environment(Environment::Mainnet);

    let question_id = identity::question_id("Will it rain tomorrow?", "Resolves via official weather report");
    let condition_id = identity::condition_id(network.contracts.default_oracle, question_id, 2);

    Mock::given(method("POST"))
        .and(path("/markets"))
        .and(header("authorization", "Bearer catalog-jwt"))
        .and(body_partial_json(json!({
            "market": {
                "question": "Will it rain tomorrow?",
                "slug": "will-it-rain-tomorrow",
                "marketMakerAddress": market_maker().to_checksum(None),
                "conditionId": condition_id.to_string(),
                "outcomes": ["Yes", "No"],
                "outcomePrices": ["0", "0"],
                "fee": "20000000000000000",
                "new": true,
                "active": false,
                "closed": false
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&catalog)
        .await;

    let chain = Arc::new(ScriptedChain::deploying(market_maker()));
    let creation = MarketCreation::new(session(chain.clone()), GasStationClient::with_url(&station.uri()).unwrap())
        .with_catalog(CatalogClient::new(&catalog.uri()).unwrap());

    let outcome = creation.submit(&rain_form()).await.unwrap();

    assert_eq!(outcome.market_maker(), market_maker());
    assert!(outcome.is_registered());
    assert_eq!(creation.deployer().phase(), DeployPhase::Deployed(outcome.deployment.clone()));

    let calls = chain.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[0],
        ChainCall::PrepareCondition {
            oracle: network.contracts.default_oracle,
            question_id,
            outcome_count: 2,
            gas_price: 30_000_000_000,
        }
    );
    assert!(matches!(calls[1], ChainCall::CreateMarketMaker { gas_price: 30_000_000_000, .. }));
    assert!(matches!(calls[2], ChainCall::ConditionId { outcome_count: 2, .. }));
}

#[tokio::test]
async fn catalog_rejection_still_returns_market_maker() {
    let station = gas_station(30).await;
    let catalog = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&catalog)
        .await;

    let chain = Arc::new(ScriptedChain::deploying(market_maker()));
    let creation = MarketCreation::new(session(chain), GasStationClient::with_url(&station.uri()).unwrap())
        .with_catalog(CatalogClient::new(&catalog.uri()).unwrap());

    let outcome = creation.submit(&rain_form()).await.unwrap();
    assert_eq!(outcome.market_maker(), market_maker());
    match outcome.registration {
        Some(Err(MarketError::Registration(message))) => assert!(message.contains("403")),
        other => panic!("expected registration error, got {:?}", other),
    }
}

#[tokio::test]
async fn reverted_condition_never_creates_market_maker() {
    let station = gas_station(30).await;
    let chain = Arc::new(
        ScriptedChain::deploying(market_maker()).with_prepare(Err("transaction reverted".to_string())),
    );
    let creation = MarketCreation::new(session(chain.clone()), GasStationClient::with_url(&station.uri()).unwrap());

    let err = creation.submit(&rain_form()).await.unwrap_err();
    assert!(matches!(err, MarketError::Transaction { committed: None, .. }));
    assert!(!err.has_onchain_effects());
    assert_eq!(chain.calls().len(), 1);
}

#[tokio::test]
async fn station_outage_falls_back_to_provider_price() {
    let station = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&station)
        .await;

    let chain = Arc::new(ScriptedChain::deploying(market_maker()).with_gas_price(Ok(77_000_000_000)));
    let creation = MarketCreation::new(session(chain.clone()), GasStationClient::with_url(&station.uri()).unwrap());

    let outcome = creation.submit(&rain_form()).await.unwrap();
    assert!(outcome.registration.is_none());

    let calls = chain.calls();
    assert_eq!(calls[0], ChainCall::GasPrice);
    assert!(matches!(calls[1], ChainCall::PrepareCondition { gas_price: 77_000_000_000, .. }));
}
