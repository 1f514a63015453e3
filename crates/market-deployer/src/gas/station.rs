//! Gas station REST client
//!
//! GET https://gasstation-mainnet.matic.network/
//!
//! Response is a JSON object of gwei prices keyed by speed tier:
//! `{"safeLow": 30, "standard": 35, "fast": 40, "fastest": 60, ...}`

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::GAS_STATION_URL;

/// Gas station client
#[derive(Clone)]
pub struct GasStationClient {
    client: Client,
    url: String,
}

impl GasStationClient {
    /// Create a client for the default gas station
    pub fn new() -> Result<Self> {
        Self::with_url(GAS_STATION_URL)
    }

    /// Create a client for a custom gas station URL
    pub fn with_url(url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, url: url.to_string() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the raw price table
    pub async fn fetch(&self) -> Result<Value> {
        debug!("GET {}", self.url);

        let response = self.client.get(&self.url).send().await.context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("HTTP {} for {}: {}", status, self.url, body);
        }

        response.json().await.context("Failed to parse gas station response")
    }

    /// Price for one tier in gwei
    pub async fn tier_gwei(&self, tier: &str) -> Result<f64> {
        let table = self.fetch().await?;
        let gwei = table
            .get(tier)
            .and_then(Value::as_f64)
            .with_context(|| format!("Gas station response has no numeric {:?} tier", tier))?;

        if !gwei.is_finite() || gwei <= 0.0 {
            anyhow::bail!("Gas station returned unusable {:?} price: {}", tier, gwei);
        }

        Ok(gwei)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_creation() {
        let client = GasStationClient::new().unwrap();
        assert_eq!(client.url(), GAS_STATION_URL);
    }

    #[tokio::test]
    async fn test_tier_gwei() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"safeLow": 20, "standard": 25, "fast": 30.5})),
            )
            .mount(&server)
            .await;

        let client = GasStationClient::with_url(&server.uri()).unwrap();
        assert_eq!(client.tier_gwei("fast").await.unwrap(), 30.5);
        assert_eq!(client.tier_gwei("safeLow").await.unwrap(), 20.0);
    }

    #[tokio::test]
    async fn test_missing_tier() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"standard": 25})))
            .mount(&server)
            .await;

        let client = GasStationClient::with_url(&server.uri()).unwrap();
        assert!(client.tier_gwei("fast").await.is_err());
    }

    #[tokio::test]
    async fn test_non_numeric_tier() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"fast": {"maxFee": 40}})),
            )
            .mount(&server)
            .await;

        let client = GasStationClient::with_url(&server.uri()).unwrap();
        assert!(client.tier_gwei("fast").await.is_err());
    }

    #[tokio::test]
    async fn test_non_positive_tier_rejected() {
        for fast in [json!(-5), json!(0)] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fast": fast})))
                .mount(&server)
                .await;

            let client = GasStationClient::with_url(&server.uri()).unwrap();
            let err = client.tier_gwei("fast").await.unwrap_err();
            assert!(err.to_string().contains("unusable"), "fast = {}", fast);
        }
    }

    #[tokio::test]
    async fn test_huge_tier_passes_through_as_gwei() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fast": 1e30})))
            .mount(&server)
            .await;

        // Range checking against wei happens in the resolver tier
        let client = GasStationClient::with_url(&server.uri()).unwrap();
        assert_eq!(client.tier_gwei("fast").await.unwrap(), 1e30);
    }

    #[tokio::test]
    async fn test_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let client = GasStationClient::with_url(&server.uri()).unwrap();
        let err = client.tier_gwei("fast").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
