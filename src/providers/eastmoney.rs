use crate::core::config::ProviderConfig;
use crate::core::{FetchError, Quote, QuoteProvider};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::{debug, error, instrument};

const VALUATION_PATH: &str = "/FundMApi/FundVarietieValuationDetail.ashx";

#[derive(Debug, Deserialize)]
struct ValuationEnvelope {
    #[serde(rename = "Expansion")]
    expansion: Option<Quote>,
}

/// Fund valuation estimates from the Eastmoney mobile API.
pub struct EastmoneyProvider {
    base_url: String,
    client: reqwest::Client,
    last_timestamp: AtomicI64,
}

impl EastmoneyProvider {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(EastmoneyProvider {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            last_timestamp: AtomicI64::new(0),
        })
    }

    /// Cache-busting microsecond timestamp, strictly increasing per provider.
    fn next_timestamp(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_micros();
        match self
            .last_timestamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            }) {
            Ok(last) | Err(last) => now.max(last + 1),
        }
    }
}

#[async_trait]
impl QuoteProvider for EastmoneyProvider {
    #[instrument(
        name = "EastmoneyQuoteFetch",
        skip(self),
        fields(identifier = %identifier)
    )]
    async fn fetch_quote(&self, identifier: &str) -> Result<Quote, FetchError> {
        let url = format!("{}{}", self.base_url, VALUATION_PATH);
        let timestamp = self.next_timestamp().to_string();
        debug!("Requesting valuation from {}", url);

        let network = |source: reqwest::Error| FetchError::Network {
            identifier: identifier.to_string(),
            source,
        };

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("FCODE", identifier),
                ("RANGE", "y"),
                ("deviceid", "Wap"),
                ("plat", "Wap"),
                ("product", "EFund"),
                ("version", "2.0.0"),
                ("_", timestamp.as_str()),
            ])
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                identifier: identifier.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(network)?;
        let envelope: ValuationEnvelope = serde_json::from_str(&body).map_err(|e| {
            error!(error = ?e, response = %body, "Failed to parse valuation response");
            FetchError::Decode {
                identifier: identifier.to_string(),
                message: e.to_string(),
            }
        })?;

        let mut quote = envelope.expansion.ok_or_else(|| FetchError::Decode {
            identifier: identifier.to_string(),
            message: "response has no Expansion object".to_string(),
        })?;
        if quote.identifier.is_empty() {
            quote.identifier = identifier.to_string();
        }

        debug!(
            name = %quote.display_name,
            as_of = %quote.as_of,
            change = %quote.change_percent,
            "Fetched valuation"
        );
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_USER_AGENT;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_ID: &str = "161725";
    const MOCK_JSON: &str = r#"{
        "Datas": [],
        "ErrCode": 0,
        "Expansion": {
            "FCODE": "161725",
            "SHORTNAME": "Baijiu Index",
            "GZTIME": "2024-05-06 15:00",
            "GSZZL": "-1.23",
            "GZ": "1.0234"
        }
    }"#;

    async fn create_mock_server(status_code: u16, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(VALUATION_PATH))
            .and(query_param("FCODE", TEST_ID))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn provider_for(server: &MockServer) -> EastmoneyProvider {
        EastmoneyProvider::new(&ProviderConfig {
            base_url: server.uri(),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_successful_fetch() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(VALUATION_PATH))
            .and(query_param("FCODE", TEST_ID))
            .and(query_param("RANGE", "y"))
            .and(query_param("deviceid", "Wap"))
            .and(query_param("plat", "Wap"))
            .and(query_param("product", "EFund"))
            .and(query_param("version", "2.0.0"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MOCK_JSON))
            .expect(1)
            .mount(&mock_server)
            .await;

        let quote = provider_for(&mock_server).fetch_quote(TEST_ID).await.unwrap();

        assert_eq!(quote.identifier, "161725");
        assert_eq!(quote.display_name, "Baijiu Index");
        assert_eq!(quote.as_of, "2024-05-06 15:00");
        assert_eq!(quote.change_percent, "-1.23");
        assert_eq!(quote.change(), -1.23);

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(
            requests[0].headers.get("user-agent").unwrap(),
            DEFAULT_USER_AGENT
        );
    }

    #[tokio::test]
    async fn test_each_request_carries_a_fresh_timestamp() {
        let mock_server = create_mock_server(200, MOCK_JSON).await;
        let provider = provider_for(&mock_server);

        provider.fetch_quote(TEST_ID).await.unwrap();
        provider.fetch_quote(TEST_ID).await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let stamps: Vec<i64> = requests
            .iter()
            .map(|r| {
                r.url
                    .query_pairs()
                    .find(|(k, _)| k == "_")
                    .map(|(_, v)| v.parse::<i64>().unwrap())
                    .unwrap()
            })
            .collect();
        assert_eq!(stamps.len(), 2);
        assert!(stamps[1] > stamps[0]);
    }

    #[tokio::test]
    async fn test_null_fields_are_tolerated() {
        let body = r#"{"Expansion": {"FCODE": "161725", "SHORTNAME": "Baijiu Index", "GZTIME": null, "GSZZL": null}}"#;
        let mock_server = create_mock_server(200, body).await;

        let quote = provider_for(&mock_server).fetch_quote(TEST_ID).await.unwrap();
        assert_eq!(quote.change_percent, "");
        assert_eq!(quote.change(), 0.0);
    }

    #[tokio::test]
    async fn test_missing_code_falls_back_to_requested_identifier() {
        let body = r#"{"Expansion": {"SHORTNAME": "Baijiu Index", "GSZZL": "0.5"}}"#;
        let mock_server = create_mock_server(200, body).await;

        let quote = provider_for(&mock_server).fetch_quote(TEST_ID).await.unwrap();
        assert_eq!(quote.identifier, TEST_ID);
    }

    #[tokio::test]
    async fn test_missing_envelope_is_decode_error() {
        let mock_server = create_mock_server(200, r#"{"Expansion": null, "ErrCode": 1}"#).await;

        let err = provider_for(&mock_server)
            .fetch_quote(TEST_ID)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
        assert_eq!(err.identifier(), TEST_ID);
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let mock_server = create_mock_server(200, "<html>busy</html>").await;

        let err = provider_for(&mock_server)
            .fetch_quote(TEST_ID)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_error_status() {
        let mock_server = create_mock_server(503, "").await;

        let err = provider_for(&mock_server)
            .fetch_quote(TEST_ID)
            .await
            .unwrap_err();
        match err {
            FetchError::Status { status, .. } => assert_eq!(status.as_u16(), 503),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let provider = EastmoneyProvider::new(&ProviderConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        })
        .unwrap();

        let err = provider.fetch_quote(TEST_ID).await.unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let provider = EastmoneyProvider::new(&ProviderConfig::default()).unwrap();
        let before = chrono::Utc::now().timestamp_micros();

        let stamps: Vec<i64> = (0..1000).map(|_| provider.next_timestamp()).collect();

        assert!(stamps[0] >= before);
        assert!(stamps.windows(2).all(|w| w[1] > w[0]));
    }
}
