use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::error::FetchError;
use crate::core::provider::RateProvider;
use crate::core::rates::{RateTable, SupportedCurrency};
use crate::providers::util::with_retry;

const SUCCESS: &str = "success";

/// Client for the exchangerate-api.com v6 REST API.
pub struct ExchangeRateApiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    retries: usize,
    retry_delay_ms: u64,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("kurs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            retries: 2,
            retry_delay_ms: 500,
        })
    }

    pub fn with_retries(mut self, retries: usize, retry_delay_ms: u64) -> Self {
        self.retries = retries;
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v6/{}/{}", self.base_url, self.api_key, path)
    }

    /// Same as `url` with the key masked, for logs and errors.
    fn redacted_url(&self, path: &str) -> String {
        format!("{}/v6/***/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.url(path);
        let endpoint = self.redacted_url(path);
        debug!("Requesting {}", endpoint);

        let response = with_retry(
            || self.client.get(&url).send(),
            self.retries,
            self.retry_delay_ms,
        )
        .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status, endpoint });
        }

        let text = response.text().await.map_err(|e| e.without_url())?;
        serde_json::from_str(&text).map_err(|source| FetchError::Decode { endpoint, source })
    }
}

#[derive(Debug, Deserialize)]
struct CodesResponse {
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    supported_codes: Vec<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    conversion_rates: HashMap<String, f64>,
}

fn ensure_success(
    result: &str,
    error_type: Option<String>,
    endpoint: String,
) -> Result<(), FetchError> {
    if result == SUCCESS {
        return Ok(());
    }
    Err(FetchError::Unsuccessful {
        endpoint,
        reason: error_type.unwrap_or_else(|| format!("result \"{result}\"")),
    })
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    #[instrument(name = "SupportedCodesFetch", skip(self))]
    async fn supported_codes(&self) -> Result<Vec<SupportedCurrency>, FetchError> {
        let data: CodesResponse = self.get_json("codes").await?;
        ensure_success(&data.result, data.error_type, self.redacted_url("codes"))?;

        debug!(count = data.supported_codes.len(), "Received supported codes");
        Ok(data
            .supported_codes
            .into_iter()
            .map(|(code, name)| SupportedCurrency {
                code: code.to_uppercase(),
                name,
            })
            .collect())
    }

    #[instrument(name = "LatestRatesFetch", skip(self), fields(base = %base))]
    async fn latest_rates(&self, base: &str) -> Result<RateTable, FetchError> {
        let path = format!("latest/{}", base.to_uppercase());
        let data: LatestResponse = self.get_json(&path).await?;
        ensure_success(&data.result, data.error_type, self.redacted_url(&path))?;
        if data.conversion_rates.is_empty() {
            return Err(FetchError::Unsuccessful {
                endpoint: self.redacted_url(&path),
                reason: "no conversion rates".to_string(),
            });
        }

        debug!(count = data.conversion_rates.len(), "Received conversion rates");
        RateTable::try_from(data.conversion_rates).map_err(|reason| FetchError::Unsuccessful {
            endpoint: self.redacted_url(&path),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "test-key";

    async fn create_mock_server(endpoint: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/v6/{KEY}/{endpoint}")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn provider_for(server: &MockServer) -> ExchangeRateApiProvider {
        ExchangeRateApiProvider::new(&server.uri(), KEY)
            .unwrap()
            .with_retries(0, 0)
    }

    #[tokio::test]
    async fn test_successful_codes_fetch() {
        let mock_response = r#"{
            "result": "success",
            "documentation": "https://www.exchangerate-api.com/docs",
            "supported_codes": [["AED", "UAE Dirham"], ["usd", "United States Dollar"]]
        }"#;
        let server = create_mock_server("codes", 200, mock_response).await;

        let codes = provider_for(&server).supported_codes().await.unwrap();
        assert_eq!(
            codes,
            vec![
                SupportedCurrency {
                    code: "AED".to_string(),
                    name: "UAE Dirham".to_string()
                },
                SupportedCurrency {
                    code: "USD".to_string(),
                    name: "United States Dollar".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_successful_latest_fetch() {
        let mock_response = r#"{
            "result": "success",
            "base_code": "USD",
            "time_last_update_unix": 1585267200,
            "conversion_rates": {"USD": 1, "EUR": 0.9013, "idr": 16250.5}
        }"#;
        let server = create_mock_server("latest/USD", 200, mock_response).await;

        let rates = provider_for(&server).latest_rates("usd").await.unwrap();
        assert_eq!(rates.len(), 3);
        assert_eq!(rates.get("USD"), Some(1.0));
        assert_eq!(rates.get("EUR"), Some(0.9013));
        assert_eq!(rates.get("IDR"), Some(16250.5));
    }

    #[tokio::test]
    async fn test_provider_reported_error() {
        let mock_response = r#"{"result": "error", "error-type": "invalid-key"}"#;
        let server = create_mock_server("latest/USD", 200, mock_response).await;

        let err = provider_for(&server).latest_rates("USD").await.unwrap_err();
        assert!(matches!(err, FetchError::Unsuccessful { .. }));
        let message = err.to_string();
        assert!(message.contains("invalid-key"));
        assert!(message.contains("/v6/***/latest/USD"));
        assert!(!message.contains(KEY));
    }

    #[tokio::test]
    async fn test_success_without_rates_is_rejected() {
        let mock_response = r#"{"result": "success", "conversion_rates": {}}"#;
        let server = create_mock_server("latest/USD", 200, mock_response).await;

        let err = provider_for(&server).latest_rates("USD").await.unwrap_err();
        assert!(err.to_string().contains("no conversion rates"));
    }

    #[tokio::test]
    async fn test_zero_rate_is_rejected() {
        let mock_response = r#"{"result": "success", "conversion_rates": {"USD": 1, "EUR": 0}}"#;
        let server = create_mock_server("latest/USD", 200, mock_response).await;

        let err = provider_for(&server).latest_rates("USD").await.unwrap_err();
        assert!(err.to_string().contains("invalid rate 0 for EUR"), "{err}");
    }

    #[tokio::test]
    async fn test_missing_result_field_is_decode_error() {
        let server = create_mock_server("codes", 200, r#"{"supported_codes": []}"#).await;

        let err = provider_for(&server).supported_codes().await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
        assert!(
            err.to_string()
                .contains("Failed to parse JSON response for")
        );
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = create_mock_server("latest/USD", 500, "").await;

        let err = provider_for(&server).latest_rates("USD").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "HTTP error: 500 Internal Server Error for {}/v6/***/latest/USD",
                server.uri()
            )
        );
    }

    #[tokio::test]
    async fn test_unknown_endpoint_is_not_found() {
        let server = create_mock_server("codes", 200, "{}").await;

        let err = provider_for(&server).latest_rates("EUR").await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Status { status, .. } if status == reqwest::StatusCode::NOT_FOUND
        ));
    }
}
