//! Polygonscan HTTP client with timeout and error handling.
//!
//! # Responsibilities
//! - Issue account queries against the explorer endpoint
//! - Probe an API key with a cheap `action=balance` call
//! - Fetch and scale the tracked token balance
//! - Handle timeouts and network errors gracefully

use std::time::Duration;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use tokio::time::timeout;

use crate::blockchain::types::{
    scale_token_amount, ApiResponse, PolygonscanError, PolygonscanResult, BALANCE_PRECISION,
    GEOD_DECIMALS,
};
use crate::config::PolygonscanConfig;

/// Client for the explorer's account module.
///
/// API keys are passed per call and only ever travel as a query parameter;
/// they are never stored on the client or written to logs.
#[derive(Clone)]
pub struct PolygonscanClient {
    http: reqwest::Client,
    api_url: String,
    contract_address: String,
    timeout_secs: u64,
}

impl PolygonscanClient {
    /// Create a new client from configuration.
    pub fn new(config: &PolygonscanConfig) -> PolygonscanResult<Self> {
        url::Url::parse(&config.api_url).map_err(|e| {
            PolygonscanError::Config(format!("Invalid API URL '{}': {}", config.api_url, e))
        })?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("geod-balance/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PolygonscanError::Config(e.to_string()))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            contract_address: config.contract_address.clone(),
            timeout_secs: config.request_timeout_secs,
        })
    }

    /// Check that `api_key` is accepted by the explorer.
    ///
    /// Any failure (rejected key, HTTP error, timeout, network error) yields
    /// `false` after being logged.
    pub async fn validate_api_key(&self, api_key: &str, wallet_address: &str) -> bool {
        let params = [
            ("module", "account"),
            ("action", "balance"),
            ("address", wallet_address),
            ("tag", "latest"),
            ("apikey", api_key),
        ];

        match self.query(&params).await {
            Ok(response) if response.is_ok() => true,
            Ok(response) => {
                tracing::error!(
                    endpoint = %self.api_url,
                    message = %response.message,
                    "Polygonscan API key validation failed"
                );
                false
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.api_url,
                    error = %e,
                    "Error validating Polygonscan API key"
                );
                false
            }
        }
    }

    /// Fetch the token balance of `wallet_address` in whole tokens.
    pub async fn fetch_token_balance(
        &self,
        wallet_address: &str,
        api_key: &str,
    ) -> PolygonscanResult<Decimal> {
        let params = [
            ("module", "account"),
            ("action", "tokenbalance"),
            ("contractaddress", self.contract_address.as_str()),
            ("address", wallet_address),
            ("tag", "latest"),
            ("apikey", api_key),
        ];

        let response = self.query(&params).await?;
        if !response.is_ok() {
            return Err(PolygonscanError::Api(response.message));
        }

        let raw = response.result_str().ok_or_else(|| {
            PolygonscanError::Decode(format!("result is not a string: {}", response.result))
        })?;

        let balance = scale_token_amount(raw, GEOD_DECIMALS, BALANCE_PRECISION)?;
        tracing::debug!(wallet = %wallet_address, balance = %balance, "Fetched token balance");
        Ok(balance)
    }

    /// Send one GET and decode the JSON envelope, all under one deadline.
    async fn query(&self, params: &[(&str, &str)]) -> PolygonscanResult<ApiResponse> {
        let request = async {
            let response = self
                .http
                .get(&self.api_url)
                .query(params)
                .send()
                .await
                .map_err(transport_error)?;

            let status = response.status();
            if status != StatusCode::OK {
                return Err(PolygonscanError::Http(status.as_u16()));
            }

            response.json::<ApiResponse>().await.map_err(|e| {
                if e.is_decode() {
                    PolygonscanError::Decode(e.without_url().to_string())
                } else {
                    transport_error(e)
                }
            })
        };

        match timeout(self.timeout(), request).await {
            Ok(result) => result,
            Err(_) => Err(PolygonscanError::Timeout(self.timeout_secs)),
        }
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Endpoint base URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// The request URL embeds the API key, so strip it before the error is
/// rendered anywhere.
fn transport_error(err: reqwest::Error) -> PolygonscanError {
    PolygonscanError::Transport(err.without_url().to_string())
}

impl std::fmt::Debug for PolygonscanClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolygonscanClient")
            .field("api_url", &self.api_url)
            .field("contract_address", &self.contract_address)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> PolygonscanConfig {
        PolygonscanConfig {
            // Port 9 (discard) is not expected to be listening locally.
            api_url: "http://127.0.0.1:9/api".to_string(),
            request_timeout_secs: 2,
            ..PolygonscanConfig::default()
        }
    }

    #[test]
    fn test_rejects_invalid_url() {
        let config = PolygonscanConfig {
            api_url: "not a url".to_string(),
            ..PolygonscanConfig::default()
        };
        let err = PolygonscanClient::new(&config).unwrap_err();
        assert!(err.to_string().contains("Invalid API URL"));
    }

    #[tokio::test]
    async fn test_validate_api_key_network_failure_is_false() {
        let client = PolygonscanClient::new(&unreachable_config()).unwrap();
        let valid = client
            .validate_api_key("secret-key", "0xAC0F66379A6d7801D7726d5a943356A172549Adb")
            .await;
        assert!(!valid);
    }

    #[tokio::test]
    async fn test_fetch_error_does_not_leak_key() {
        let client = PolygonscanClient::new(&unreachable_config()).unwrap();
        let err = client
            .fetch_token_balance("0xAC0F66379A6d7801D7726d5a943356A172549Adb", "secret-key")
            .await
            .unwrap_err();
        assert!(!err.to_string().contains("secret-key"));
    }

    #[test]
    fn test_debug_output() {
        let client = PolygonscanClient::new(&PolygonscanConfig::default()).unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("api.polygonscan.com"));
        assert_eq!(client.timeout(), Duration::from_secs(10));
    }
}
