//! Configuration and user input validation.
//!
//! # Responsibilities
//! - Structural wallet address check used by the config flow
//! - Semantic validation of `AppConfig` (serde handles syntactic)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// Required prefix of a Polygon address.
pub const ADDRESS_PREFIX: &str = "0x";

/// Total length of a Polygon address including the prefix.
pub const ADDRESS_LEN: usize = 42;

/// Check that `address` looks like a Polygon wallet address.
///
/// Structural only: `0x` prefix and 42 characters in total. The remaining
/// characters are not checked for hex or checksum validity.
pub fn is_valid_wallet_address(address: &str) -> bool {
    address.starts_with(ADDRESS_PREFIX) && address.chars().count() == ADDRESS_LEN
}

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("polygonscan.api_url '{0}' is not a valid http(s) URL")]
    InvalidApiUrl(String),

    #[error("polygonscan.contract_address '{0}' is not a valid address")]
    InvalidContractAddress(String),

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("{field} '{value}' is not a valid socket address")]
    InvalidBindAddress { field: &'static str, value: String },

    #[error("store.path must not be empty")]
    EmptyStorePath,
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.polygonscan.api_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::InvalidApiUrl(
            config.polygonscan.api_url.clone(),
        )),
    }

    if !is_valid_wallet_address(&config.polygonscan.contract_address) {
        errors.push(ValidationError::InvalidContractAddress(
            config.polygonscan.contract_address.clone(),
        ));
    }

    if config.polygonscan.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "polygonscan.request_timeout_secs",
        });
    }

    if config.polling.update_interval_secs == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "polling.update_interval_secs",
        });
    }

    if config.store.path.trim().is_empty() {
        errors.push(ValidationError::EmptyStorePath);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidBindAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.api.enabled && config.api.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress {
            field: "api.bind_address",
            value: config.api.bind_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
