//! Explorer API types, constants and error definitions.

use alloy::primitives::U256;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Public Polygonscan API endpoint.
pub const POLYGONSCAN_API_URL: &str = "https://api.polygonscan.com/api";

/// GEOD token contract on Polygon.
pub const GEOD_CONTRACT_ADDRESS: &str = "0xAC0F66379A6d7801D7726d5a943356A172549Adb";

/// Decimals of the GEOD token.
pub const GEOD_DECIMALS: u32 = 18;

/// Fractional digits kept in published balances.
pub const BALANCE_PRECISION: u32 = 6;

/// `status` value the explorer uses for a successful call.
pub const STATUS_OK: &str = "1";

/// Envelope returned by every Polygonscan account query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub message: String,

    /// Usually a decimal string; error responses may carry other JSON.
    #[serde(default)]
    pub result: serde_json::Value,
}

impl ApiResponse {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// The `result` field as a string, if it is one.
    pub fn result_str(&self) -> Option<&str> {
        self.result.as_str()
    }
}

/// Errors that can occur while talking to the explorer.
#[derive(Debug, Error)]
pub enum PolygonscanError {
    /// Endpoint answered with a non-200 status.
    #[error("HTTP {0}")]
    Http(u16),

    /// Endpoint answered but reported `status != "1"`.
    #[error("API error: {0}")]
    Api(String),

    /// Request did not complete within the configured timeout.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Connection or protocol failure. Never contains the request URL.
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body was not the expected JSON.
    #[error("malformed response: {0}")]
    Decode(String),

    /// `result` was not an integer amount or does not fit a decimal.
    #[error("invalid token amount: {0}")]
    InvalidAmount(String),

    /// Client could not be constructed.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// Result type for explorer operations.
pub type PolygonscanResult<T> = Result<T, PolygonscanError>;

/// A failed poll, reported to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UpdateFailed {
    pub message: String,
}

impl UpdateFailed {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<PolygonscanError> for UpdateFailed {
    fn from(err: PolygonscanError) -> Self {
        Self::new(format!("Error fetching GEOD balance: {}", err))
    }
}

/// Convert a raw integer token amount into a rounded decimal.
///
/// `raw / 10^decimals`, rounded half away from zero to `precision` places.
/// Integer arithmetic throughout; `precision` must not exceed `decimals`.
pub fn scale_token_amount(raw: &str, decimals: u32, precision: u32) -> PolygonscanResult<Decimal> {
    if precision > decimals {
        return Err(PolygonscanError::InvalidAmount(format!(
            "precision {} exceeds token decimals {}",
            precision, decimals
        )));
    }

    let amount: U256 = raw
        .trim()
        .parse()
        .map_err(|e| PolygonscanError::InvalidAmount(format!("'{}': {}", raw, e)))?;

    let unit = U256::from(10u64).pow(U256::from(decimals));
    let step = U256::from(10u64).pow(U256::from(decimals - precision));
    let precision_unit = U256::from(10u64).pow(U256::from(precision));

    let mut whole = amount / unit;
    let mut frac = (amount % unit + step / U256::from(2u64)) / step;
    if frac >= precision_unit {
        whole += U256::from(1u64);
        frac -= precision_unit;
    }

    let overflow = || PolygonscanError::InvalidAmount(format!("'{}' is out of range", raw));
    let mantissa = whole
        .checked_mul(precision_unit)
        .and_then(|m| m.checked_add(frac))
        .ok_or_else(overflow)?;
    let mantissa = i128::try_from(mantissa).map_err(|_| overflow())?;

    Decimal::try_from_i128_with_scale(mantissa, precision)
        .map(|d| d.normalize())
        .map_err(|_| overflow())
}
