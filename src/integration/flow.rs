//! User-facing configuration flow.
//!
//! # Steps
//! ```text
//! step_user(None)          → Form (empty)
//! step_user(Some(input))
//!     address malformed    → Form { base: invalid_wallet_address }
//!     key probe rejected   → Form { base: invalid_api_key }
//!     otherwise            → CreateEntry { title: nickname, data }
//! step_import(input)       → same as step_user(Some(input))
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::blockchain::PolygonscanClient;
use crate::config::is_valid_wallet_address;
use crate::integration::store::EntryData;

/// Version stamped on entries created by this flow.
pub const FLOW_VERSION: u32 = 2;

pub const STEP_USER: &str = "user";

/// Key under which form-level errors are reported.
pub const ERROR_BASE: &str = "base";

pub const CONF_WALLET_ADDRESS: &str = "wallet_address";
pub const CONF_NICKNAME: &str = "nickname";
pub const CONF_API_KEY: &str = "api_key";

/// Error codes shown on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowError {
    InvalidWalletAddress,
    InvalidApiKey,
}

impl FlowError {
    pub fn code(&self) -> &'static str {
        match self {
            FlowError::InvalidWalletAddress => "invalid_wallet_address",
            FlowError::InvalidApiKey => "invalid_api_key",
        }
    }
}

/// A field of the setup form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub required: bool,
}

/// The setup form's schema: three required string fields.
pub fn user_schema() -> Vec<FormField> {
    [CONF_WALLET_ADDRESS, CONF_NICKNAME, CONF_API_KEY]
        .into_iter()
        .map(|name| FormField {
            name,
            required: true,
        })
        .collect()
}

/// Values submitted on the setup form.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct UserInput {
    pub wallet_address: String,
    pub nickname: String,
    pub api_key: String,
}

impl std::fmt::Debug for UserInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserInput")
            .field("wallet_address", &self.wallet_address)
            .field("nickname", &self.nickname)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Outcome of a flow step.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowResult {
    /// Show (or re-show) the form.
    Form {
        step_id: &'static str,
        fields: Vec<FormField>,
        errors: BTreeMap<&'static str, FlowError>,
    },
    /// Input accepted; the caller persists the entry.
    CreateEntry { title: String, data: EntryData },
}

impl FlowResult {
    fn form(errors: BTreeMap<&'static str, FlowError>) -> Self {
        FlowResult::Form {
            step_id: STEP_USER,
            fields: user_schema(),
            errors,
        }
    }
}

/// Validates user input and produces entries.
#[derive(Debug, Clone)]
pub struct ConfigFlow {
    client: PolygonscanClient,
}

impl ConfigFlow {
    pub fn new(client: PolygonscanClient) -> Self {
        Self { client }
    }

    /// Handle the user step.
    pub async fn step_user(&self, input: Option<UserInput>) -> FlowResult {
        let Some(input) = input else {
            return FlowResult::form(BTreeMap::new());
        };

        let mut errors = BTreeMap::new();
        if !is_valid_wallet_address(&input.wallet_address) {
            errors.insert(ERROR_BASE, FlowError::InvalidWalletAddress);
        } else if !self
            .client
            .validate_api_key(&input.api_key, &input.wallet_address)
            .await
        {
            errors.insert(ERROR_BASE, FlowError::InvalidApiKey);
        }

        if !errors.is_empty() {
            tracing::warn!(
                wallet = %input.wallet_address,
                errors = ?errors,
                "Config flow input rejected"
            );
            return FlowResult::form(errors);
        }

        FlowResult::CreateEntry {
            title: input.nickname.clone(),
            data: EntryData {
                wallet_address: input.wallet_address,
                nickname: input.nickname,
                api_key: input.api_key,
            },
        }
    }

    /// Handle configuration imported from a file instead of the form.
    pub async fn step_import(&self, input: UserInput) -> FlowResult {
        self.step_user(Some(input)).await
    }
}
