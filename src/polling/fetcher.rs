//! Balance sources driven by the coordinator.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::blockchain::{PolygonscanClient, UpdateFailed};

/// Something that can produce the current balance once per poll.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn fetch_balance(&self) -> Result<Decimal, UpdateFailed>;
}

/// Fetches one wallet's GEOD balance from Polygonscan.
pub struct BalanceFetcher {
    client: PolygonscanClient,
    wallet_address: String,
    api_key: String,
}

impl BalanceFetcher {
    pub fn new(
        client: PolygonscanClient,
        wallet_address: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            wallet_address: wallet_address.into(),
            api_key: api_key.into(),
        }
    }

    pub fn wallet_address(&self) -> &str {
        &self.wallet_address
    }
}

#[async_trait]
impl BalanceSource for BalanceFetcher {
    async fn fetch_balance(&self) -> Result<Decimal, UpdateFailed> {
        self.client
            .fetch_token_balance(&self.wallet_address, &self.api_key)
            .await
            .map_err(|e| {
                tracing::error!(
                    endpoint = %self.client.api_url(),
                    wallet = %self.wallet_address,
                    error = %e,
                    "Error fetching GEOD balance"
                );
                UpdateFailed::from(e)
            })
    }
}

impl std::fmt::Debug for BalanceFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceFetcher")
            .field("client", &self.client)
            .field("wallet_address", &self.wallet_address)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
