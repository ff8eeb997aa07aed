use std::sync::Arc;

use alloy_primitives::Address;
use chainmeta::networks::COVALENT_CHAINS;
use chainmeta::secrets::SecretStore;
use chainmeta::types::{TokenBalanceEntry, is_zero_balance};
use chainmeta::{BoxFuture, ChainId, Provider, ProviderError, ProviderResult};
use serde::Deserialize;
use url::Url;

use super::{COVALENT_API_KEY, wallet_param};
use crate::client::JsonClient;

const NAME: &str = "covalent";

/// Default Covalent API root.
pub const COVALENT_BASE_URL: &str = "https://api.covalenthq.com/";

#[derive(Debug, Deserialize)]
struct CovalentEnvelope {
    #[serde(default)]
    data: Option<CovalentData>,
    #[serde(default)]
    error: bool,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CovalentData {
    #[serde(default)]
    items: Vec<CovalentItem>,
}

#[derive(Debug, Deserialize)]
struct CovalentItem {
    #[serde(default)]
    contract_address: Option<String>,
    #[serde(default)]
    balance: Option<String>,
    #[serde(default)]
    native_token: bool,
}

/// Covalent `balances_v2` indexer endpoint.
#[derive(Clone)]
pub struct CovalentBalances {
    client: JsonClient,
    secrets: Arc<dyn SecretStore>,
    base_url: Url,
}

impl std::fmt::Debug for CovalentBalances {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CovalentBalances")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl CovalentBalances {
    /// Creates the provider against `base_url` (normally [`COVALENT_BASE_URL`]).
    #[must_use]
    pub fn new(client: JsonClient, secrets: Arc<dyn SecretStore>, base_url: Url) -> Self {
        Self {
            client,
            secrets,
            base_url,
        }
    }

    async fn fetch(&self, chain_id: ChainId, wallet: Address) -> ProviderResult<Vec<TokenBalanceEntry>> {
        let chain = COVALENT_CHAINS.key(chain_id)?;
        let api_key = self.secrets.require(NAME, COVALENT_API_KEY)?;
        let url = self
            .base_url
            .join(&format!("v1/{chain}/address/{}/balances_v2/", wallet_param(wallet)))
            .map_err(|e| ProviderError::unavailable(NAME, e))?;

        let envelope: CovalentEnvelope = self
            .client
            .get_json(url, "GET balances_v2", &[("key", &api_key)], &[])
            .await
            .map_err(|e| e.into_provider_error(NAME))?;

        if envelope.error {
            return Err(ProviderError::Rejected {
                provider: NAME,
                message: envelope.error_message.unwrap_or_default(),
            });
        }
        let data = envelope
            .data
            .ok_or_else(|| ProviderError::malformed(NAME, "response without data"))?;

        let entries = data
            .items
            .into_iter()
            .filter(|item| !item.native_token)
            .filter_map(|item| {
                let address = item.contract_address?;
                let balance = item.balance?;
                (!is_zero_balance(&balance)).then(|| TokenBalanceEntry::new(address, balance))
            })
            .collect();
        Ok(Some(entries))
    }
}

impl Provider<Address, Vec<TokenBalanceEntry>> for CovalentBalances {
    fn name(&self) -> &'static str {
        NAME
    }

    fn resolve<'a>(
        &'a self,
        chain_id: ChainId,
        wallet: &'a Address,
    ) -> BoxFuture<'a, ProviderResult<Vec<TokenBalanceEntry>>> {
        Box::pin(self.fetch(chain_id, *wallet))
    }
}
