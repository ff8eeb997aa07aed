use std::sync::Arc;

use alloy_primitives::Address;
use chainmeta::networks::MORALIS_CHAINS;
use chainmeta::secrets::SecretStore;
use chainmeta::types::{TokenBalanceEntry, is_zero_balance};
use chainmeta::{BoxFuture, ChainId, Provider, ProviderError, ProviderResult};
use serde::Deserialize;
use url::Url;

use super::{MORALIS_API_KEY, wallet_param};
use crate::client::JsonClient;

const NAME: &str = "moralis";

/// Default Moralis Web3 Data API root.
pub const MORALIS_BASE_URL: &str = "https://deep-index.moralis.io/api/v2.2/";

#[derive(Debug, Deserialize)]
struct MoralisToken {
    token_address: String,
    #[serde(default)]
    balance: String,
    #[serde(default)]
    possible_spam: bool,
}

/// Moralis `/{wallet}/erc20` endpoint.
#[derive(Clone)]
pub struct MoralisBalances {
    client: JsonClient,
    secrets: Arc<dyn SecretStore>,
    base_url: Url,
}

impl std::fmt::Debug for MoralisBalances {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoralisBalances")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl MoralisBalances {
    /// Creates the provider against `base_url` (normally [`MORALIS_BASE_URL`]).
    #[must_use]
    pub fn new(client: JsonClient, secrets: Arc<dyn SecretStore>, base_url: Url) -> Self {
        Self {
            client,
            secrets,
            base_url,
        }
    }

    async fn fetch(&self, chain_id: ChainId, wallet: Address) -> ProviderResult<Vec<TokenBalanceEntry>> {
        let chain = MORALIS_CHAINS.key(chain_id)?;
        let api_key = self.secrets.require(NAME, MORALIS_API_KEY)?;
        let url = self
            .base_url
            .join(&format!("{}/erc20", wallet_param(wallet)))
            .map_err(|e| ProviderError::unavailable(NAME, e))?;

        let tokens: Vec<MoralisToken> = self
            .client
            .get_json(url, "GET erc20", &[("chain", chain)], &[("X-API-Key", &api_key)])
            .await
            .map_err(|e| e.into_provider_error(NAME))?;

        let entries = tokens
            .into_iter()
            .filter(|token| !token.possible_spam && !is_zero_balance(&token.balance))
            .map(|token| TokenBalanceEntry::new(token.token_address, token.balance))
            .collect();
        Ok(Some(entries))
    }
}

impl Provider<Address, Vec<TokenBalanceEntry>> for MoralisBalances {
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
