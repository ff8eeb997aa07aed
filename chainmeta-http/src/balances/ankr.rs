use std::sync::Arc;

use alloy_primitives::Address;
use chainmeta::networks::ANKR_CHAINS;
use chainmeta::secrets::SecretStore;
use chainmeta::types::{TokenBalanceEntry, is_zero_balance};
use chainmeta::{BoxFuture, ChainId, Provider, ProviderResult};
use serde::{Deserialize, Serialize};

use super::{ANKR_API_URL, wallet_param};
use crate::client::{JsonClient, JsonRpcRequest, JsonRpcResponse, parse_url};

const NAME: &str = "ankr";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountBalanceParams<'a> {
    blockchain: &'a str,
    wallet_address: String,
    only_whitelisted: bool,
}

#[derive(Debug, Deserialize)]
struct AccountBalance {
    #[serde(default)]
    assets: Vec<AnkrAsset>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnkrAsset {
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    contract_address: String,
    #[serde(default)]
    balance_raw_integer: String,
}

/// `ankr_getAccountBalance` over the Ankr Advanced API.
///
/// The endpoint URL, which embeds the API key, is read from the
/// [`ANKR_API_URL`] credential on every call.
#[derive(Clone)]
pub struct AnkrBalances {
    client: JsonClient,
    secrets: Arc<dyn SecretStore>,
}

impl std::fmt::Debug for AnkrBalances {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnkrBalances").finish_non_exhaustive()
    }
}

impl AnkrBalances {
    /// Creates the provider.
    #[must_use]
    pub fn new(client: JsonClient, secrets: Arc<dyn SecretStore>) -> Self {
        Self { client, secrets }
    }

    async fn fetch(&self, chain_id: ChainId, wallet: Address) -> ProviderResult<Vec<TokenBalanceEntry>> {
        let blockchain = ANKR_CHAINS.key(chain_id)?;
        let url = self.secrets.require(NAME, ANKR_API_URL)?;
        let url = parse_url(&url, "ANKR_API_URL").map_err(|e| e.into_provider_error(NAME))?;

        let request = JsonRpcRequest::new(
            "ankr_getAccountBalance",
            AccountBalanceParams {
                blockchain,
                wallet_address: wallet_param(wallet),
                only_whitelisted: false,
            },
        );
        let response: JsonRpcResponse<AccountBalance> = self
            .client
            .post_json(url, "POST ankr_getAccountBalance", &request, &[])
            .await
            .map_err(|e| e.into_provider_error(NAME))?;

        let entries = response
            .into_result(NAME)?
            .assets
            .into_iter()
            .filter(|asset| asset.token_type != "NATIVE" && !is_zero_balance(&asset.balance_raw_integer))
            .map(|asset| TokenBalanceEntry::new(asset.contract_address, asset.balance_raw_integer))
            .collect();
        Ok(Some(entries))
    }
}

impl Provider<Address, Vec<TokenBalanceEntry>> for AnkrBalances {
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
