use std::sync::Arc;

use alloy_primitives::Address;
use chainmeta::networks::ALCHEMY_CHAINS;
use chainmeta::secrets::SecretStore;
use chainmeta::types::{TokenBalanceEntry, is_zero_balance};
use chainmeta::{BoxFuture, ChainId, Provider, ProviderResult};
use serde::Deserialize;
use url::Url;

use super::{ALCHEMY_API_KEY, wallet_param};
use crate::client::{HttpError, JsonClient, JsonRpcRequest, JsonRpcResponse, parse_url};

const NAME: &str = "alchemy";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBalances {
    #[serde(default)]
    token_balances: Vec<AlchemyTokenBalance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlchemyTokenBalance {
    contract_address: String,
    #[serde(default)]
    token_balance: Option<String>,
}

/// `alchemy_getTokenBalances` over Alchemy's per-network JSON-RPC endpoints.
///
/// Balances are `0x`-padded hex and are passed through unchanged.
#[derive(Clone)]
pub struct AlchemyBalances {
    client: JsonClient,
    secrets: Arc<dyn SecretStore>,
    base_url: Option<Url>,
}

impl std::fmt::Debug for AlchemyBalances {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlchemyBalances")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AlchemyBalances {
    /// Creates the provider targeting `https://{network}.g.alchemy.com/v2/{key}`.
    #[must_use]
    pub fn new(client: JsonClient, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            client,
            secrets,
            base_url: None,
        }
    }

    /// Sends requests to `{base_url}/v2/{key}` regardless of network.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    fn endpoint(&self, network: &str, api_key: &str) -> Result<Url, HttpError> {
        match &self.base_url {
            Some(base) => base
                .join(&format!("v2/{api_key}"))
                .map_err(|source| HttpError::UrlParse {
                    context: "Failed to construct Alchemy URL",
                    source,
                }),
            None => parse_url(
                &format!("https://{network}.g.alchemy.com/v2/{api_key}"),
                "Failed to construct Alchemy URL",
            ),
        }
    }

    async fn fetch(&self, chain_id: ChainId, wallet: Address) -> ProviderResult<Vec<TokenBalanceEntry>> {
        let network = ALCHEMY_CHAINS.key(chain_id)?;
        let api_key = self.secrets.require(NAME, ALCHEMY_API_KEY)?;
        let url = self
            .endpoint(network, &api_key)
            .map_err(|e| e.into_provider_error(NAME))?;

        let request = JsonRpcRequest::new("alchemy_getTokenBalances", (wallet_param(wallet), "erc20"));
        let response: JsonRpcResponse<TokenBalances> = self
            .client
            .post_json(url, "POST alchemy_getTokenBalances", &request, &[])
            .await
            .map_err(|e| e.into_provider_error(NAME))?;

        let entries = response
            .into_result(NAME)?
            .token_balances
            .into_iter()
            .filter_map(|token| {
                let balance = token.token_balance?;
                (!is_zero_balance(&balance)).then(|| TokenBalanceEntry::new(token.contract_address, balance))
            })
            .collect();
        Ok(Some(entries))
    }
}

impl Provider<Address, Vec<TokenBalanceEntry>> for AlchemyBalances {
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
