//! Assembly of the provider chains behind every route.

use std::sync::Arc;

use alloy_primitives::Address;
use chainmeta::Provider;
use chainmeta::balance::{BalanceAggregator, BalanceChain};
use chainmeta::contract::{
    AbiFilter, ContractResolver, ContractSource, ProxyNaming, RegistryError,
    StaticContractRegistry,
};
use chainmeta::secrets::{ConfigSecrets, SecretStore};
use chainmeta::token::{StaticTokenList, TokenMetadataChain, TokenMetadataResolver};
use chainmeta::types::TokenBalanceEntry;
use chainmeta_evm::{EthCall, OnChainBalances, OnChainTokenMetadata, RpcEthCall};
use chainmeta_http::balances::{
    AlchemyBalances, AnkrBalances, COVALENT_BASE_URL, CovalentBalances, MORALIS_BASE_URL,
    MoralisBalances,
};
use chainmeta_http::client::parse_url;
use chainmeta_http::{ExplorerSource, HttpError, JsonClient, RemoteTokenLists};

use crate::config::{BalanceProviderKind, ConfigError, ServerConfig};

/// Shared application state.
pub type SharedState = Arc<AppState>;

/// Errors raised while building [`AppState`] from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Configuration values could not be interpreted.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The contract registry directory could not be loaded.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The bundled token lists are corrupt.
    #[error("bundled token list: {0}")]
    TokenList(#[from] serde_json::Error),
    /// A built-in provider URL is invalid.
    #[error(transparent)]
    Url(#[from] HttpError),
}

/// The resolvers served by the HTTP API.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Contract resolver returning state-changing functions only.
    pub abi: ContractResolver,
    /// Contract resolver returning the full ABI.
    pub abi_full: ContractResolver,
    /// Wallet balance aggregator.
    pub balances: BalanceAggregator,
    /// Token metadata tiers.
    pub tokens: TokenMetadataResolver,
}

impl AppState {
    /// Builds every provider chain described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if part of the configuration is unusable.
    pub fn from_config(config: &ServerConfig) -> Result<Self, StateError> {
        let timeout = config.provider_timeout();
        let secrets: Arc<dyn SecretStore> = Arc::new(ConfigSecrets::new(config.secrets.clone()));
        let client = timeout.map_or_else(JsonClient::new, |t| JsonClient::new().with_timeout(t));
        let rpc: Arc<dyn EthCall> = Arc::new(RpcEthCall::from_urls(config.rpc_urls()?));

        let mut sources: Vec<Arc<dyn ContractSource>> = Vec::new();
        if let Some(dir) = &config.contracts.registry_dir {
            sources.push(Arc::new(StaticContractRegistry::load_dir(dir)?));
        }
        let mut explorer = ExplorerSource::new(client.clone(), Arc::clone(&secrets));
        if let Some(url) = &config.contracts.explorer_api_url {
            explorer = explorer.with_api_url(url.clone());
        }
        sources.push(Arc::new(explorer));

        let abi = ContractResolver::from_sources(sources.clone(), AbiFilter::WriteOnly, ProxyNaming::Proxy)
            .with_timeout(timeout);
        let abi_full = ContractResolver::from_sources(sources, AbiFilter::Full, ProxyNaming::Proxy)
            .with_timeout(timeout);

        let mut balance_chain = BalanceChain::new();
        for kind in &config.balances.providers {
            balance_chain.push(balance_provider(*kind, config, &client, &secrets, &rpc)?);
        }
        let balances = BalanceAggregator::new(balance_chain).with_timeout(timeout);

        let token_lists = config.token_lists()?;
        let remote = if token_lists.is_empty() {
            RemoteTokenLists::with_defaults(client)?
        } else {
            RemoteTokenLists::new(client, token_lists)
        };
        let token_chain = TokenMetadataChain::new()
            .with(Arc::new(StaticTokenList::bundled()?))
            .with(Arc::new(remote))
            .with(Arc::new(OnChainTokenMetadata::new(rpc)));
        let tokens = TokenMetadataResolver::new(token_chain).with_timeout(timeout);

        let state = Self {
            abi,
            abi_full,
            balances,
            tokens,
        };
        tracing::info!(
            contracts = ?state.abi.chain().names(),
            balances = ?state.balances.providers(),
            tokens = ?state.tokens.providers(),
            "Provider chains ready"
        );
        Ok(state)
    }
}

fn balance_provider(
    kind: BalanceProviderKind,
    config: &ServerConfig,
    client: &JsonClient,
    secrets: &Arc<dyn SecretStore>,
    rpc: &Arc<dyn EthCall>,
) -> Result<Arc<dyn Provider<Address, Vec<TokenBalanceEntry>>>, StateError> {
    let provider: Arc<dyn Provider<Address, Vec<TokenBalanceEntry>>> = match kind {
        BalanceProviderKind::Ankr => Arc::new(AnkrBalances::new(client.clone(), Arc::clone(secrets))),
        BalanceProviderKind::Alchemy => {
            Arc::new(AlchemyBalances::new(client.clone(), Arc::clone(secrets)))
        }
        BalanceProviderKind::Covalent => Arc::new(CovalentBalances::new(
            client.clone(),
            Arc::clone(secrets),
            parse_url(COVALENT_BASE_URL, "Covalent base URL")?,
        )),
        BalanceProviderKind::Moralis => Arc::new(MoralisBalances::new(
            client.clone(),
            Arc::clone(secrets),
            parse_url(MORALIS_BASE_URL, "Moralis base URL")?,
        )),
        BalanceProviderKind::Onchain => {
            let tokens = config.onchain_tokens()?;
            if tokens.is_empty() {
                Arc::new(OnChainBalances::lumi_layer3(Arc::clone(rpc)))
            } else {
                Arc::new(OnChainBalances::new(Arc::clone(rpc), tokens))
            }
        }
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chains() {
        let state = AppState::from_config(&ServerConfig::default()).unwrap();
        assert_eq!(state.abi.chain().names(), vec!["explorer"]);
        assert_eq!(state.balances.providers(), vec!["ankr", "alchemy", "onchain"]);
        assert_eq!(
            state.tokens.providers(),
            vec!["static-list", "remote-list", "onchain"]
        );
    }

    #[test]
    fn test_configured_balance_order() {
        let config = ServerConfig::from_toml(
            "[balances]\nproviders = [\"moralis\", \"covalent\"]",
        )
        .unwrap();
        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.balances.providers(), vec!["moralis", "covalent"]);
    }
}
