//! ERC-20 token metadata resolution.
//!
//! Token metadata is resolved through three tiers, cheapest first:
//!
//! 1. [`StaticTokenList`]: curated lists compiled into the binary.
//! 2. Remote token lists, downloaded once per process and cached.
//! 3. Direct `name()`/`symbol()`/`decimals()` calls against the token.
//!
//! The two list-backed tiers share the [`TokenList`] document shape, which
//! follows the Uniswap token-list format.

mod static_list;

pub use static_list::StaticTokenList;

use std::time::Duration;

use alloy_primitives::Address;
use serde::{Deserialize, Deserializer, Serialize};

use crate::chain::ChainId;
use crate::error::ChainError;
use crate::fallback::ProviderChain;
use crate::types::{CenterData, TokenMetadataRecord};

/// A token-list document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenList {
    /// List name.
    #[serde(default)]
    pub name: String,
    /// Listed tokens. Entries that do not fit [`TokenInfo`] are dropped.
    #[serde(deserialize_with = "skip_malformed")]
    pub tokens: Vec<TokenInfo>,
}

fn skip_malformed<'de, D>(deserializer: D) -> Result<Vec<TokenInfo>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

/// One token-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    /// Chain the entry belongs to.
    #[serde(default)]
    pub chain_id: Option<ChainId>,
    /// Token address, in whatever case the list uses.
    pub address: String,
    /// Token name.
    pub name: String,
    /// Token ticker.
    pub symbol: String,
    /// Decimal places.
    pub decimals: u8,
    /// Logo URL.
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    /// Free-form extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<TokenExtensions>,
}

/// The subset of token-list extensions that is surfaced to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenExtensions {
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Project website.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl TokenList {
    /// Finds a token by address, ignoring case.
    ///
    /// Entries tagged with a different chain are skipped.
    #[must_use]
    pub fn find(&self, chain_id: ChainId, address: Address) -> Option<&TokenInfo> {
        self.tokens.iter().find(|token| {
            token.chain_id.is_none_or(|id| id == chain_id)
                && token
                    .address
                    .trim()
                    .parse::<Address>()
                    .is_ok_and(|listed| listed == address)
        })
    }
}

impl TokenInfo {
    /// Converts the entry into a metadata record for `address`.
    #[must_use]
    pub fn to_record(&self, address: Address) -> TokenMetadataRecord {
        let extensions = self.extensions.clone().unwrap_or_default();
        TokenMetadataRecord {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            address,
            decimals: self.decimals,
            center_data: CenterData {
                logo_uri: self.logo_uri.clone(),
                website: extensions.website,
                description: extensions.description,
            },
        }
    }
}

/// Provider chain type used for token metadata.
pub type TokenMetadataChain = ProviderChain<Address, TokenMetadataRecord>;

/// Resolves token metadata through an ordered chain of tiers.
#[derive(Debug, Clone)]
pub struct TokenMetadataResolver {
    chain: TokenMetadataChain,
}

impl TokenMetadataResolver {
    /// Creates a resolver over an ordered provider chain.
    #[must_use]
    pub const fn new(chain: TokenMetadataChain) -> Self {
        Self { chain }
    }

    /// Replaces the per-provider deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.chain = self.chain.with_timeout(timeout);
        self
    }

    /// Returns the configured tier names in order.
    #[must_use]
    pub fn providers(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    /// Resolves metadata for the token at `address` on `chain_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Exhausted`] if every tier failed and
    /// [`ChainError::NotFound`] if a tier confirmed the token does not exist.
    pub async fn resolve(
        &self,
        chain_id: ChainId,
        address: Address,
    ) -> Result<TokenMetadataRecord, ChainError> {
        self.chain
            .execute(chain_id, &address)
            .await?
            .ok_or(ChainError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy_primitives::address;
    use serde_json::json;

    use super::*;
    use crate::error::ProviderError;
    use crate::fallback::testing::Scripted;

    const USDC: Address = address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174");

    fn record(name: &str) -> TokenMetadataRecord {
        TokenMetadataRecord {
            name: name.into(),
            symbol: "USDC".into(),
            address: USDC,
            decimals: 6,
            center_data: CenterData::default(),
        }
    }

    #[test]
    fn test_find_is_case_insensitive_and_chain_scoped() {
        let list: TokenList = serde_json::from_value(json!({
            "name": "test",
            "tokens": [
                {"chainId": 1, "address": "0x2791bca1f2de4661ed88a30c99a7a9449aa84174", "name": "Wrong", "symbol": "W", "decimals": 18},
                {"chainId": 137, "address": "0x2791BCA1F2DE4661ED88A30C99A7A9449AA84174", "name": "USD Coin", "symbol": "USDC", "decimals": 6,
                 "logoURI": "https://example.org/usdc.png", "extensions": {"description": "Stablecoin"}}
            ]
        }))
        .unwrap();

        let info = list.find(137, USDC).unwrap();
        assert_eq!(info.name, "USD Coin");
        let record = info.to_record(USDC);
        assert_eq!(record.center_data.description.as_deref(), Some("Stablecoin"));
        assert_eq!(record.center_data.logo_uri.as_deref(), Some("https://example.org/usdc.png"));
        assert!(list.find(80001, USDC).is_none());
    }

    #[test]
    fn test_find_skips_malformed_addresses() {
        let list: TokenList = serde_json::from_value(json!({
            "tokens": [
                {"address": "not-an-address", "name": "Junk", "symbol": "J", "decimals": 0},
                {"address": "0x2791bca1f2de4661ed88a30c99a7a9449aa84174", "name": "USD Coin", "symbol": "USDC", "decimals": 6}
            ]
        }))
        .unwrap();
        assert_eq!(list.find(137, USDC).unwrap().symbol, "USDC");
    }

    #[test]
    fn test_malformed_entries_are_dropped() {
        let list: TokenList = serde_json::from_value(json!({
            "tokens": [
                {"address": "0x0000000000000000000000000000000000000001", "name": "No symbol", "decimals": 18},
                {"address": "0x0000000000000000000000000000000000000002", "name": "Huge", "symbol": "H", "decimals": 300},
                {"address": "0x2791bca1f2de4661ed88a30c99a7a9449aa84174", "name": "USD Coin", "symbol": "USDC", "decimals": 6}
            ]
        }))
        .unwrap();
        assert_eq!(list.tokens.len(), 1);
        assert_eq!(list.find(137, USDC).unwrap().decimals, 6);
    }

    #[tokio::test]
    async fn test_tiers_run_in_order() {
        let static_tier = Scripted::<TokenMetadataRecord>::new(
            "static",
            Err(ProviderError::NotListed {
                provider: "static",
                address: USDC,
            }),
        );
        let remote = Scripted::new("remote", Ok(Some(record("from remote"))));
        let rpc = Scripted::new("rpc", Ok(Some(record("from rpc"))));
        let resolver = TokenMetadataResolver::new(
            TokenMetadataChain::new()
                .with(static_tier.clone())
                .with(remote.clone())
                .with(rpc.clone()),
        );

        let resolved = resolver.resolve(137, USDC).await.unwrap();
        assert_eq!(resolved.name, "from remote");
        assert_eq!(static_tier.calls(), 1);
        assert_eq!(rpc.calls(), 0);
        assert_eq!(resolver.providers(), vec!["static", "remote", "rpc"]);
    }

    #[tokio::test]
    async fn test_exhaustion_surfaces_last_error() {
        let rpc = Scripted::<TokenMetadataRecord>::new(
            "rpc",
            Err(ProviderError::UnsupportedChain {
                provider: "rpc",
                chain_id: 56,
            }),
        );
        let resolver = TokenMetadataResolver::new(TokenMetadataChain::new().with(rpc));

        let err = resolver.resolve(56, USDC).await.unwrap_err();
        assert!(matches!(
            err,
            ChainError::Exhausted {
                last: ProviderError::UnsupportedChain { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_confirmed_absence_is_not_found() {
        let tier: Arc<Scripted<TokenMetadataRecord>> = Scripted::new("rpc", Ok(None));
        let resolver = TokenMetadataResolver::new(TokenMetadataChain::new().with(tier));
        assert_eq!(resolver.resolve(137, USDC).await.unwrap_err(), ChainError::NotFound);
    }
}
