//! Token lists compiled into the binary.

use std::collections::HashMap;

use alloy_primitives::Address;

use super::TokenList;
use crate::chain::{ChainId, POLYGON_MAINNET, POLYGON_MUMBAI};
use crate::error::ProviderError;
use crate::fallback::{BoxFuture, Provider, ProviderResult};
use crate::types::TokenMetadataRecord;

const NAME: &str = "static-list";

const POLYGON_LIST: &str = include_str!("../../tokenlists/polygon.json");
const MUMBAI_LIST: &str = include_str!("../../tokenlists/mumbai.json");

/// The first, in-process token metadata tier.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenList {
    lists: HashMap<ChainId, TokenList>,
}

impl StaticTokenList {
    /// Loads the bundled Polygon and Mumbai lists.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if a bundled list is malformed.
    pub fn bundled() -> Result<Self, serde_json::Error> {
        let mut lists = HashMap::new();
        lists.insert(POLYGON_MAINNET, serde_json::from_str(POLYGON_LIST)?);
        lists.insert(POLYGON_MUMBAI, serde_json::from_str(MUMBAI_LIST)?);
        Ok(Self { lists })
    }

    /// Builds a tier from explicit lists.
    #[must_use]
    pub const fn from_lists(lists: HashMap<ChainId, TokenList>) -> Self {
        Self { lists }
    }

    fn lookup(&self, chain_id: ChainId, address: Address) -> Result<TokenMetadataRecord, ProviderError> {
        let list = self
            .lists
            .get(&chain_id)
            .ok_or(ProviderError::UnsupportedChain {
                provider: NAME,
                chain_id,
            })?;
        list.find(chain_id, address)
            .map(|info| info.to_record(address))
            .ok_or(ProviderError::NotListed {
                provider: NAME,
                address,
            })
    }
}

impl Provider<Address, TokenMetadataRecord> for StaticTokenList {
    fn name(&self) -> &'static str {
        NAME
    }

    fn resolve<'a>(
        &'a self,
        chain_id: ChainId,
        address: &'a Address,
    ) -> BoxFuture<'a, ProviderResult<TokenMetadataRecord>> {
        let outcome = self.lookup(chain_id, *address).map(Some);
        Box::pin(async move { outcome })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;
    use crate::chain::ARBITRUM_ONE;

    #[tokio::test]
    async fn test_bundled_polygon_usdc() {
        let tier = StaticTokenList::bundled().unwrap();
        let record = tier
            .resolve(POLYGON_MAINNET, &address!("0x2791bca1f2de4661ed88a30c99a7a9449aa84174"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.symbol, "USDC");
        assert_eq!(record.decimals, 6);
        assert!(record.center_data.logo_uri.is_some());
    }

    #[tokio::test]
    async fn test_bundled_mumbai_wmatic() {
        let tier = StaticTokenList::bundled().unwrap();
        let record = tier
            .resolve(POLYGON_MUMBAI, &address!("0x9c3C9283D3e44854697Cd22D3Faa240Cfb032889"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.symbol, "WMATIC");
    }

    #[tokio::test]
    async fn test_unlisted_token() {
        let tier = StaticTokenList::bundled().unwrap();
        let unknown = address!("0x00000000000000000000000000000000000000bb");
        let err = tier.resolve(POLYGON_MAINNET, &unknown).await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::NotListed {
                provider: "static-list",
                address: unknown,
            }
        );
    }

    #[tokio::test]
    async fn test_unsupported_chain() {
        let tier = StaticTokenList::bundled().unwrap();
        let err = tier
            .resolve(ARBITRUM_ONE, &address!("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"))
            .await
            .unwrap_err();
        assert!(err.is_unsupported_chain());
    }
}
