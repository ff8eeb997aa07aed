//! Per-provider chain-key tables.
//!
//! Each external provider names networks in its own key space: Ankr calls
//! Polygon `matic-mainnet`, Alchemy calls Arbitrum `arb-mainnet`, Moralis
//! wants the hex chain id. A [`ChainKeyTable`] is the pure mapping from the
//! canonical [`ChainId`] to one provider's key.
//!
//! A lookup miss is a [`ProviderError::UnsupportedChain`], which the
//! [`ProviderChain`](crate::fallback::ProviderChain) treats as an ordinary
//! provider failure and falls through to the next provider.

use crate::chain::{
    ARBITRUM_ONE, BSC_MAINNET, BSC_TESTNET, ChainId, ETHEREUM_MAINNET, POLYGON_MAINNET,
    POLYGON_MUMBAI,
};
use crate::error::ProviderError;

/// A static mapping from canonical chain IDs to one provider's chain keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainKeyTable {
    /// Provider name reported in [`ProviderError::UnsupportedChain`].
    pub provider: &'static str,
    /// `(chain id, provider key)` pairs.
    pub entries: &'static [(ChainId, &'static str)],
}

impl ChainKeyTable {
    /// Creates a table for the named provider.
    #[must_use]
    pub const fn new(provider: &'static str, entries: &'static [(ChainId, &'static str)]) -> Self {
        Self { provider, entries }
    }

    /// Translates a chain ID into the provider's key.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::UnsupportedChain`] if the provider has no key
    /// for `chain_id`.
    pub fn key(&self, chain_id: ChainId) -> Result<&'static str, ProviderError> {
        self.entries
            .iter()
            .find_map(|(id, key)| (*id == chain_id).then_some(*key))
            .ok_or(ProviderError::UnsupportedChain {
                provider: self.provider,
                chain_id,
            })
    }

    /// Returns `true` if the provider has a key for `chain_id`.
    #[must_use]
    pub fn supports(&self, chain_id: ChainId) -> bool {
        self.entries.iter().any(|(id, _)| *id == chain_id)
    }

    /// Returns the chain IDs this table covers, in declaration order.
    pub fn chain_ids(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }
}

/// Ankr Advanced API `blockchain` names.
pub const ANKR_CHAINS: ChainKeyTable = ChainKeyTable::new(
    "ankr",
    &[
        (ETHEREUM_MAINNET, "eth-mainnet"),
        (POLYGON_MAINNET, "matic-mainnet"),
        (POLYGON_MUMBAI, "matic-mumbai"),
        (ARBITRUM_ONE, "arbitrum"),
        (BSC_MAINNET, "bsc-mainnet"),
        (BSC_TESTNET, "bsc-testnet"),
    ],
);

/// Alchemy network subdomains (`https://{key}.g.alchemy.com`).
pub const ALCHEMY_CHAINS: ChainKeyTable =
    ChainKeyTable::new("alchemy", &[(ARBITRUM_ONE, "arb-mainnet")]);

/// Covalent chain names used in the `/v1/{chain}/address/...` path.
pub const COVALENT_CHAINS: ChainKeyTable = ChainKeyTable::new(
    "covalent",
    &[
        (ETHEREUM_MAINNET, "eth-mainnet"),
        (POLYGON_MAINNET, "matic-mainnet"),
        (POLYGON_MUMBAI, "matic-mumbai"),
        (ARBITRUM_ONE, "arbitrum-mainnet"),
        (BSC_MAINNET, "bsc-mainnet"),
        (BSC_TESTNET, "bsc-testnet"),
    ],
);

/// Moralis `chain` query values (hex-encoded chain IDs).
pub const MORALIS_CHAINS: ChainKeyTable = ChainKeyTable::new(
    "moralis",
    &[
        (ETHEREUM_MAINNET, "0x1"),
        (POLYGON_MAINNET, "0x89"),
        (POLYGON_MUMBAI, "0x13881"),
        (ARBITRUM_ONE, "0xa4b1"),
        (BSC_MAINNET, "0x38"),
        (BSC_TESTNET, "0x61"),
    ],
);

/// A block explorer API endpoint together with the credential it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplorerEndpoint {
    /// Base API URL (`.../api`).
    pub api_url: &'static str,
    /// Name of the API key in the credential store.
    pub api_key_name: &'static str,
}

/// Explorer API URLs keyed by chain id.
pub const EXPLORER_CHAINS: ChainKeyTable = ChainKeyTable::new(
    "explorer",
    &[
        (POLYGON_MAINNET, "https://api.polygonscan.com/api"),
        (POLYGON_MUMBAI, "https://api.polygonscan.com/api"),
    ],
);

/// Name of the explorer API key shared by the Polygon explorers.
pub const POLYGONSCAN_API_KEY: &str = "POLYGONSCAN_API_KEY";

/// Resolves the explorer endpoint for a chain.
///
/// # Errors
///
/// Returns [`ProviderError::UnsupportedChain`] if no explorer is known for
/// `chain_id`.
pub fn explorer_endpoint(chain_id: ChainId) -> Result<ExplorerEndpoint, ProviderError> {
    let api_url = EXPLORER_CHAINS.key(chain_id)?;
    Ok(ExplorerEndpoint {
        api_url,
        api_key_name: POLYGONSCAN_API_KEY,
    })
}
