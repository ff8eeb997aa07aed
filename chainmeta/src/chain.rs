//! Chain identifiers.
//!
//! Every resolver works on the canonical EIP-155 numeric chain id. Providers
//! translate it into their own vocabulary through the tables in
//! [`crate::networks`].

/// An EIP-155 chain ID (e.g., 137 for Polygon, 42161 for Arbitrum One).
pub type ChainId = u64;

/// Ethereum Mainnet chain ID.
pub const ETHEREUM_MAINNET: ChainId = 1;

/// BNB Smart Chain chain ID.
pub const BSC_MAINNET: ChainId = 56;

/// BNB Smart Chain testnet chain ID.
pub const BSC_TESTNET: ChainId = 97;

/// Polygon Mainnet chain ID.
pub const POLYGON_MAINNET: ChainId = 137;

/// Polygon Mumbai (testnet) chain ID.
pub const POLYGON_MUMBAI: ChainId = 80001;

/// Arbitrum One chain ID.
pub const ARBITRUM_ONE: ChainId = 42161;

/// Lumi layer-3 rollup chain ID.
///
/// No balance indexer covers this rollup; balances are read on-chain.
pub const LUMI_LAYER3: ChainId = 94168;

/// All chain IDs some provider in this workspace knows how to serve.
pub const KNOWN_CHAINS: &[ChainId] = &[
    ETHEREUM_MAINNET,
    BSC_MAINNET,
    BSC_TESTNET,
    POLYGON_MAINNET,
    POLYGON_MUMBAI,
    ARBITRUM_ONE,
    LUMI_LAYER3,
];

/// Parses a decimal chain ID as it arrives in a query string.
///
/// Surrounding whitespace is ignored. Returns `None` for anything that is not
/// a non-negative decimal integer.
#[must_use]
pub fn parse_chain_id(raw: &str) -> Option<ChainId> {
    raw.trim().parse().ok()
}

/// Formats a chain ID as a `0x`-prefixed lowercase hex string (e.g. `0x89`).
#[must_use]
pub fn hex_chain_id(chain_id: ChainId) -> String {
    format!("{chain_id:#x}")
}
