//! Wallet balance providers backed by indexer APIs.
//!
//! Every provider here maps the chain id into its own key space, issues one
//! balance-listing request and normalizes the response into
//! [`TokenBalanceEntry`] values: the native asset and zero balances are
//! dropped, and the balance string is kept in the provider's own encoding.
//!
//! [`TokenBalanceEntry`]: chainmeta::types::TokenBalanceEntry

mod alchemy;
mod ankr;
mod covalent;
mod moralis;

pub use alchemy::AlchemyBalances;
pub use ankr::AnkrBalances;
pub use covalent::{COVALENT_BASE_URL, CovalentBalances};
pub use moralis::{MORALIS_BASE_URL, MoralisBalances};

use alloy_primitives::Address;

/// Credential holding the full Ankr Advanced API URL (including its key).
pub const ANKR_API_URL: &str = "ANKR_API_URL";
/// Credential holding the Alchemy API key.
pub const ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";
/// Credential holding the Covalent API key.
pub const COVALENT_API_KEY: &str = "COVALENT_API_KEY";
/// Credential holding the Moralis API key.
pub const MORALIS_API_KEY: &str = "MORALIS_API_KEY";

/// Formats a wallet the way indexers expect it: lowercase `0x` hex.
fn wallet_param(wallet: Address) -> String {
    format!("{wallet:#x}")
}
