#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! On-chain fallback providers for chainmeta.
//!
//! When no indexer or token list knows an address, the chain itself is the
//! source of truth. This crate issues read-only `eth_call`s through alloy and
//! exposes two providers built on them:
//!
//! - [`OnChainTokenMetadata`] reads `name()`, `symbol()` and `decimals()`
//! - [`OnChainBalances`] reads `balanceOf(wallet)` over a configured token set
//!
//! Both go through the [`EthCall`] seam, so tests can script return data
//! without a node.

pub mod balance;
pub mod call;
pub mod contract;
pub mod token;

pub use balance::OnChainBalances;
pub use call::{EthCall, RpcEthCall};
pub use token::{OnChainTokenMetadata, fetch_token_metadata};
