//! HTTP-backed providers for chainmeta.
//!
//! Every type here implements one of the provider seams from the `chainmeta`
//! crate and talks to a third-party JSON API through a shared [`JsonClient`].
//!
//! # Modules
//!
//! - [`client`] - JSON-over-HTTP plumbing and JSON-RPC envelopes
//! - [`explorer`] - Etherscan-family `getsourcecode` contract source
//! - [`balances`] - Ankr, Alchemy, Covalent and Moralis balance indexers
//! - [`tokenlist`] - Remote token lists with a process-wide cache

pub mod balances;
pub mod client;
pub mod explorer;
pub mod tokenlist;

pub use client::{HttpError, JsonClient};
pub use explorer::ExplorerSource;
pub use tokenlist::RemoteTokenLists;
