#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for resolving on-chain metadata through provider fallback.
//!
//! Third-party blockchain data APIs are individually unreliable: they go
//! down, rate-limit, or simply do not cover a chain. This crate models every
//! lookup as an ordered chain of interchangeable [`Provider`]s and runs them
//! until one of them gives a definitive answer.
//!
//! The crate performs no network I/O itself. Concrete providers live in
//! `chainmeta-http` (indexer and explorer APIs) and `chainmeta-evm`
//! (`eth_call` against a JSON-RPC node).
//!
//! # Modules
//!
//! - [`chain`] - Chain identifiers
//! - [`networks`] - Per-provider chain-key tables
//! - [`fallback`] - The ordered provider chain executor
//! - [`contract`] - Contract ABI resolution with proxy following
//! - [`balance`] - Wallet ERC-20 balance aggregation
//! - [`token`] - Token metadata tiers and token-list documents
//! - [`secrets`] - Credential lookup for providers
//! - [`types`] - Canonical records returned to clients
//! - [`error`] - Provider and chain errors
//!
//! [`Provider`]: fallback::Provider

pub mod balance;
pub mod chain;
pub mod contract;
pub mod error;
pub mod fallback;
pub mod networks;
pub mod secrets;
pub mod token;
pub mod types;

pub use chain::ChainId;
pub use error::{ChainError, ProviderError};
pub use fallback::{BoxFuture, Provider, ProviderChain, ProviderResult};
