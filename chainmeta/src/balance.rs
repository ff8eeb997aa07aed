//! Wallet token balance aggregation.
//!
//! Unlike contract and token metadata, balances never fail at the boundary:
//! when every provider is down the wallet simply appears empty, and the
//! failure goes to the log instead of the caller.

use std::time::Duration;

use alloy_primitives::Address;

use crate::chain::ChainId;
use crate::fallback::ProviderChain;
use crate::types::{TokenBalanceEntry, is_zero_balance};

/// Provider chain type used for balances.
pub type BalanceChain = ProviderChain<Address, Vec<TokenBalanceEntry>>;

/// Resolves the ERC-20 holdings of a wallet.
#[derive(Debug, Clone, Default)]
pub struct BalanceAggregator {
    chain: BalanceChain,
}

impl BalanceAggregator {
    /// Creates an aggregator over an ordered provider chain.
    #[must_use]
    pub const fn new(chain: BalanceChain) -> Self {
        Self { chain }
    }

    /// Replaces the per-provider deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.chain = self.chain.with_timeout(timeout);
        self
    }

    /// Returns the configured provider names in order.
    #[must_use]
    pub fn providers(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    /// Returns the positive token balances of `wallet` on `chain_id`.
    ///
    /// Never fails; an exhausted chain yields an empty list.
    pub async fn balances(&self, chain_id: ChainId, wallet: Address) -> Vec<TokenBalanceEntry> {
        match self.chain.execute(chain_id, &wallet).await {
            Ok(Some(entries)) => retain_positive(entries),
            Ok(None) => Vec::new(),
            Err(error) => {
                tracing::error!(
                    chain_id,
                    %wallet,
                    providers = ?self.chain.names(),
                    %error,
                    "All balance providers failed"
                );
                Vec::new()
            }
        }
    }
}

/// Drops zero balances.
///
/// Providers already filter their own responses; this keeps the aggregate
/// honest regardless of provider quirks.
#[must_use]
pub fn retain_positive(mut entries: Vec<TokenBalanceEntry>) -> Vec<TokenBalanceEntry> {
    entries.retain(|entry| !is_zero_balance(&entry.balance));
    entries
}
