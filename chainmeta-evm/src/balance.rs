//! `balanceOf` over a fixed token set.
//!
//! Chains that no indexer covers, such as the Lumi layer-3 rollup, can still
//! report balances for a known set of tokens by asking each token contract
//! directly. This provider is meant to sit at the end of the balance chain.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, address};
use alloy_sol_types::SolCall;
use chainmeta::chain::LUMI_LAYER3;
use chainmeta::types::TokenBalanceEntry;
use chainmeta::{BoxFuture, ChainId, Provider, ProviderError, ProviderResult};
use futures_util::future::try_join_all;

use crate::call::{EthCall, decode_uint};
use crate::contract::IERC20Metadata;

/// Tokens tracked on the Lumi layer-3 rollup.
pub const LUMI_LAYER3_TOKENS: &[Address] = &[
    address!("0x1DD6b5F9281c6B4f043c02A83a46c2772024636c"), // LUAUSD
    address!("0x15B6eC24f59Fea164C6e235941Aa00fB0d4A32f6"), // LUAOP
    address!("0xc3aBC47863524ced8DAf3ef98d74dd881E131C38"), // LUA
    address!("0xCb55d61E6299597C39FEeC3D4036E727aFBe11bE"), // LUAG
    address!("0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9"), // USDT
    address!("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"), // USDC
    address!("0xFF970A61A04b1cA14834A43f5dE4533eBDDB5CC8"), // USDC.e
    address!("0x7f90122BF0700F9E7e1F688fe926940E8839F353"), // 2CRV
];

/// Balance provider that calls `balanceOf` on every configured token.
#[derive(Clone)]
pub struct OnChainBalances {
    caller: Arc<dyn EthCall>,
    tokens: HashMap<ChainId, Vec<Address>>,
}

impl std::fmt::Debug for OnChainBalances {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnChainBalances")
            .field("caller", &self.caller.name())
            .field("tokens", &self.tokens)
            .finish()
    }
}

impl OnChainBalances {
    /// Creates a provider for an explicit chain → tokens map.
    #[must_use]
    pub fn new(caller: Arc<dyn EthCall>, tokens: HashMap<ChainId, Vec<Address>>) -> Self {
        Self { caller, tokens }
    }

    /// Creates a provider tracking [`LUMI_LAYER3_TOKENS`].
    #[must_use]
    pub fn lumi_layer3(caller: Arc<dyn EthCall>) -> Self {
        Self::new(
            caller,
            HashMap::from([(LUMI_LAYER3, LUMI_LAYER3_TOKENS.to_vec())]),
        )
    }

    async fn balance_of(&self, chain_id: ChainId, token: Address, wallet: Address) -> Result<Option<TokenBalanceEntry>, ProviderError> {
        let calldata = Bytes::from(IERC20Metadata::balanceOfCall { account: wallet }.abi_encode());
        let raw = self.caller.call(chain_id, token, calldata).await?;
        let balance = decode_uint(&raw).ok_or_else(|| {
            ProviderError::malformed(self.caller.name(), format!("balanceOf({wallet}) on {token} returned {raw}"))
        })?;
        Ok((!balance.is_zero()).then(|| TokenBalanceEntry::new(format!("{token:#x}"), balance.to_string())))
    }
}

impl Provider<Address, Vec<TokenBalanceEntry>> for OnChainBalances {
    fn name(&self) -> &'static str {
        "onchain"
    }

    fn resolve<'a>(
        &'a self,
        chain_id: ChainId,
        wallet: &'a Address,
    ) -> BoxFuture<'a, ProviderResult<Vec<TokenBalanceEntry>>> {
        Box::pin(async move {
            let tokens = self
                .tokens
                .get(&chain_id)
                .ok_or(ProviderError::UnsupportedChain {
                    provider: "onchain",
                    chain_id,
                })?;
            let balances = try_join_all(
                tokens
                    .iter()
                    .map(|token| self.balance_of(chain_id, *token, *wallet)),
            )
            .await?;
            Ok(Some(balances.into_iter().flatten().collect()))
        })
    }
}
