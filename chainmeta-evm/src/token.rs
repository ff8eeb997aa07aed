//! On-chain token metadata: the last tier of the token metadata resolver.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use chainmeta::types::{CenterData, TokenMetadataRecord};
use chainmeta::{BoxFuture, ChainId, Provider, ProviderError, ProviderResult};

use crate::call::{DECIMALS_SELECTOR, EthCall, NAME_SELECTOR, SYMBOL_SELECTOR, decode_string, decode_uint};

/// Decimals assumed when a token's `decimals()` returns nothing usable.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Reads `name()`, `symbol()` and `decimals()` from the token contract.
///
/// The three calls run concurrently; if any of them fails the whole lookup
/// fails and no partial record is produced. Missing or out-of-range
/// `decimals` falls back to [`DEFAULT_DECIMALS`].
///
/// # Errors
///
/// Returns the first [`ProviderError`] raised by a call or while decoding a
/// string result.
pub async fn fetch_token_metadata(
    caller: &dyn EthCall,
    chain_id: ChainId,
    token: Address,
) -> Result<TokenMetadataRecord, ProviderError> {
    let provider = caller.name();
    let (name, symbol, decimals) = tokio::try_join!(
        caller.call(chain_id, token, Bytes::from_static(&NAME_SELECTOR)),
        caller.call(chain_id, token, Bytes::from_static(&SYMBOL_SELECTOR)),
        caller.call(chain_id, token, Bytes::from_static(&DECIMALS_SELECTOR)),
    )?;

    // Only an unreadable result falls back; a reported 0 is kept.
    let decimals = decode_uint(&decimals)
        .and_then(|value| u8::try_from(value).ok())
        .unwrap_or_else(|| {
            tracing::debug!(chain_id, %token, "Token decimals unreadable, assuming {DEFAULT_DECIMALS}");
            DEFAULT_DECIMALS
        });

    Ok(TokenMetadataRecord {
        name: decode_string(provider, &name)?,
        symbol: decode_string(provider, &symbol)?,
        address: token,
        decimals,
        center_data: CenterData::default(),
    })
}

/// Token metadata tier backed by direct contract calls.
#[derive(Clone)]
pub struct OnChainTokenMetadata {
    caller: Arc<dyn EthCall>,
}

impl std::fmt::Debug for OnChainTokenMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnChainTokenMetadata")
            .field("caller", &self.caller.name())
            .finish()
    }
}

impl OnChainTokenMetadata {
    /// Creates the tier on top of an [`EthCall`] implementation.
    #[must_use]
    pub fn new(caller: Arc<dyn EthCall>) -> Self {
        Self { caller }
    }
}

impl Provider<Address, TokenMetadataRecord> for OnChainTokenMetadata {
    fn name(&self) -> &'static str {
        "onchain"
    }

    fn resolve<'a>(
        &'a self,
        chain_id: ChainId,
        token: &'a Address,
    ) -> BoxFuture<'a, ProviderResult<TokenMetadataRecord>> {
        Box::pin(async move {
            fetch_token_metadata(self.caller.as_ref(), chain_id, *token)
                .await
                .map(Some)
        })
    }
}


#[cfg(test)]
mod tests {
    use alloy_primitives::{U256, address};
    use alloy_sol_types::SolValue;

    use super::testing::FakeCall;
    use super::*;

    const TOKEN: Address = address!("0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9");

    fn string_word(value: &str) -> Result<Bytes, ProviderError> {
        Ok(Bytes::from(value.to_owned().abi_encode()))
    }

    fn uint_word(value: u64) -> Result<Bytes, ProviderError> {
        Ok(Bytes::from(U256::from(value).to_be_bytes::<32>().to_vec()))
    }

    #[tokio::test]
    async fn test_reads_all_three_fields() {
        let caller = FakeCall::default()
            .respond(TOKEN, NAME_SELECTOR, string_word("Tether USD"))
            .respond(TOKEN, SYMBOL_SELECTOR, string_word("USDT"))
            .respond(TOKEN, DECIMALS_SELECTOR, uint_word(6));

        let record = fetch_token_metadata(&caller, 42161, TOKEN).await.unwrap();
        assert_eq!(record.name, "Tether USD");
        assert_eq!(record.symbol, "USDT");
        assert_eq!(record.decimals, 6);
        assert_eq!(record.address, TOKEN);
        assert_eq!(record.center_data, CenterData::default());
        assert_eq!(caller.call_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_decimals_defaults_to_18() {
        let caller = FakeCall::default()
            .respond(TOKEN, NAME_SELECTOR, string_word("Odd Token"))
            .respond(TOKEN, SYMBOL_SELECTOR, string_word("ODD"))
            .respond(TOKEN, DECIMALS_SELECTOR, Ok(Bytes::new()));

        let record = fetch_token_metadata(&caller, 94168, TOKEN).await.unwrap();
        assert_eq!(record.decimals, DEFAULT_DECIMALS);
    }

    #[tokio::test]
    async fn test_oversized_decimals_defaults_to_18() {
        let caller = FakeCall::default()
            .respond(TOKEN, NAME_SELECTOR, string_word("Odd Token"))
            .respond(TOKEN, SYMBOL_SELECTOR, string_word("ODD"))
            .respond(TOKEN, DECIMALS_SELECTOR, uint_word(4096));

        let record = fetch_token_metadata(&caller, 94168, TOKEN).await.unwrap();
        assert_eq!(record.decimals, 18);
    }

    #[tokio::test]
    async fn test_zero_decimals_is_kept() {
        let caller = FakeCall::default()
            .respond(TOKEN, NAME_SELECTOR, string_word("Whole Token"))
            .respond(TOKEN, SYMBOL_SELECTOR, string_word("WHL"))
            .respond(TOKEN, DECIMALS_SELECTOR, uint_word(0));

        let record = fetch_token_metadata(&caller, 94168, TOKEN).await.unwrap();
        assert_eq!(record.decimals, 0);
    }

    #[tokio::test]
    async fn test_single_failure_fails_tier() {
        let caller = FakeCall::default()
            .respond(TOKEN, NAME_SELECTOR, string_word("Tether USD"))
            .respond(
                TOKEN,
                SYMBOL_SELECTOR,
                Err(ProviderError::Rejected {
                    provider: "fake-rpc",
                    message: "execution reverted".into(),
                }),
            )
            .respond(TOKEN, DECIMALS_SELECTOR, uint_word(6));

        let tier = OnChainTokenMetadata::new(Arc::new(caller));
        let err = tier.resolve(42161, &TOKEN).await.unwrap_err();
        assert!(matches!(err, ProviderError::Rejected { .. }));
    }
}
