//! Read-only contract calls over JSON-RPC.
//!
//! [`EthCall`] is the seam every on-chain tier goes through: one `eth_call`
//! against the latest block, raw return bytes back. [`RpcEthCall`] is the
//! production implementation with one alloy [`RootProvider`] per chain.

use std::collections::HashMap;
use std::fmt;

use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::{Provider as _, RootProvider};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_sol_types::SolValue;
use alloy_transport::TransportError;
use chainmeta::{BoxFuture, ChainId, ProviderError};
use url::Url;

/// `name()` selector.
pub const NAME_SELECTOR: [u8; 4] = [0x06, 0xfd, 0xde, 0x03];
/// `symbol()` selector.
pub const SYMBOL_SELECTOR: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41];
/// `decimals()` selector.
pub const DECIMALS_SELECTOR: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];
/// `balanceOf(address)` selector.
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// Executes a single read-only call.
pub trait EthCall: Send + Sync {
    /// Name reported in provider errors.
    fn name(&self) -> &'static str;

    /// Calls `to` with `calldata` on `chain_id` and returns the raw result.
    fn call(&self, chain_id: ChainId, to: Address, calldata: Bytes) -> BoxFuture<'_, Result<Bytes, ProviderError>>;
}

/// [`EthCall`] backed by configured JSON-RPC endpoints.
#[derive(Clone, Default)]
pub struct RpcEthCall {
    providers: HashMap<ChainId, RootProvider>,
}

impl fmt::Debug for RpcEthCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chains: Vec<_> = self.providers.keys().copied().collect();
        chains.sort_unstable();
        f.debug_struct("RpcEthCall").field("chains", &chains).finish()
    }
}

impl RpcEthCall {
    const NAME: &'static str = "rpc";

    /// Creates a client with one HTTP provider per RPC URL.
    #[must_use]
    pub fn from_urls(urls: HashMap<ChainId, Url>) -> Self {
        let providers = urls
            .into_iter()
            .map(|(chain_id, url)| (chain_id, RootProvider::new_http(url)))
            .collect();
        Self { providers }
    }

    /// Returns `true` if an RPC endpoint is configured for `chain_id`.
    #[must_use]
    pub fn supports(&self, chain_id: ChainId) -> bool {
        self.providers.contains_key(&chain_id)
    }

    fn provider(&self, chain_id: ChainId) -> Result<&RootProvider, ProviderError> {
        self.providers
            .get(&chain_id)
            .ok_or(ProviderError::UnsupportedChain {
                provider: Self::NAME,
                chain_id,
            })
    }
}

impl EthCall for RpcEthCall {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn call(&self, chain_id: ChainId, to: Address, calldata: Bytes) -> BoxFuture<'_, Result<Bytes, ProviderError>> {
        Box::pin(async move {
            let provider = self.provider(chain_id)?;
            let tx = TransactionRequest::default()
                .with_to(to)
                .with_input(calldata);
            provider
                .call(tx)
                .await
                .map_err(|e| transport_error(Self::NAME, &e))
        })
    }
}

/// Maps an RPC failure: a JSON-RPC error object is a rejection, anything
/// else is an unavailable endpoint.
fn transport_error(provider: &'static str, error: &TransportError) -> ProviderError {
    error.as_error_resp().map_or_else(
        || ProviderError::unavailable(provider, error),
        |payload| ProviderError::Rejected {
            provider,
            message: payload.message.to_string(),
        },
    )
}

/// ABI-decodes a dynamic `string` return value.
///
/// # Errors
///
/// Returns [`ProviderError::MalformedResponse`] if `data` is not a valid
/// encoding.
pub fn decode_string(provider: &'static str, data: &[u8]) -> Result<String, ProviderError> {
    String::abi_decode(data).map_err(|e| ProviderError::malformed(provider, e))
}

/// Decodes a big-endian unsigned integer of at most 32 bytes.
///
/// Empty or oversized input yields `None`.
#[must_use]
pub fn decode_uint(data: &[u8]) -> Option<U256> {
    if data.is_empty() || data.len() > 32 {
        return None;
    }
    Some(U256::from_be_slice(data))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::hex;
    use alloy_sol_types::SolCall;

    use super::*;
    use crate::contract::IERC20Metadata;

    #[test]
    fn test_selectors_match_interface() {
        assert_eq!(NAME_SELECTOR, IERC20Metadata::nameCall::SELECTOR);
        assert_eq!(SYMBOL_SELECTOR, IERC20Metadata::symbolCall::SELECTOR);
        assert_eq!(DECIMALS_SELECTOR, IERC20Metadata::decimalsCall::SELECTOR);
        assert_eq!(BALANCE_OF_SELECTOR, IERC20Metadata::balanceOfCall::SELECTOR);
    }

    #[test]
    fn test_decode_string_return_data() {
        // name() of USDC (PoS): offset 0x20, length 14, "USD Coin (PoS)"
        let data = hex!(
            "0000000000000000000000000000000000000000000000000000000000000020"
            "000000000000000000000000000000000000000000000000000000000000000e"
            "55534420436f696e2028506f5329000000000000000000000000000000000000"
        );
        assert_eq!(decode_string("rpc", &data).unwrap(), "USD Coin (PoS)");
    }

    #[test]
    fn test_decode_string_rejects_garbage() {
        let err = decode_string("rpc", &[0x01, 0x02]).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { provider: "rpc", .. }));
    }

    #[test]
    fn test_decode_uint() {
        let mut word = [0u8; 32];
        word[31] = 6;
        assert_eq!(decode_uint(&word), Some(U256::from(6)));
        assert_eq!(decode_uint(&[0x12]), Some(U256::from(18)));
        assert_eq!(decode_uint(&[]), None);
        assert_eq!(decode_uint(&[0u8; 33]), None);
    }

    #[tokio::test]
    async fn test_rpc_without_url_is_unsupported() {
        let client = RpcEthCall::default();
        let err = client
            .call(137, Address::ZERO, Bytes::from_static(&NAME_SELECTOR))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProviderError::UnsupportedChain {
                provider: "rpc",
                chain_id: 137,
            }
        );
        assert!(!client.supports(137));
    }
}
