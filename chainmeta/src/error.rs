//! Error types for provider-fallback resolution.
//!
//! [`ProviderError`] is what a single provider reports. Every variant is
//! recoverable: the [`ProviderChain`](crate::fallback::ProviderChain) records
//! it as the latest error and moves on to the next provider. A confirmed
//! absence is not an error at all; providers report it as `Ok(None)`.
//!
//! [`ChainError`] is what a whole chain reports once nothing more can be
//! tried.

use std::time::Duration;

use alloy_primitives::Address;

use crate::chain::ChainId;

/// A recoverable failure of one provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider has no mapping for the chain.
    #[error("chain {chain_id} is not supported by {provider}")]
    UnsupportedChain {
        /// Provider name.
        provider: &'static str,
        /// The requested chain.
        chain_id: ChainId,
    },

    /// A credential the provider needs is absent from the credential store.
    #[error("{provider}: missing credential {name}")]
    MissingCredential {
        /// Provider name.
        provider: &'static str,
        /// Name of the credential that was requested.
        name: String,
    },

    /// Transport failure or non-2xx HTTP status.
    #[error("{provider} unavailable: {reason}")]
    Unavailable {
        /// Provider name.
        provider: &'static str,
        /// Human-readable cause.
        reason: String,
    },

    /// The provider did not answer within its deadline.
    #[error("{provider} timed out after {after:?}")]
    Timeout {
        /// Provider name.
        provider: &'static str,
        /// The deadline that expired.
        after: Duration,
    },

    /// The provider answered with an error status of its own.
    #[error("{provider} rejected the query: {message}")]
    Rejected {
        /// Provider name.
        provider: &'static str,
        /// Provider-supplied message.
        message: String,
    },

    /// The payload did not have the expected shape.
    #[error("{provider} returned a malformed response: {reason}")]
    MalformedResponse {
        /// Provider name.
        provider: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A non-authoritative list does not contain the requested address.
    #[error("{address} is not listed by {provider}")]
    NotListed {
        /// Provider name.
        provider: &'static str,
        /// The address that was looked up.
        address: Address,
    },

    /// Proxy indirection went deeper than the configured bound.
    #[error("proxy chain starting at {address} exceeds {depth} hops")]
    CyclicProxy {
        /// The address resolution started from.
        address: Address,
        /// The depth bound that was hit.
        depth: usize,
    },
}

impl ProviderError {
    /// Creates an [`ProviderError::Unavailable`] from any displayable cause.
    pub fn unavailable(provider: &'static str, reason: impl ToString) -> Self {
        Self::Unavailable {
            provider,
            reason: reason.to_string(),
        }
    }

    /// Creates a [`ProviderError::MalformedResponse`] from any displayable cause.
    pub fn malformed(provider: &'static str, reason: impl ToString) -> Self {
        Self::MalformedResponse {
            provider,
            reason: reason.to_string(),
        }
    }

    /// Returns `true` if the provider simply does not serve the chain.
    #[must_use]
    pub const fn is_unsupported_chain(&self) -> bool {
        matches!(self, Self::UnsupportedChain { .. })
    }
}

/// Failure of a whole provider chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// The chain has no providers configured.
    #[error("no providers configured")]
    Empty,

    /// Every provider failed. Only the latest failure is kept.
    #[error("all {attempts} providers failed, last error: {last}")]
    Exhausted {
        /// How many providers were tried.
        attempts: usize,
        /// The last provider's error.
        last: ProviderError,
    },

    /// A provider confirmed that the requested item does not exist, on a
    /// path where absence is not a valid result.
    #[error("not found")]
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_unsupported_chain() {
        let err = ProviderError::UnsupportedChain {
            provider: "ankr",
            chain_id: 94168,
        };
        assert_eq!(err.to_string(), "chain 94168 is not supported by ankr");
        assert!(err.is_unsupported_chain());
    }

    #[test]
    fn test_display_exhausted_keeps_last_error() {
        let err = ChainError::Exhausted {
            attempts: 2,
            last: ProviderError::unavailable("alchemy", "HTTP 503"),
        };
        assert_eq!(
            err.to_string(),
            "all 2 providers failed, last error: alchemy unavailable: HTTP 503"
        );
    }
}
