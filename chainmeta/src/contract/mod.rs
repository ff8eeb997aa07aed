//! Contract metadata resolution with proxy following.
//!
//! A [`ContractSource`] knows how to look up one address: it returns the
//! verified name, the ABI and whatever implementation address the source
//! reports. [`ProxyResolver`] wraps a source and turns it into a
//! [`Provider`] that follows proxy indirection:
//!
//! 1. Look up the target address.
//! 2. If the reported implementation is a valid address that differs from
//!    the target, look that address up next.
//! 3. Otherwise build the final [`ContractRecord`].
//!
//! Each hop is one more call to the same source. Resolution gives up with
//! [`ProviderError::CyclicProxy`] after [`MAX_PROXY_DEPTH`] hops.

mod registry;

pub use registry::{RegistryError, StaticContractRegistry};

use std::sync::Arc;

use alloy_primitives::Address;
use serde_json::Value;

use crate::chain::ChainId;
use crate::error::{ChainError, ProviderError};
use crate::fallback::{BoxFuture, Provider, ProviderChain, ProviderResult};
use crate::types::{ContractRecord, parse_implementation};

/// Maximum number of proxy hops followed before giving up.
pub const MAX_PROXY_DEPTH: usize = 4;

/// Raw contract metadata as a source reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Declared contract name.
    pub contract_name: String,
    /// Full, unfiltered ABI.
    pub abi: Vec<Value>,
    /// Reported implementation address, verbatim. Empty for non-proxies.
    pub implementation: String,
}

/// A single-address contract metadata lookup.
///
/// `Ok(None)` means the source confirmed it has no record for the address.
pub trait ContractSource: Send + Sync {
    /// Stable source name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Looks up `address` on `chain_id`.
    fn source(&self, chain_id: ChainId, address: Address) -> BoxFuture<'_, ProviderResult<SourceEntry>>;
}

/// Which ABI fragments end up in the returned record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AbiFilter {
    /// Drop the constructor and every `pure`/`view` function.
    WriteOnly,
    /// Keep every fragment.
    #[default]
    Full,
}

impl AbiFilter {
    /// Applies the filter to an ABI.
    #[must_use]
    pub fn apply(self, abi: Vec<Value>) -> Vec<Value> {
        match self {
            Self::Full => abi,
            Self::WriteOnly => abi.into_iter().filter(is_state_changing).collect(),
        }
    }
}

fn is_state_changing(fragment: &Value) -> bool {
    if fragment.get("type").and_then(Value::as_str) == Some("constructor") {
        return false;
    }
    !matches!(
        fragment.get("stateMutability").and_then(Value::as_str),
        Some("pure" | "view")
    )
}

/// Whose name a followed proxy reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProxyNaming {
    /// The outermost proxy's declared name.
    #[default]
    Proxy,
    /// The terminal implementation's declared name.
    Implementation,
}

/// Turns a [`ContractSource`] into a proxy-following provider.
#[derive(Debug, Clone)]
pub struct ProxyResolver<S> {
    source: S,
    filter: AbiFilter,
    naming: ProxyNaming,
}

impl<S: ContractSource> ProxyResolver<S> {
    /// Wraps `source` with the given ABI filter and naming policy.
    pub const fn new(source: S, filter: AbiFilter, naming: ProxyNaming) -> Self {
        Self {
            source,
            filter,
            naming,
        }
    }

    /// Returns the wrapped source.
    pub const fn inner(&self) -> &S {
        &self.source
    }

    async fn follow(&self, chain_id: ChainId, address: Address) -> ProviderResult<ContractRecord> {
        let mut target = address;
        let mut proxy_name: Option<String> = None;
        let mut followed: Option<Address> = None;

        for depth in 0..=MAX_PROXY_DEPTH {
            let Some(entry) = self.source.source(chain_id, target).await? else {
                return Ok(None);
            };
            let reported = parse_implementation(&entry.implementation);
            match reported.filter(|next| *next != target) {
                Some(next) if depth < MAX_PROXY_DEPTH => {
                    tracing::debug!(
                        source = self.source.name(),
                        chain_id,
                        proxy = %target,
                        implementation = %next,
                        "Following proxy"
                    );
                    proxy_name.get_or_insert(entry.contract_name);
                    followed = Some(next);
                    target = next;
                }
                Some(_) => break,
                None => {
                    let contract_name = match self.naming {
                        ProxyNaming::Proxy => proxy_name.unwrap_or(entry.contract_name),
                        ProxyNaming::Implementation => entry.contract_name,
                    };
                    return Ok(Some(ContractRecord {
                        contract_name,
                        abi: self.filter.apply(entry.abi),
                        implementation: followed.or(reported),
                    }));
                }
            }
        }

        tracing::warn!(source = self.source.name(), chain_id, %address, "Proxy chain too deep");
        Err(ProviderError::CyclicProxy {
            address,
            depth: MAX_PROXY_DEPTH,
        })
    }
}

impl<S: ContractSource> Provider<Address, ContractRecord> for ProxyResolver<S> {
    fn name(&self) -> &'static str {
        self.source.name()
    }

    fn resolve<'a>(
        &'a self,
        chain_id: ChainId,
        address: &'a Address,
    ) -> BoxFuture<'a, ProviderResult<ContractRecord>> {
        Box::pin(self.follow(chain_id, *address))
    }
}

/// Resolves contract metadata through an ordered chain of sources.
#[derive(Debug, Clone)]
pub struct ContractResolver {
    chain: ProviderChain<Address, ContractRecord>,
}

impl ContractResolver {
    /// Creates a resolver over an already-assembled provider chain.
    #[must_use]
    pub const fn new(chain: ProviderChain<Address, ContractRecord>) -> Self {
        Self { chain }
    }

    /// Builds a resolver that wraps every source in a [`ProxyResolver`] with
    /// the same filter and naming policy.
    #[must_use]
    pub fn from_sources(
        sources: Vec<Arc<dyn ContractSource>>,
        filter: AbiFilter,
        naming: ProxyNaming,
    ) -> Self {
        let chain = sources
            .into_iter()
            .map(|source| {
                Arc::new(ProxyResolver::new(source, filter, naming))
                    as Arc<dyn Provider<Address, ContractRecord>>
            })
            .collect();
        Self { chain }
    }

    /// Returns the underlying chain.
    #[must_use]
    pub const fn chain(&self) -> &ProviderChain<Address, ContractRecord> {
        &self.chain
    }

    /// Replaces the per-provider deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<std::time::Duration>) -> Self {
        self.chain = self.chain.with_timeout(timeout);
        self
    }

    /// Resolves `address` on `chain_id`.
    ///
    /// `Ok(None)` means a source confirmed the contract is unknown.
    ///
    /// # Errors
    ///
    /// Returns a [`ChainError`] if no source produced a terminal answer.
    pub async fn resolve(
        &self,
        chain_id: ChainId,
        address: Address,
    ) -> Result<Option<ContractRecord>, ChainError> {
        self.chain.execute(chain_id, &address).await
    }
}

impl ContractSource for Arc<dyn ContractSource> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn source(&self, chain_id: ChainId, address: Address) -> BoxFuture<'_, ProviderResult<SourceEntry>> {
        (**self).source(chain_id, address)
    }
}
