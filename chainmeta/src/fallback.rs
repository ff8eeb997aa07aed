//! The ordered provider-fallback primitive.
//!
//! A [`ProviderChain`] holds an ordered list of [`Provider`]s for one
//! resolution task and runs them strictly one after another:
//!
//! - the first `Ok(Some(_))` is returned and no later provider is invoked;
//! - the first `Ok(None)` is a confirmed absence and also stops the chain;
//! - an `Err(_)` is remembered as the latest error and the next provider runs.
//!
//! Providers are never raced against each other, so a provider that bills
//! per call is only reached when everything before it has failed. Each call
//! can be bounded by a per-provider deadline so one hung upstream does not
//! starve the rest of the chain.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::chain::ChainId;
use crate::error::{ChainError, ProviderError};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a single provider returns.
///
/// `Ok(Some(_))` is a result, `Ok(None)` a confirmed absence.
pub type ProviderResult<T> = Result<Option<T>, ProviderError>;

/// Default deadline applied to each provider call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// One external data source for a resolution task.
///
/// Implementations translate the chain ID into their own key space, perform
/// one external call and normalize the response into `T`.
pub trait Provider<Q: ?Sized, T>: Send + Sync {
    /// Stable provider name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Resolves `query` on `chain_id`.
    fn resolve<'a>(&'a self, chain_id: ChainId, query: &'a Q) -> BoxFuture<'a, ProviderResult<T>>;
}

/// An ordered fallback list of providers.
pub struct ProviderChain<Q: ?Sized, T> {
    providers: Vec<Arc<dyn Provider<Q, T>>>,
    timeout: Option<Duration>,
}

impl<Q: ?Sized, T> fmt::Debug for ProviderChain<Q, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderChain")
            .field("providers", &self.names())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<Q: ?Sized, T> Clone for ProviderChain<Q, T> {
    fn clone(&self) -> Self {
        Self {
            providers: self.providers.clone(),
            timeout: self.timeout,
        }
    }
}

impl<Q: ?Sized, T> Default for ProviderChain<Q, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: ?Sized, T> ProviderChain<Q, T> {
    /// Creates an empty chain with [`DEFAULT_PROVIDER_TIMEOUT`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            timeout: Some(DEFAULT_PROVIDER_TIMEOUT),
        }
    }

    /// Appends a provider to the end of the chain.
    pub fn push(&mut self, provider: Arc<dyn Provider<Q, T>>) -> &mut Self {
        self.providers.push(provider);
        self
    }

    /// Builder-style [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn Provider<Q, T>>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Sets the per-provider deadline. `None` disables it.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured per-provider deadline.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the provider names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Returns the number of providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if the chain has no providers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Runs the providers in order until one returns a terminal outcome.
    ///
    /// Returns `Ok(Some(_))` for the first result, `Ok(None)` for the first
    /// confirmed absence.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Empty`] if no providers are configured, or
    /// [`ChainError::Exhausted`] carrying the last provider's error if every
    /// provider failed.
    pub async fn execute(&self, chain_id: ChainId, query: &Q) -> Result<Option<T>, ChainError> {
        let mut latest_error = None;
        for provider in &self.providers {
            let name = provider.name();
            match self.call(provider.as_ref(), chain_id, query).await {
                Ok(outcome) => {
                    tracing::debug!(
                        provider = name,
                        chain_id,
                        found = outcome.is_some(),
                        "Provider answered"
                    );
                    return Ok(outcome);
                }
                Err(e) => {
                    tracing::debug!(provider = name, chain_id, error = %e, "Provider failed, falling back");
                    latest_error = Some(e);
                }
            }
        }
        match latest_error {
            Some(last) => Err(ChainError::Exhausted {
                attempts: self.providers.len(),
                last,
            }),
            None => Err(ChainError::Empty),
        }
    }

    async fn call(
        &self,
        provider: &dyn Provider<Q, T>,
        chain_id: ChainId,
        query: &Q,
    ) -> ProviderResult<T> {
        let fut = provider.resolve(chain_id, query);
        match self.timeout {
            Some(after) => tokio::time::timeout(after, fut)
                .await
                .unwrap_or_else(|_| {
                    Err(ProviderError::Timeout {
                        provider: provider.name(),
                        after,
                    })
                }),
            None => fut.await,
        }
    }
}

impl<Q: ?Sized, T> FromIterator<Arc<dyn Provider<Q, T>>> for ProviderChain<Q, T> {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Provider<Q, T>>>>(iter: I) -> Self {
        Self {
            providers: iter.into_iter().collect(),
            timeout: Some(DEFAULT_PROVIDER_TIMEOUT),
        }
    }
}
