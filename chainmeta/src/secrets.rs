//! Credential lookup.
//!
//! Providers never hold API keys themselves. They ask a [`SecretStore`] for a
//! credential by name at call time, so rotating a key in the environment
//! takes effect without rebuilding provider chains.

use std::collections::HashMap;
use std::fmt;

use crate::error::ProviderError;

/// Read-only credential lookup shared by all providers.
pub trait SecretStore: Send + Sync {
    /// Returns the credential stored under `name`, if any.
    fn get(&self, name: &str) -> Option<String>;

    /// Returns the credential stored under `name` or a
    /// [`ProviderError::MissingCredential`] attributed to `provider`.
    ///
    /// Empty values count as missing.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MissingCredential`] if the credential is
    /// absent or empty.
    fn require(&self, provider: &'static str, name: &str) -> Result<String, ProviderError> {
        self.get(name)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ProviderError::MissingCredential {
                provider,
                name: name.to_owned(),
            })
    }
}

/// Credentials from an explicit table, falling back to the process
/// environment.
#[derive(Clone, Default)]
pub struct ConfigSecrets {
    table: HashMap<String, String>,
    use_env: bool,
}

impl fmt::Debug for ConfigSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.table.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ConfigSecrets")
            .field("names", &names)
            .field("use_env", &self.use_env)
            .finish()
    }
}

impl ConfigSecrets {
    /// Creates a store backed by `table` and the process environment.
    #[must_use]
    pub const fn new(table: HashMap<String, String>) -> Self {
        Self {
            table,
            use_env: true,
        }
    }

    /// Creates a store backed only by `table`.
    #[must_use]
    pub const fn from_table(table: HashMap<String, String>) -> Self {
        Self {
            table,
            use_env: false,
        }
    }

    /// Adds or replaces one credential.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.table.insert(name.into(), value.into());
        self
    }
}

impl SecretStore for ConfigSecrets {
    fn get(&self, name: &str) -> Option<String> {
        self.table.get(name).cloned().or_else(|| {
            if self.use_env {
                std::env::var(name).ok()
            } else {
                None
            }
        })
    }
}
