//! A bundled registry of known contracts.
//!
//! Project-owned contracts are often deployed on chains no block explorer
//! indexes. The registry loads their metadata from a directory of JSON
//! files, one contract per file:
//!
//! ```json
//! {
//!   "address": "0x1DD6b5F9281c6B4f043c02A83a46c2772024636c",
//!   "contractName": "Lumifi-StableToken",
//!   "abi": [],
//!   "chainId": 94168
//! }
//! ```
//!
//! `chainId` and `implementation` are optional. Entries without `chainId`
//! answer for every chain. The registry is not authoritative: an unknown
//! address is a [`ProviderError::NotListed`] so the next source is asked.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use serde::Deserialize;
use serde_json::Value;

use super::{ContractSource, SourceEntry};
use crate::chain::ChainId;
use crate::error::ProviderError;
use crate::fallback::{BoxFuture, ProviderResult};

const NAME: &str = "registry";

/// Errors raised while loading a registry directory.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Reading the directory or a file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// A file is not a valid registry entry.
    #[error("invalid registry entry {path}: {source}")]
    Parse {
        /// Offending path.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryFile {
    address: Address,
    #[serde(default)]
    contract_name: Option<String>,
    abi: Vec<Value>,
    #[serde(default)]
    implementation: String,
    #[serde(default)]
    chain_id: Option<ChainId>,
}

#[derive(Debug, Clone)]
struct RegistryEntry {
    chain_id: Option<ChainId>,
    source: SourceEntry,
}

/// In-memory contract registry keyed by address.
#[derive(Debug, Clone, Default)]
pub struct StaticContractRegistry {
    entries: HashMap<Address, Vec<RegistryEntry>>,
}

impl StaticContractRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.json` file in `dir`.
    ///
    /// A file without `contractName` is named after its file stem.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the directory cannot be read or any file
    /// is not a valid entry.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let dir = dir.as_ref();
        let io_err = |path: &Path, source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
            let path = entry.map_err(|e| io_err(dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut registry = Self::new();
        for path in paths {
            let raw = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            let file: RegistryFile =
                serde_json::from_str(&raw).map_err(|source| RegistryError::Parse {
                    path: path.clone(),
                    source,
                })?;
            let contract_name = file.contract_name.unwrap_or_else(|| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            registry.insert(
                file.chain_id,
                file.address,
                SourceEntry {
                    contract_name,
                    abi: file.abi,
                    implementation: file.implementation,
                },
            );
        }
        tracing::info!(dir = %dir.display(), contracts = registry.len(), "Loaded contract registry");
        Ok(registry)
    }

    /// Adds one contract. `chain_id = None` registers it on every chain.
    pub fn insert(&mut self, chain_id: Option<ChainId>, address: Address, source: SourceEntry) {
        self.entries
            .entry(address)
            .or_default()
            .push(RegistryEntry { chain_id, source });
    }

    /// Returns the number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a contract, preferring a chain-specific entry.
    #[must_use]
    pub fn get(&self, chain_id: ChainId, address: Address) -> Option<&SourceEntry> {
        let candidates = self.entries.get(&address)?;
        candidates
            .iter()
            .find(|e| e.chain_id == Some(chain_id))
            .or_else(|| candidates.iter().find(|e| e.chain_id.is_none()))
            .map(|e| &e.source)
    }
}

impl ContractSource for StaticContractRegistry {
    fn name(&self) -> &'static str {
        NAME
    }

    fn source(&self, chain_id: ChainId, address: Address) -> BoxFuture<'_, ProviderResult<SourceEntry>> {
        let found = self.get(chain_id, address).cloned();
        Box::pin(async move {
            found.map(Some).ok_or(ProviderError::NotListed {
                provider: NAME,
                address,
            })
        })
    }
}
