//! Server configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 3000
//! provider_timeout_secs = 10
//!
//! [secrets]
//! POLYGONSCAN_API_KEY = "$POLYGONSCAN_API_KEY"
//! ANKR_API_URL = "https://rpc.ankr.com/multichain/${ANKR_KEY}"
//!
//! [rpc_urls]
//! 137 = "https://polygon-rpc.com"
//! 94168 = "$LUMI_RPC_URL"
//!
//! [balances]
//! providers = ["ankr", "alchemy", "onchain"]
//!
//! [token_lists]
//! 137 = ["https://api-polygon-tokens.polygon.technology/tokenlists/polygonTokens.tokenlist.json"]
//!
//! [contracts]
//! registry_dir = "contracts"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `config.toml`)
//! - `HOST` - Override server bind address
//! - `PORT` - Override server port
//! - Any credential referenced by `$VAR` in the config file. Credentials
//!   missing from `[secrets]` are also looked up in the environment directly.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy_primitives::Address;
use chainmeta::ChainId;
use chainmeta::chain::parse_chain_id;
use serde::{Deserialize, Serialize};
use url::Url;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid TOML for [`ServerConfig`].
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A table key that should be a chain id is not one.
    #[error("invalid chain id {key:?} in [{table}]")]
    InvalidChainId {
        /// The table the key appeared in.
        table: &'static str,
        /// The offending key.
        key: String,
    },
}

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Server port (default: `3000`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deadline for a single provider call, in seconds. `0` disables it.
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// Provider credentials by name.
    #[serde(default)]
    pub secrets: HashMap<String, String>,

    /// JSON-RPC endpoints keyed by chain id.
    #[serde(default)]
    pub rpc_urls: HashMap<String, Url>,

    /// Balance provider settings.
    #[serde(default)]
    pub balances: BalancesConfig,

    /// Remote token-list URLs keyed by chain id. Empty means the built-in
    /// Polygon lists.
    #[serde(default)]
    pub token_lists: HashMap<String, Vec<Url>>,

    /// Contract metadata settings.
    #[serde(default)]
    pub contracts: ContractsConfig,
}

/// A balance provider that can appear in `balances.providers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceProviderKind {
    /// Ankr Advanced API.
    Ankr,
    /// Alchemy token API.
    Alchemy,
    /// Covalent `balances_v2`.
    Covalent,
    /// Moralis `erc20` endpoint.
    Moralis,
    /// `balanceOf` calls over a fixed token set.
    Onchain,
}

/// `[balances]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancesConfig {
    /// Providers in the order they are tried.
    #[serde(default = "default_balance_providers")]
    pub providers: Vec<BalanceProviderKind>,

    /// Tokens checked by the `onchain` provider, keyed by chain id.
    /// Empty means the Lumi layer-3 token set.
    #[serde(default)]
    pub onchain_tokens: HashMap<String, Vec<Address>>,
}

impl Default for BalancesConfig {
    fn default() -> Self {
        Self {
            providers: default_balance_providers(),
            onchain_tokens: HashMap::new(),
        }
    }
}

/// `[contracts]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// Directory of contract JSON files consulted before the explorer.
    #[serde(default)]
    pub registry_dir: Option<PathBuf>,

    /// Overrides the explorer API URL for every chain.
    #[serde(default)]
    pub explorer_api_url: Option<Url>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0))
}

const fn default_port() -> u16 {
    3000
}

const fn default_provider_timeout_secs() -> u64 {
    10
}

fn default_balance_providers() -> Vec<BalanceProviderKind> {
    vec![
        BalanceProviderKind::Ankr,
        BalanceProviderKind::Alchemy,
        BalanceProviderKind::Onchain,
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            provider_timeout_secs: default_provider_timeout_secs(),
            secrets: HashMap::new(),
            rpc_urls: HashMap::new(),
            balances: BalancesConfig::default(),
            token_lists: HashMap::new(),
            contracts: ContractsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the defaults. After loading, `$VAR` / `${VAR}`
    /// references are expanded from the process environment and the `HOST`
    /// and `PORT` env vars override the file values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = if path.exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            String::new()
        };

        let mut config = Self::from_toml(&content)?;

        if let Ok(host) = std::env::var("HOST")
            && let Ok(addr) = host.parse()
        {
            config.host = addr;
        }
        if let Ok(port) = std::env::var("PORT")
            && let Ok(p) = port.parse()
        {
            config.port = p;
        }

        Ok(config)
    }

    /// Parses configuration text after environment expansion.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid config.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(&expand_env_vars(content))?;
        config.secrets.retain(|name, value| {
            let resolved = !has_unresolved_ref(value);
            if !resolved {
                tracing::warn!(secret = %name, "Secret references an unset variable, ignoring");
            }
            resolved
        });
        Ok(config)
    }

    /// Per-provider deadline, or `None` when disabled.
    #[must_use]
    pub const fn provider_timeout(&self) -> Option<Duration> {
        match self.provider_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// RPC endpoints keyed by parsed chain id.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidChainId`] for a non-numeric key.
    pub fn rpc_urls(&self) -> Result<HashMap<ChainId, Url>, ConfigError> {
        by_chain("rpc_urls", &self.rpc_urls)
    }

    /// Remote token-list sources keyed by parsed chain id.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidChainId`] for a non-numeric key.
    pub fn token_lists(&self) -> Result<HashMap<ChainId, Vec<Url>>, ConfigError> {
        by_chain("token_lists", &self.token_lists)
    }

    /// On-chain balance token sets keyed by parsed chain id.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidChainId`] for a non-numeric key.
    pub fn onchain_tokens(&self) -> Result<HashMap<ChainId, Vec<Address>>, ConfigError> {
        by_chain("balances.onchain_tokens", &self.balances.onchain_tokens)
    }
}

fn by_chain<V: Clone>(
    table: &'static str,
    entries: &HashMap<String, V>,
) -> Result<HashMap<ChainId, V>, ConfigError> {
    entries
        .iter()
        .map(|(key, value)| {
            parse_chain_id(key)
                .map(|chain_id| (chain_id, value.clone()))
                .ok_or_else(|| ConfigError::InvalidChainId {
                    table,
                    key: key.clone(),
                })
        })
        .collect()
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

/// Whether `value` still holds a `$VAR` or `${VAR}` reference after expansion.
fn has_unresolved_ref(value: &str) -> bool {
    let blank_vars = |name: &str| {
        name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
            .then(String::new)
    };
    expand_with(value, blank_vars) != value
}

fn expand_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }
        let braced = chars.next_if_eq(&'{').is_some();
        let mut name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                closed = true;
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        match lookup(&name).filter(|_| !name.is_empty()) {
            Some(value) => out.push_str(&value),
            None => {
                out.push('$');
                if braced {
                    out.push('{');
                }
                out.push_str(&name);
                if closed {
                    out.push('}');
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use chainmeta::ProviderError;
    use chainmeta::secrets::{ConfigSecrets, SecretStore};

    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "KEY" => Some("abc".into()),
            "HOST_PART" => Some("rpc.example".into()),
            _ => None,
        }
    }

    #[test]
    fn test_expand_plain_and_braced() {
        assert_eq!(expand_with("k = \"$KEY\"", lookup), "k = \"abc\"");
        assert_eq!(
            expand_with("https://${HOST_PART}/v1", lookup),
            "https://rpc.example/v1"
        );
    }

    #[test]
    fn test_unresolved_left_as_is() {
        assert_eq!(expand_with("$MISSING and ${ALSO}", lookup), "$MISSING and ${ALSO}");
        assert_eq!(expand_with("cost: $5", lookup), "cost: $5");
        assert_eq!(expand_with("trailing $", lookup), "trailing $");
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.provider_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(
            config.balances.providers,
            vec![
                BalanceProviderKind::Ankr,
                BalanceProviderKind::Alchemy,
                BalanceProviderKind::Onchain
            ]
        );
        assert!(config.contracts.registry_dir.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = ServerConfig::from_toml(
            r#"
            port = 8080
            provider_timeout_secs = 0

            [secrets]
            POLYGONSCAN_API_KEY = "pk"

            [rpc_urls]
            94168 = "http://127.0.0.1:8545"

            [balances]
            providers = ["covalent", "moralis"]

            [balances.onchain_tokens]
            94168 = ["0x1DD6b5F9281c6B4f043c02A83a46c2772024636c"]

            [token_lists]
            137 = ["https://lists.example/polygon.json"]
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.provider_timeout(), None);
        assert_eq!(config.secrets["POLYGONSCAN_API_KEY"], "pk");
        assert_eq!(
            config.balances.providers,
            vec![BalanceProviderKind::Covalent, BalanceProviderKind::Moralis]
        );
        assert!(config.rpc_urls().unwrap().contains_key(&94168));
        assert_eq!(config.onchain_tokens().unwrap()[&94168].len(), 1);
        assert_eq!(config.token_lists().unwrap()[&137].len(), 1);
    }

    #[test]
    fn test_unresolved_secrets_are_dropped() {
        let config = ServerConfig::from_toml(
            r#"
            [secrets]
            CHAINMETA_TEST_KEY = "$CHAINMETA_TEST_UNSET_VAR"
            CHAINMETA_TEST_URL = "https://rpc.example/${CHAINMETA_TEST_UNSET_VAR}"
            CHAINMETA_TEST_PLAIN = "abc$5"
            "#,
        )
        .unwrap();

        assert!(!config.secrets.contains_key("CHAINMETA_TEST_KEY"));
        assert!(!config.secrets.contains_key("CHAINMETA_TEST_URL"));
        assert_eq!(config.secrets["CHAINMETA_TEST_PLAIN"], "abc$5");

        let secrets = ConfigSecrets::new(config.secrets);
        assert_eq!(
            secrets.require("explorer", "CHAINMETA_TEST_KEY").unwrap_err(),
            ProviderError::MissingCredential {
                provider: "explorer",
                name: "CHAINMETA_TEST_KEY".into(),
            }
        );
    }

    #[test]
    fn test_bad_chain_key() {
        let config = ServerConfig::from_toml("[rpc_urls]\npolygon = \"http://127.0.0.1:8545\"").unwrap();
        assert!(matches!(
            config.rpc_urls(),
            Err(ConfigError::InvalidChainId { table: "rpc_urls", .. })
        ));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = ServerConfig::from_toml("[balances]\nproviders = [\"etherscan\"]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
