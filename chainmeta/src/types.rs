//! Canonical records produced by the resolvers.
//!
//! These are the shapes clients see on the wire, independent of which
//! provider produced them.

use alloy_primitives::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Normalized contract metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    /// Human-readable contract name. For a followed proxy this is either the
    /// proxy's or the implementation's name, depending on the naming policy.
    pub contract_name: String,
    /// ABI fragments, possibly filtered.
    pub abi: Vec<Value>,
    /// The implementation address behind a proxy. Serialized as `""` when
    /// absent.
    #[serde(
        serialize_with = "serialize_implementation",
        deserialize_with = "deserialize_implementation"
    )]
    pub implementation: Option<Address>,
}

fn serialize_implementation<S: Serializer>(
    value: &Option<Address>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(address) => address.serialize(serializer),
        None => serializer.serialize_str(""),
    }
}

fn deserialize_implementation<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Address>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(parse_implementation(&raw))
}

/// Parses an implementation address as reported by a contract source.
///
/// Empty or unparseable values mean "not a proxy".
#[must_use]
pub fn parse_implementation(raw: &str) -> Option<Address> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse().ok()
}

/// One ERC-20 holding of a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceEntry {
    /// Token contract address as the provider reported it.
    pub token_address: String,
    /// Raw balance in the provider's own encoding (decimal or `0x` hex).
    pub balance: String,
}

impl TokenBalanceEntry {
    /// Creates an entry.
    pub fn new(token_address: impl Into<String>, balance: impl Into<String>) -> Self {
        Self {
            token_address: token_address.into(),
            balance: balance.into(),
        }
    }
}

/// Returns `true` if a raw balance string denotes zero.
///
/// Accepts decimal (`"0"`, `"000"`), `0x`-prefixed hex of any width, and the
/// empty string.
#[must_use]
pub fn is_zero_balance(raw: &str) -> bool {
    let raw = raw.trim();
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    digits.chars().all(|c| c == '0')
}

/// Presentation metadata attached to a token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterData {
    /// Token logo URL.
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    /// Project website.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Normalized ERC-20 token metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadataRecord {
    /// Token name.
    pub name: String,
    /// Token ticker.
    pub symbol: String,
    /// Token contract address.
    pub address: Address,
    /// Decimal places.
    pub decimals: u8,
    /// Presentation metadata; empty when the source had none.
    pub center_data: CenterData,
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_contract_record_wire_shape() {
        let record = ContractRecord {
            contract_name: "Vault".into(),
            abi: vec![json!({"type": "function", "name": "deposit"})],
            implementation: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "contractName": "Vault",
                "abi": [{"type": "function", "name": "deposit"}],
                "implementation": ""
            })
        );
    }

    #[test]
    fn test_contract_record_implementation_roundtrip() {
        let implementation = address!("0x1DD6b5F9281c6B4f043c02A83a46c2772024636c");
        let record = ContractRecord {
            contract_name: "Proxy".into(),
            abi: vec![],
            implementation: Some(implementation),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: ContractRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_parse_implementation() {
        assert_eq!(parse_implementation(""), None);
        assert_eq!(parse_implementation("  "), None);
        assert_eq!(parse_implementation("not-an-address"), None);
        assert_eq!(
            parse_implementation("0xc3abc47863524ced8daf3ef98d74dd881e131c38"),
            Some(address!("0xc3aBC47863524ced8DAf3ef98d74dd881E131C38"))
        );
    }

    #[test]
    fn test_is_zero_balance() {
        assert!(is_zero_balance("0"));
        assert!(is_zero_balance(""));
        assert!(is_zero_balance("0x"));
        assert!(is_zero_balance(
            "0x0000000000000000000000000000000000000000000000000000000000000000"
        ));
        assert!(!is_zero_balance("1000"));
        assert!(!is_zero_balance("0x01"));
    }

    #[test]
    fn test_center_data_omits_absent_fields() {
        let record = TokenMetadataRecord {
            name: "USD Coin".into(),
            symbol: "USDC".into(),
            address: address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174"),
            decimals: 6,
            center_data: CenterData {
                logo_uri: Some("https://example.org/usdc.png".into()),
                ..CenterData::default()
            },
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["centerData"], json!({"logoURI": "https://example.org/usdc.png"}));
        assert_eq!(value["decimals"], json!(6));
    }
}
