//! Etherscan-family block explorer `getsourcecode` client.
//!
//! Explorers answer with an envelope of the form
//! `{"status": "1", "message": "OK", "result": [ { "ContractName", "ABI", "Implementation", ... } ]}`.
//! `status == "0"` is an explorer-level error; an empty `result` array means
//! the explorer has no record of the address.

use std::sync::Arc;

use alloy_primitives::Address;
use chainmeta::contract::{ContractSource, SourceEntry};
use chainmeta::networks::explorer_endpoint;
use chainmeta::secrets::SecretStore;
use chainmeta::{BoxFuture, ChainId, ProviderError, ProviderResult};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::client::{JsonClient, parse_url};

const NAME: &str = "explorer";

#[derive(Debug, Deserialize)]
struct ExplorerEnvelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SourceCodeRow {
    #[serde(default)]
    contract_name: String,
    #[serde(rename = "ABI", default)]
    abi: String,
    #[serde(default)]
    implementation: String,
}

/// Contract source backed by a block explorer API.
#[derive(Clone)]
pub struct ExplorerSource {
    client: JsonClient,
    secrets: Arc<dyn SecretStore>,
    api_url: Option<Url>,
}

impl std::fmt::Debug for ExplorerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplorerSource")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl ExplorerSource {
    /// Creates a source that resolves explorer URLs from the chain table.
    #[must_use]
    pub fn new(client: JsonClient, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            client,
            secrets,
            api_url: None,
        }
    }

    /// Sends every request to `api_url` instead of the per-chain explorer.
    ///
    /// Chain support is still decided by the chain table.
    #[must_use]
    pub fn with_api_url(mut self, api_url: Url) -> Self {
        self.api_url = Some(api_url);
        self
    }

    async fn fetch(&self, chain_id: ChainId, address: Address) -> ProviderResult<SourceEntry> {
        let endpoint = explorer_endpoint(chain_id)?;
        let api_key = self.secrets.require(NAME, endpoint.api_key_name)?;
        let url = match &self.api_url {
            Some(url) => url.clone(),
            None => parse_url(endpoint.api_url, "explorer API URL")
                .map_err(|e| e.into_provider_error(NAME))?,
        };
        let address = address.to_string();

        let envelope: ExplorerEnvelope = self
            .client
            .get_json(
                url,
                "GET getsourcecode",
                &[
                    ("module", "contract"),
                    ("action", "getsourcecode"),
                    ("address", &address),
                    ("apikey", &api_key),
                ],
                &[],
            )
            .await
            .map_err(|e| e.into_provider_error(NAME))?;

        parse_envelope(envelope)
    }
}

fn parse_envelope(envelope: ExplorerEnvelope) -> ProviderResult<SourceEntry> {
    if envelope.status == "0" {
        let detail = envelope.result.as_str().unwrap_or_default();
        return Err(ProviderError::Rejected {
            provider: NAME,
            message: format!("{}: {detail}", envelope.message),
        });
    }
    let mut rows: Vec<SourceCodeRow> = serde_json::from_value(envelope.result)
        .map_err(|e| ProviderError::malformed(NAME, e))?;
    if rows.is_empty() {
        return Ok(None);
    }
    let row = rows.swap_remove(0);
    let abi: Vec<Value> = serde_json::from_str(&row.abi)
        .map_err(|_| ProviderError::malformed(NAME, format!("ABI is not JSON: {}", row.abi)))?;
    Ok(Some(SourceEntry {
        contract_name: row.contract_name,
        abi,
        implementation: row.implementation,
    }))
}

impl ContractSource for ExplorerSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn source(&self, chain_id: ChainId, address: Address) -> BoxFuture<'_, ProviderResult<SourceEntry>> {
        Box::pin(self.fetch(chain_id, address))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use alloy_primitives::address;
    use chainmeta::contract::{AbiFilter, ContractResolver, ProxyNaming};
    use chainmeta::secrets::ConfigSecrets;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const PROXY: Address = address!("0x1DD6b5F9281c6B4f043c02A83a46c2772024636c");
    const IMPL: Address = address!("0x15B6eC24f59Fea164C6e235941Aa00fB0d4A32f6");

    fn secrets() -> Arc<dyn SecretStore> {
        Arc::new(ConfigSecrets::from_table(HashMap::new()).with("POLYGONSCAN_API_KEY", "test-key"))
    }

    fn source_for(server: &MockServer) -> ExplorerSource {
        ExplorerSource::new(JsonClient::new(), secrets())
            .with_api_url(Url::parse(&server.uri()).unwrap())
    }

    fn row(name: &str, abi: &Value, implementation: &str) -> Value {
        json!({
            "status": "1",
            "message": "OK",
            "result": [{
                "SourceCode": "",
                "ContractName": name,
                "ABI": abi.to_string(),
                "Implementation": implementation,
                "Proxy": if implementation.is_empty() { "0" } else { "1" }
            }]
        })
    }

    async fn mount_row(server: &MockServer, address: Address, body: Value) {
        Mock::given(method("GET"))
            .and(query_param("module", "contract"))
            .and(query_param("action", "getsourcecode"))
            .and(query_param("address", address.to_string()))
            .and(query_param("apikey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_proxy_resolves_to_implementation_abi_with_proxy_name() {
        let server = MockServer::start().await;
        let impl_abi = json!([
            {"type": "constructor", "inputs": []},
            {"type": "function", "name": "deposit", "stateMutability": "nonpayable", "inputs": []},
            {"type": "function", "name": "totalAssets", "stateMutability": "view", "inputs": []}
        ]);
        mount_row(&server, PROXY, row("VaultProxy", &json!([]), &IMPL.to_string().to_lowercase())).await;
        mount_row(&server, IMPL, row("VaultV2", &impl_abi, "")).await;

        let resolver = ContractResolver::from_sources(
            vec![Arc::new(source_for(&server)) as Arc<dyn ContractSource>],
            AbiFilter::WriteOnly,
            ProxyNaming::Proxy,
        );
        let record = resolver.resolve(137, PROXY).await.unwrap().unwrap();

        assert_eq!(record.contract_name, "VaultProxy");
        assert_eq!(record.implementation, Some(IMPL));
        assert_eq!(
            record.abi,
            vec![json!({"type": "function", "name": "deposit", "stateMutability": "nonpayable", "inputs": []})]
        );
    }

    #[tokio::test]
    async fn test_status_zero_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "0",
                "message": "NOTOK",
                "result": "Invalid API Key"
            })))
            .mount(&server)
            .await;

        let err = source_for(&server).source(137, PROXY).await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::Rejected {
                provider: "explorer",
                message: "NOTOK: Invalid API Key".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_empty_result_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "1",
                "message": "OK",
                "result": []
            })))
            .mount(&server)
            .await;

        assert_eq!(source_for(&server).source(80001, PROXY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unverified_abi_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "1",
                "message": "OK",
                "result": [{"ContractName": "", "ABI": "Contract source code not verified", "Implementation": ""}]
            })))
            .mount(&server)
            .await;

        let err = source_for(&server).source(137, PROXY).await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_unsupported_chain_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = source_for(&server).source(42161, PROXY).await.unwrap_err();
        assert!(err.is_unsupported_chain());
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let source = ExplorerSource::new(
            JsonClient::new(),
            Arc::new(ConfigSecrets::from_table(HashMap::new())),
        );
        let err = source.source(137, PROXY).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential { provider: "explorer", .. }));
    }
}
