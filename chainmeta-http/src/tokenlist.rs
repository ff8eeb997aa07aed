//! Remote token lists, downloaded lazily and cached for the process lifetime.
//!
//! Each chain has an ordered list of token-list URLs. A lookup scans them in
//! order; every list is fetched at most once per `(chain, index)` even under
//! concurrent lookups. Failed downloads are not cached and are retried by the
//! next lookup.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;
use chainmeta::chain::{POLYGON_MAINNET, POLYGON_MUMBAI};
use chainmeta::token::TokenList;
use chainmeta::types::TokenMetadataRecord;
use chainmeta::{BoxFuture, ChainId, Provider, ProviderError, ProviderResult};
use dashmap::DashMap;
use tokio::sync::OnceCell;
use url::Url;

use crate::client::{HttpError, JsonClient, parse_url};

const NAME: &str = "remote-list";

/// Token lists published by Polygon, per chain.
pub const DEFAULT_TOKEN_LISTS: &[(ChainId, &str)] = &[
    (
        POLYGON_MUMBAI,
        "https://api-polygon-tokens.polygon.technology/tokenlists/testnet.tokenlist.json",
    ),
    (
        POLYGON_MAINNET,
        "https://api-polygon-tokens.polygon.technology/tokenlists/polygonTokens.tokenlist.json",
    ),
];

type ListCell = Arc<OnceCell<Arc<TokenList>>>;

/// Token-metadata tier backed by remote token-list documents.
#[derive(Debug, Clone)]
pub struct RemoteTokenLists {
    client: JsonClient,
    sources: HashMap<ChainId, Vec<Url>>,
    cache: Arc<DashMap<(ChainId, usize), ListCell>>,
}

impl RemoteTokenLists {
    /// Creates the tier over explicit per-chain source URLs.
    #[must_use]
    pub fn new(client: JsonClient, sources: HashMap<ChainId, Vec<Url>>) -> Self {
        Self {
            client,
            sources,
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Creates the tier over [`DEFAULT_TOKEN_LISTS`].
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::UrlParse`] if a built-in URL fails to parse.
    pub fn with_defaults(client: JsonClient) -> Result<Self, HttpError> {
        let mut sources: HashMap<ChainId, Vec<Url>> = HashMap::new();
        for (chain_id, raw) in DEFAULT_TOKEN_LISTS {
            sources
                .entry(*chain_id)
                .or_default()
                .push(parse_url(raw, "default token list URL")?);
        }
        Ok(Self::new(client, sources))
    }

    /// Returns the number of lists currently held in memory.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.iter().filter(|cell| cell.value().initialized()).count()
    }

    async fn list(&self, chain_id: ChainId, index: usize, url: &Url) -> Result<Arc<TokenList>, HttpError> {
        let cell = {
            let entry = self
                .cache
                .entry((chain_id, index))
                .or_insert_with(|| Arc::new(OnceCell::new()));
            Arc::clone(entry.value())
        };
        let list = cell
            .get_or_try_init(|| async {
                tracing::debug!(chain_id, %url, "downloading token list");
                let list: TokenList = self
                    .client
                    .get_json(url.clone(), "GET token list", &[], &[])
                    .await?;
                Ok::<_, HttpError>(Arc::new(list))
            })
            .await?;
        Ok(Arc::clone(list))
    }

    async fn lookup(&self, chain_id: ChainId, token: Address) -> ProviderResult<TokenMetadataRecord> {
        let urls = self
            .sources
            .get(&chain_id)
            .filter(|urls| !urls.is_empty())
            .ok_or(ProviderError::UnsupportedChain {
                provider: NAME,
                chain_id,
            })?;

        let mut last_error = None;
        for (index, url) in urls.iter().enumerate() {
            match self.list(chain_id, index, url).await {
                Ok(list) => {
                    if let Some(info) = list.find(chain_id, token) {
                        return Ok(Some(info.to_record(token)));
                    }
                }
                Err(err) => {
                    tracing::warn!(chain_id, %url, error = %err, "token list unavailable");
                    last_error = Some(err.into_provider_error(NAME));
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ProviderError::NotListed {
            provider: NAME,
            address: token,
        }))
    }
}

impl Provider<Address, TokenMetadataRecord> for RemoteTokenLists {
    fn name(&self) -> &'static str {
        NAME
    }

    fn resolve<'a>(
        &'a self,
        chain_id: ChainId,
        token: &'a Address,
    ) -> BoxFuture<'a, ProviderResult<TokenMetadataRecord>> {
        Box::pin(self.lookup(chain_id, *token))
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use futures_util::future::join_all;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use chainmeta::token::{StaticTokenList, TokenMetadataChain, TokenMetadataResolver};

    use super::*;

    const WMATIC: Address = address!("0x9c3C9283D3e44854697Cd22D3Faa240Cfb032889");

    fn wmatic_list() -> Value {
        json!({
            "name": "Polygon Testnet",
            "tokens": [{
                "chainId": 80001,
                "address": "0x9c3c9283d3e44854697cd22d3faa240cfb032889",
                "name": "Wrapped Matic",
                "symbol": "WMATIC",
                "decimals": 18,
                "logoURI": "https://example.org/wmatic.png",
                "extensions": {"website": "https://polygon.technology"}
            }]
        })
    }

    fn tier(server: &MockServer, paths: &[&str]) -> RemoteTokenLists {
        let urls = paths
            .iter()
            .map(|p| Url::parse(&format!("{}{p}", server.uri())).unwrap())
            .collect();
        RemoteTokenLists::new(JsonClient::new(), HashMap::from([(POLYGON_MUMBAI, urls)]))
    }

    #[tokio::test]
    async fn test_second_list_answers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/first.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "empty", "tokens": []})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/second.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(wmatic_list()))
            .expect(1)
            .mount(&server)
            .await;

        let lists = tier(&server, &["/first.json", "/second.json"]);
        let record = lists.resolve(POLYGON_MUMBAI, &WMATIC).await.unwrap().unwrap();
        assert_eq!(record.symbol, "WMATIC");
        assert_eq!(record.decimals, 18);
        assert_eq!(record.address, WMATIC);
        assert_eq!(record.center_data.website.as_deref(), Some("https://polygon.technology"));

        // Served from cache.
        lists.resolve(POLYGON_MUMBAI, &WMATIC).await.unwrap().unwrap();
        assert_eq!(lists.cached(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_fetch_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(wmatic_list())
                    .set_delay(std::time::Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let lists = tier(&server, &["/list.json"]);
        let results = join_all((0..8).map(|_| lists.resolve(POLYGON_MUMBAI, &WMATIC))).await;
        assert!(results.iter().all(|r| matches!(r, Ok(Some(_)))));
    }

    #[tokio::test]
    async fn test_failed_download_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list.json"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/list.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(wmatic_list()))
            .expect(1)
            .mount(&server)
            .await;

        let lists = tier(&server, &["/list.json"]);
        let err = lists.resolve(POLYGON_MUMBAI, &WMATIC).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable { provider: "remote-list", .. }));
        assert_eq!(lists.cached(), 0);

        let record = lists.resolve(POLYGON_MUMBAI, &WMATIC).await.unwrap().unwrap();
        assert_eq!(record.name, "Wrapped Matic");
    }

    #[tokio::test]
    async fn test_unlisted_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(wmatic_list()))
            .mount(&server)
            .await;

        let other = address!("0x00000000000000000000000000000000000000bb");
        let err = tier(&server, &["/list.json"])
            .resolve(POLYGON_MUMBAI, &other)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProviderError::NotListed {
                provider: "remote-list",
                address: other,
            }
        );
    }

    #[tokio::test]
    async fn test_nonconforming_entry_is_skipped() {
        let server = MockServer::start().await;
        let mut list = wmatic_list();
        list["tokens"].as_array_mut().unwrap().insert(
            0,
            json!({"chainId": 80001, "address": "0x00000000000000000000000000000000000000aa", "name": "Nameless"}),
        );
        Mock::given(method("GET"))
            .and(path("/list.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(list))
            .expect(1)
            .mount(&server)
            .await;

        let lists = tier(&server, &["/list.json"]);
        for _ in 0..2 {
            let record = lists.resolve(POLYGON_MUMBAI, &WMATIC).await.unwrap().unwrap();
            assert_eq!(record.symbol, "WMATIC");
        }
        assert_eq!(lists.cached(), 1);
    }

    #[tokio::test]
    async fn test_bundled_token_skips_remote_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tokens": []})))
            .expect(0)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/polygon.json", server.uri())).unwrap();
        let remote = RemoteTokenLists::new(JsonClient::new(), HashMap::from([(POLYGON_MAINNET, vec![url])]));
        let resolver = TokenMetadataResolver::new(
            TokenMetadataChain::new()
                .with(Arc::new(StaticTokenList::bundled().unwrap()))
                .with(Arc::new(remote.clone())),
        );

        let usdc = address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174");
        let record = resolver.resolve(POLYGON_MAINNET, usdc).await.unwrap();
        assert_eq!(record.decimals, 6);
        assert_eq!(remote.cached(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_chain() {
        let lists = RemoteTokenLists::with_defaults(JsonClient::new()).unwrap();
        let err = lists.resolve(42161, &WMATIC).await.unwrap_err();
        assert!(err.is_unsupported_chain());
    }
}
