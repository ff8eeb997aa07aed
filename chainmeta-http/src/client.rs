//! Shared JSON-over-HTTP plumbing for every provider in this crate.
//!
//! [`JsonClient`] wraps a [`reqwest::Client`] with the request/response
//! handling all providers need: optional per-request timeout, extra headers,
//! status checking and JSON decoding. Failures come back as [`HttpError`]
//! tagged with a human-readable context, and are turned into a
//! [`ProviderError`] at the provider boundary with
//! [`HttpError::into_provider_error`].

use std::time::Duration;

use chainmeta::ProviderError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

/// Errors that can occur while talking to a provider over HTTP.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// URL parse error.
    #[error("invalid URL ({context}): {source}")]
    UrlParse {
        /// Which call failed.
        context: &'static str,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// The request never produced a response.
    #[error("request failed ({context}): {source}")]
    Http {
        /// Which call failed.
        context: &'static str,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The response body did not decode into the expected shape.
    #[error("unexpected response body ({context}): {source}")]
    JsonDeserialization {
        /// Which call failed.
        context: &'static str,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },
    /// Non-2xx status.
    #[error("HTTP {status} ({context}): {body}")]
    HttpStatus {
        /// Which call failed.
        context: &'static str,
        /// Status returned by the provider.
        status: StatusCode,
        /// Body returned with the status.
        body: String,
    },
    /// A non-2xx response whose body could not be read.
    #[error("unreadable error body ({context}): {source}")]
    ResponseBodyRead {
        /// Which call failed.
        context: &'static str,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },
}

impl HttpError {
    /// Attributes the failure to `provider`.
    ///
    /// Undecodable payloads become [`ProviderError::MalformedResponse`];
    /// everything else is [`ProviderError::Unavailable`].
    #[must_use]
    pub fn into_provider_error(self, provider: &'static str) -> ProviderError {
        if matches!(self, Self::JsonDeserialization { .. }) {
            ProviderError::malformed(provider, self)
        } else {
            ProviderError::unavailable(provider, self)
        }
    }

    /// Returns the HTTP status if the server answered with a non-2xx code.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A JSON HTTP client shared by all providers.
#[derive(Debug, Clone, Default)]
pub struct JsonClient {
    client: Client,
    timeout: Option<Duration>,
}

impl JsonClient {
    /// Creates a client with a fresh connection pool and no timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses an existing [`reqwest::Client`].
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Applies `timeout` to every request sent through this client.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Per-request timeout, if set.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Sends `payload` as a JSON `POST` body and decodes the JSON response.
    ///
    /// `context` identifies the call in errors and logs (e.g. `"POST ankr_getAccountBalance"`).
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] on transport failure, non-2xx status, or an
    /// undecodable body.
    pub async fn post_json<T, R>(
        &self,
        url: Url,
        context: &'static str,
        payload: &T,
        headers: &[(&str, &str)],
    ) -> Result<R, HttpError>
    where
        T: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let req = self.client.post(url).json(payload);
        self.send(req, context, headers).await
    }

    /// Sends a `GET` with the given query parameters and decodes the JSON
    /// response.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] on transport failure, non-2xx status, or an
    /// undecodable body.
    pub async fn get_json<R>(
        &self,
        url: Url,
        context: &'static str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<R, HttpError>
    where
        R: DeserializeOwned,
    {
        let mut req = self.client.get(url);
        if !query.is_empty() {
            req = req.query(query);
        }
        self.send(req, context, headers).await
    }

    async fn send<R>(
        &self,
        mut req: RequestBuilder,
        context: &'static str,
        headers: &[(&str, &str)],
    ) -> Result<R, HttpError>
    where
        R: DeserializeOwned,
    {
        req = req.header("accept", "application/json");
        for (key, value) in headers {
            req = req.header(*key, *value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|e| HttpError::Http { context, source: e })?;

        let status = http_response.status();
        if status.is_success() {
            http_response
                .json::<R>()
                .await
                .map_err(|e| HttpError::JsonDeserialization { context, source: e })
        } else {
            let body = http_response
                .text()
                .await
                .map_err(|e| HttpError::ResponseBodyRead { context, source: e })?;
            tracing::debug!(context, %status, "Provider answered with error status");
            Err(HttpError::HttpStatus {
                context,
                status,
                body,
            })
        }
    }
}

/// Parses a URL taken from configuration or a credential.
///
/// # Errors
///
/// Returns [`HttpError::UrlParse`] if `raw` is not a valid absolute URL.
pub fn parse_url(raw: &str, context: &'static str) -> Result<Url, HttpError> {
    Url::parse(raw.trim()).map_err(|source| HttpError::UrlParse { context, source })
}

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

impl<'a, P: Serialize> JsonRpcRequest<'a, P> {
    /// Creates a request with id `1`.
    pub const fn new(method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        }
    }
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse<T> {
    /// Successful result.
    pub result: Option<T>,
    /// Error object.
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcErrorObject {
    /// Error code.
    #[serde(default)]
    pub code: i64,
    /// Error message.
    #[serde(default)]
    pub message: String,
}

impl<T> JsonRpcResponse<T> {
    /// Unwraps the envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Rejected`] for an `error` member and
    /// [`ProviderError::MalformedResponse`] if neither member is present.
    pub fn into_result(self, provider: &'static str) -> Result<T, ProviderError> {
        if let Some(error) = self.error {
            return Err(ProviderError::Rejected {
                provider,
                message: format!("{} (code {})", error.message, error.code),
            });
        }
        self.result
            .ok_or_else(|| ProviderError::malformed(provider, "JSON-RPC response without result"))
    }
}
