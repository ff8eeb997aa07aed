//! Axum route handlers.
//!
//! Every lookup route takes `chainId` plus one address as query parameters.
//! Empty parameters count as missing.

use std::sync::Arc;

use alloy_primitives::Address;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use chainmeta::chain::parse_chain_id;
use chainmeta::contract::ContractResolver;
use chainmeta::{ChainError, ChainId};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::{AppState, SharedState};

/// Version reported by `/api/checkForUpdate`.
pub const UPDATE_VERSION: &str = "1.0.0";

const ABI_CACHE: &str = "s-maxage=86400, stale-while-revalidate=90000";
const ABI_MISSING_CACHE: &str = "s-maxage=86400";
const BALANCES_CACHE: &str = "max-age=2";
const TOKENMETA_CACHE: &str = "s-maxage=3600, stale-while-revalidate=5400";
const SHORT_CACHE: &str = "s-maxage=3600";

/// Query of the contract routes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractQuery {
    chain_id: Option<String>,
    contract_address: Option<String>,
}

/// Query of `/api/balances`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancesQuery {
    chain_id: Option<String>,
    wallet_address: Option<String>,
}

/// Query of `/api/tokenmeta`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetaQuery {
    chain_id: Option<String>,
    token_address: Option<String>,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_params(
    chain_id: Option<&String>,
    address: Option<&String>,
    missing: ApiError,
    address_name: &'static str,
) -> Result<(ChainId, Address), ApiError> {
    let (Some(chain_id), Some(address)) = (present(chain_id), present(address)) else {
        return Err(missing);
    };
    let chain_id = parse_chain_id(chain_id).ok_or(ApiError::InvalidParam("chainId"))?;
    let address = address
        .parse()
        .map_err(|_| ApiError::InvalidParam(address_name))?;
    Ok((chain_id, address))
}

async fn resolve_contract(
    resolver: &ContractResolver,
    query: &ContractQuery,
) -> Result<Response, ApiError> {
    let (chain_id, address) = parse_params(
        query.chain_id.as_ref(),
        query.contract_address.as_ref(),
        ApiError::MissingParams {
            params: "chainId or contractAddress",
            cache_control: ABI_MISSING_CACHE,
        },
        "contractAddress",
    )?;

    match resolver.resolve(chain_id, address).await {
        Ok(Some(record)) => Ok(([(CACHE_CONTROL, ABI_CACHE)], Json(record)).into_response()),
        Ok(None) | Err(ChainError::NotFound) => Err(ApiError::ContractNotFound),
        Err(error) => {
            tracing::error!(chain_id, %address, %error, "Contract resolution failed");
            Err(ApiError::Resolution(error))
        }
    }
}

/// `GET /api/abi` - Contract metadata with a write-only ABI.
///
/// # Errors
///
/// Returns 400 on bad parameters and 500 if every source failed.
pub async fn get_abi(
    State(state): State<SharedState>,
    Query(query): Query<ContractQuery>,
) -> Result<Response, ApiError> {
    resolve_contract(&state.abi, &query).await
}

/// `GET /api/abi3` - Contract metadata with the full ABI.
///
/// # Errors
///
/// Returns 400 on bad parameters and 500 if every source failed.
pub async fn get_abi_full(
    State(state): State<SharedState>,
    Query(query): Query<ContractQuery>,
) -> Result<Response, ApiError> {
    resolve_contract(&state.abi_full, &query).await
}

/// `GET /api/balances` - Positive ERC-20 balances of a wallet.
///
/// Provider failure is never surfaced; the wallet just looks empty.
///
/// # Errors
///
/// Returns 400 on bad parameters.
pub async fn get_balances(
    State(state): State<SharedState>,
    Query(query): Query<BalancesQuery>,
) -> Result<Response, ApiError> {
    let (chain_id, wallet) = parse_params(
        query.chain_id.as_ref(),
        query.wallet_address.as_ref(),
        ApiError::MissingParams {
            params: "chainId or walletAddress",
            cache_control: SHORT_CACHE,
        },
        "walletAddress",
    )?;
    let entries = state.balances.balances(chain_id, wallet).await;
    Ok((
        [
            ("cache-control", BALANCES_CACHE),
            ("cdn-cache-control", BALANCES_CACHE),
            ("vercel-cdn-cache-control", BALANCES_CACHE),
        ],
        Json(entries),
    )
        .into_response())
}

/// `GET /api/tokenmeta` - ERC-20 token metadata.
///
/// # Errors
///
/// Returns 400 on bad parameters and 500 if no tier resolved the token.
pub async fn get_token_meta(
    State(state): State<SharedState>,
    Query(query): Query<TokenMetaQuery>,
) -> Result<Response, ApiError> {
    let (chain_id, token) = parse_params(
        query.chain_id.as_ref(),
        query.token_address.as_ref(),
        ApiError::MissingParams {
            params: "chainId or tokenAddress",
            cache_control: SHORT_CACHE,
        },
        "tokenAddress",
    )?;
    match state.tokens.resolve(chain_id, token).await {
        Ok(record) => Ok(([(CACHE_CONTROL, TOKENMETA_CACHE)], Json(record)).into_response()),
        Err(error) => {
            tracing::error!(chain_id, %token, %error, "Token metadata resolution failed");
            Err(ApiError::Resolution(error))
        }
    }
}

/// `GET /api/checkForUpdate` - Latest client version, as a bare body.
pub async fn check_for_update() -> Response {
    ([(CONTENT_TYPE, "application/json")], UPDATE_VERSION).into_response()
}

/// `GET /health` - Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Creates an Axum [`axum::Router`] with all endpoints.
///
/// Endpoints:
/// - `GET /api/abi`
/// - `GET /api/abi3`
/// - `GET /api/balances`
/// - `GET /api/tokenmeta`
/// - `GET /api/checkForUpdate`
/// - `GET /health`
pub fn router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/api/abi", get(get_abi))
        .route("/api/abi3", get(get_abi_full))
        .route("/api/balances", get(get_balances))
        .route("/api/tokenmeta", get(get_token_meta))
        .route("/api/checkForUpdate", get(check_for_update))
        .route("/health", get(health))
        .with_state(Arc::new(state))
}
