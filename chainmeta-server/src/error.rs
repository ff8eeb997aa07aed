//! Error responses for the HTTP API.

use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::response::{IntoResponse, Response};
use chainmeta::ChainError;

/// Errors surfaced by the route handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// One or more required query parameters are missing or empty.
    #[error("Missing {params}")]
    MissingParams {
        /// Parameter names as shown to the client (`"chainId or tokenAddress"`).
        params: &'static str,
        /// `Cache-Control` value for the rejection.
        cache_control: &'static str,
    },

    /// A query parameter could not be parsed.
    #[error("Invalid {0}")]
    InvalidParam(&'static str),

    /// Every contract source confirmed or implied the contract is unknown.
    #[error("Contract not found")]
    ContractNotFound,

    /// The provider chain could not produce an answer.
    #[error(transparent)]
    Resolution(#[from] ChainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = axum::Json(serde_json::json!({ "error": self.to_string() }));
        match self {
            Self::MissingParams { cache_control, .. } => {
                (StatusCode::BAD_REQUEST, [(CACHE_CONTROL, cache_control)], body).into_response()
            }
            Self::InvalidParam(_) => (StatusCode::BAD_REQUEST, body).into_response(),
            Self::ContractNotFound => {
                (StatusCode::OK, [(CACHE_CONTROL, "s-maxage=3600")], body).into_response()
            }
            Self::Resolution(_) => (StatusCode::INTERNAL_SERVER_ERROR, body).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let missing = ApiError::MissingParams {
            params: "chainId or walletAddress",
            cache_control: "s-maxage=3600",
        };
        assert_eq!(missing.to_string(), "Missing chainId or walletAddress");
        let response = missing.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[CACHE_CONTROL], "s-maxage=3600");

        assert_eq!(ApiError::ContractNotFound.into_response().status(), StatusCode::OK);
        assert_eq!(
            ApiError::Resolution(ChainError::Empty).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::InvalidParam("chainId").to_string(), "Invalid chainId");
    }
}
