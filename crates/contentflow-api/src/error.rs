//! API error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use contentflow_engine::EngineError;
use contentflow_store::StoreError;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Engine-level failure.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Record store failure from a passthrough route.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Engine(EngineError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::Engine(EngineError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Api { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = Json(json!({
            "error": { "message": self.to_string() }
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let err = ApiError::from(EngineError::NotFound("wf_x".to_string()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_input_maps_to_400() {
        let err = ApiError::from(EngineError::InvalidInput("topic is required".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_store_status_is_forwarded() {
        let err = ApiError::from(StoreError::Api {
            status: 403,
            message: "token expired".to_string(),
        });
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn network_errors_are_internal() {
        let err = ApiError::from(StoreError::Network("connection refused".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
