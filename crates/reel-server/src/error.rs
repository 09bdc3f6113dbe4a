//! Error types for the catalog API.
//!
//! [`ApiError`] unifies catalog failures and request-extraction failures
//! into one enum that converts into an Axum response with a
//! `{"error": ..., "status": ...}` body.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reel_catalog::CatalogError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The catalog rejected or failed the operation.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The request body, query string or path could not be decoded.
    #[error("invalid request: {0}")]
    BadRequest(String),
}

impl ApiError {
    /// The HTTP status this error is reported with.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Catalog(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Catalog(CatalogError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Catalog(
                CatalogError::Validation(_)
                | CatalogError::Reference(_)
                | CatalogError::Payload(_)
                | CatalogError::ImportFailed { .. },
            ) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
