use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use classdocs_core::IngestError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Internal server error")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl From<IngestError> for ApiError {
    fn from(error: IngestError) -> Self {
        tracing::error!(%error, "corpus rebuild failed");
        Self::Internal(error.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(error: std::io::Error) -> Self {
        Self::Internal(error.to_string())
    }
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
    status: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // Internal detail stays in the logs, not the response.
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.clone()),
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                status: "error".to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: ApiError) -> StatusCode {
        error.into_response().status()
    }

    #[test]
    fn errors_map_to_expected_status_codes() {
        assert_eq!(
            status_of(ApiError::Internal("db down".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ApiError::Validation("bad input".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ApiError::NotFound("missing".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ApiError::Unauthorized("no key".to_string())),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn internal_detail_is_not_echoed() {
        let error = ApiError::Internal("secret connection string".to_string());
        assert_eq!(error.to_string(), "Internal server error");
    }
}
