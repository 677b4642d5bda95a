use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use prov_store::StoreError;
use prov_types::ValidationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Store(StoreError::Validation(_) | StoreError::Rejected(_))
            | Self::Validation(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Store(StoreError::Backend(_)) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            match status {
                StatusCode::GATEWAY_TIMEOUT => "store did not respond in time".to_string(),
                _ => "internal server error".to_string(),
            }
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
            self.to_string()
        };
        (status, Json(ErrorBody { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use prov_types::ProductId;

    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        let id = ProductId::parse("PRD-1").unwrap();
        let cases = [
            (ServerError::from(StoreError::NotFound(id.clone())), 404),
            (ServerError::from(StoreError::Conflict(id)), 409),
            (ServerError::from(ValidationError::MissingField("origin")), 400),
            (ServerError::from(StoreError::Rejected("bad".into())), 400),
            (ServerError::BadRequest("not json".into()), 400),
            (ServerError::from(StoreError::Timeout(Duration::from_secs(10))), 504),
            (ServerError::from(StoreError::Backend("disk".into())), 500),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status().as_u16(), expected, "{err}");
        }
    }
}
