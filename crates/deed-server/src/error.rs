use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use deed_ledger::LedgerError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Request body could not be parsed or names an unknown action.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("store error: {0}")]
    Store(#[from] deed_store::StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Ledger(LedgerError::Validation { .. }) => StatusCode::BAD_REQUEST,
            Self::Ledger(LedgerError::StoreUnavailable(_)) | Self::Store(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients. Store and internal details stay in the logs.
    pub fn external_message(&self) -> String {
        match self {
            Self::InvalidInput(reason) => reason.clone(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Ledger(e @ LedgerError::Validation { .. }) => e.to_string(),
            Self::Ledger(LedgerError::StoreUnavailable(_)) | Self::Store(_) => {
                "ledger store unavailable".into()
            }
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => "internal server error".into(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, %status, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(json!({ "error": self.external_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_bad_request() {
        let e = ServerError::from(LedgerError::validation("owner_id", "must not be empty"));
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.external_message(), "invalid owner_id: must not be empty");
    }

    #[test]
    fn unavailable_hides_details() {
        let e = ServerError::from(LedgerError::StoreUnavailable("10.0.0.7:27017 refused".into()));
        assert_eq!(e.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!e.external_message().contains("10.0.0.7"));
    }

    #[test]
    fn property_not_found_message() {
        let e = ServerError::NotFound("Property");
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
        assert_eq!(e.external_message(), "Property not found");
    }
}
