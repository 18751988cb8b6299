use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Incomplete order data: {0}")]
    IncompleteOrderData(anyhow::Error),

    #[error("Invoice already exists: {0}")]
    DuplicateInvoice(anyhow::Error),

    #[error("Malformed invoice number: {0}")]
    MalformedInvoiceNumber(String),

    #[error("Sequence allocation failed: {0}")]
    SequenceAllocation(anyhow::Error),

    #[error("Rendering failed: {0}")]
    Rendering(anyhow::Error),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Whether a failed operation may be retried with a fresh attempt.
    ///
    /// Sequence allocation and rendering failures are transient by contract:
    /// the counter increment is idempotent-safe to reissue (an abandoned
    /// sequence is an accepted gap) and rendering never touches the
    /// persisted invoice.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::SequenceAllocation(_) | AppError::Rendering(_) | AppError::DatabaseError(_)
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, error_message, details) = match self {
            AppError::OrderNotFound(order_ref) => (
                StatusCode::NOT_FOUND,
                format!("Order not found: {}", order_ref),
                None,
            ),
            AppError::IncompleteOrderData(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Incomplete order data".to_string(),
                Some(err.to_string()),
            ),
            AppError::DuplicateInvoice(err) => (StatusCode::CONFLICT, err.to_string(), None),
            AppError::MalformedInvoiceNumber(number) => (
                StatusCode::BAD_REQUEST,
                format!("Malformed invoice number: {}", number),
                None,
            ),
            AppError::SequenceAllocation(err) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Sequence allocation failed".to_string(),
                Some(err.to_string()),
            ),
            AppError::Rendering(err) => (
                StatusCode::BAD_GATEWAY,
                "Invoice rendering failed".to_string(),
                Some(err.to_string()),
            ),
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string(), None),
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string(), None),
            AppError::DatabaseError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                Some(err.to_string()),
            ),
            AppError::ConfigError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                Some(err.to_string()),
            ),
            AppError::InternalError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(err.to_string()),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response()
    }
}
