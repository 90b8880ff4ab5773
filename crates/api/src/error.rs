//! Error to HTTP response mapping.
//!
//! Body shape: `{"error": "<CODE>", "message": "<text>"}`. Server-side
//! failures get an opaque message; the detail only goes to the log.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, error};
use walletd_core::LedgerError;
use walletd_shared::AppError;
use walletd_shared::types::IdError;

/// Error returned by handlers.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    code: &'static str,
}

impl ApiError {
    /// Returns the HTTP status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        let code = error.error_code();
        Self { error, code }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let code = err.error_code();
        let message = err.to_string();
        let error = match err {
            LedgerError::WalletNotFound(_) => AppError::NotFound(message),
            LedgerError::InvalidAmount => AppError::Validation(message),
            LedgerError::InsufficientFunds => AppError::BusinessRule(message),
            LedgerError::TxConflict
            | LedgerError::Timeout
            | LedgerError::Cancelled
            | LedgerError::Storage(_) => AppError::Internal(message),
        };
        Self { error, code }
    }
}

impl From<IdError> for ApiError {
    fn from(err: IdError) -> Self {
        Self {
            error: AppError::Validation(err.to_string()),
            code: "INVALID_WALLET_ID",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            error: AppError::Validation(rejection.body_text()),
            code: "INVALID_BODY",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self.error {
            AppError::Unauthorized(m)
            | AppError::NotFound(m)
            | AppError::Validation(m)
            | AppError::BusinessRule(m) => {
                debug!(code = self.code, error = %m, "request rejected");
                m.clone()
            }
            AppError::Internal(m) => {
                error!(code = self.code, error = %m, "request failed");
                "An internal error occurred".to_string()
            }
        };

        (
            self.status(),
            Json(json!({ "error": self.code, "message": message })),
        )
            .into_response()
    }
}
