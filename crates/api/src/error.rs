//! HTTP error responses.
//!
//! Every failure leaves the API as `{"error": "<CODE>", "message": "<text>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;

use campuspay_core::wallet::WalletError;
use campuspay_shared::AppError;

use crate::gateway::GatewayError;

/// Error returned by handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Builds an error from its parts.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 403 for routes reserved to admins.
    #[must_use]
    pub fn admin_only() -> Self {
        AppError::Forbidden("admin role required".to_string()).into()
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code of this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        // Internal details stay in the logs.
        let message = match &err {
            WalletError::Database(detail) => {
                error!(error = %detail, "database error");
                "A database error occurred".to_string()
            }
            WalletError::LedgerIntegrity(_) => "Ledger integrity check failed".to_string(),
            other => other.to_string(),
        };
        Self::new(status, err.error_code(), message)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if let AppError::Config(detail) = &err {
            error!(error = %detail, "configuration error");
        }
        Self::new(status, err.error_code(), err.public_message())
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        WalletError::from(err).into()
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        WalletError::Database(err.to_string()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "error": self.code, "message": self.message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_wallet_errors_keep_status_and_code() {
        let err = ApiError::from(WalletError::InsufficientFunds);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");

        let err = ApiError::from(WalletError::OrderNotFound(Uuid::new_v4()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_database_detail_is_hidden() {
        let err = ApiError::from(WalletError::Database("relation users does not exist".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("relation"));
    }

    #[test]
    fn test_auth_errors_keep_status_and_code() {
        let err = ApiError::from(AppError::TokenExpired);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "TOKEN_EXPIRED");

        let err = ApiError::admin_only();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[test]
    fn test_gateway_failure_is_bad_gateway() {
        let err = ApiError::from(GatewayError::Rejected("Invalid key".into()));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code(), "GATEWAY_ERROR");
    }
}
