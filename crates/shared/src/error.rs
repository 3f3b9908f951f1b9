//! Application-wide error types.
//!
//! Ledger failures have their own taxonomy in `campuspay_core::wallet::WalletError`;
//! `AppError` covers authentication and configuration failures around it.

use thiserror::Error;

use crate::jwt::JwtError;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// No bearer token was presented.
    #[error("Authorization header with Bearer token is required")]
    MissingToken,

    /// The token was valid once but has expired.
    #[error("Token has expired")]
    TokenExpired,

    /// The token is malformed or badly signed.
    #[error("Invalid or malformed token")]
    InvalidToken(String),

    /// Handler reached without authenticated claims.
    #[error("Authentication required")]
    Unauthenticated,

    /// Access denied.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MissingToken | Self::TokenExpired | Self::InvalidToken(_) | Self::Unauthenticated => {
                401
            }
            Self::Forbidden(_) => 403,
            Self::Config(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::Unauthenticated => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Returns the message safe to show to API clients.
    ///
    /// Decoder and configuration details stay server-side.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Config(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => Self::TokenExpired,
            other => Self::InvalidToken(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
