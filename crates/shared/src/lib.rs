//! Shared types, errors, and configuration for CampusPay.
//!
//! This crate provides common types used across all other crates:
//! - Money types with decimal precision and gateway minor-unit conversion
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and token validation

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::{Claims, ROLE_ADMIN, ROLE_STUDENT};
pub use config::{AppConfig, EventsConfig, GatewayConfig};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
