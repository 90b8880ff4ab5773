//! Shared types, errors, and configuration for walletd.
//!
//! This crate provides common types used across all other crates:
//! - Money with fixed three-digit decimal precision
//! - Typed wallet identifiers
//! - Application-wide error types
//! - Configuration management
//! - JWT validation

pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use config::AppConfig;
pub use error::AppError;
pub use jwt::{Claims, JwtError, JwtService};
pub use types::{Money, WalletId};
