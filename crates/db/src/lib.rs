//! Database and cache layer.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the wallet ledger tables
//! - Database migrations
//! - The Postgres transactional wallet store
//! - Balance cache stores (local, Redis, layered)

pub mod cache;
pub mod entities;
pub mod migration;
pub mod store;

pub use cache::{LayeredBalanceCache, LocalBalanceCache, RedisBalanceCache};
pub use store::{PgWalletStoreTx, PgWalletStoreTxFactory};

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use walletd_shared::config::DatabaseConfig;

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(false);

    Database::connect(options).await
}
